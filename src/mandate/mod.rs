pub mod cancel;
pub mod compensation;
pub mod create;
pub mod schedule;
pub mod validation;

use std::sync::Arc;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::backend::{CaseRecordClient, FinanceLedgerClient, LedgerClient, SiriusCaseRecordClient};
use crate::calendar::{Calendar, HolidayCache};
use crate::config::{EngineConfig, ScheduleConfig, TaskConfig};
use crate::decimal::Money;
use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::provider::{PaymentProvider, ProviderClient};
use crate::state::MandateState;
use crate::types::{ClientId, PaymentMethod, PendingCollection};

/// direct debit workflow across the case record, the payment provider and the ledger
///
/// Each operation runs its steps strictly in order and stops at the first failure.
/// Failures after the provider has already acted raise a compensating task instead of
/// rolling the provider back.
pub struct MandateOrchestrator {
    calendar: Calendar,
    provider: Box<dyn PaymentProvider + Send + Sync>,
    case_record: Box<dyn CaseRecordClient + Send + Sync>,
    ledger: Box<dyn LedgerClient + Send + Sync>,
    schedule: ScheduleConfig,
    tasks: TaskConfig,
    /// accumulates across calls; drain with `take_events` after each operation
    pub events: EventStore,
}

/// result of a successful create-mandate call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMandateOutcome {
    pub operation_id: Uuid,
    pub client_id: ClientId,
    pub client_reference: String,
    pub state: MandateState,
}

/// result of a successful create-schedule call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled {
        operation_id: Uuid,
        client_id: ClientId,
        collection_date: NaiveDate,
        amount: Money,
        state: MandateState,
    },
    /// a pending collection for the same date and amount already exists
    AlreadyPending {
        operation_id: Uuid,
        client_id: ClientId,
        collection_date: NaiveDate,
        amount: Money,
        state: MandateState,
    },
    /// nothing owed, nothing sent to the provider
    Skipped {
        operation_id: Uuid,
        client_id: ClientId,
        balance: Money,
        state: MandateState,
    },
}

impl ScheduleOutcome {
    pub fn state(&self) -> MandateState {
        match self {
            ScheduleOutcome::Scheduled { state, .. }
            | ScheduleOutcome::AlreadyPending { state, .. }
            | ScheduleOutcome::Skipped { state, .. } => *state,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ScheduleOutcome::Skipped { .. })
    }

    /// true when the provider was instructed during this call
    pub fn is_scheduled(&self) -> bool {
        matches!(self, ScheduleOutcome::Scheduled { .. })
    }
}

/// result of a successful cancel-mandate call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelMandateOutcome {
    pub operation_id: Uuid,
    pub client_id: ClientId,
    pub closure_date: NaiveDate,
    pub payment_method: PaymentMethod,
    /// collections after the closure date, withdrawn from the provider and the ledger
    pub removed_collections: Vec<PendingCollection>,
    pub state: MandateState,
}

impl MandateOrchestrator {
    pub fn new(
        calendar: Calendar,
        provider: Box<dyn PaymentProvider + Send + Sync>,
        case_record: Box<dyn CaseRecordClient + Send + Sync>,
        ledger: Box<dyn LedgerClient + Send + Sync>,
        schedule: ScheduleConfig,
        tasks: TaskConfig,
    ) -> Self {
        Self {
            calendar,
            provider,
            case_record,
            ledger,
            schedule,
            tasks,
            events: EventStore::new(),
        }
    }

    /// wire the http collaborators described by `config`
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::build(config, Calendar::from_config(&config.holidays))
    }

    /// as `from_config`, sharing a process-wide holiday cache
    pub fn from_config_with_cache(config: &EngineConfig, cache: Arc<HolidayCache>) -> Result<Self> {
        Self::build(config, Calendar::with_shared_cache(cache, &config.holidays))
    }

    fn build(config: &EngineConfig, calendar: Calendar) -> Result<Self> {
        config.schedule.validate()?;

        Ok(Self::new(
            calendar,
            Box::new(ProviderClient::new(&config.provider)),
            Box::new(SiriusCaseRecordClient::new(&config.backend)),
            Box::new(FinanceLedgerClient::new(&config.backend)),
            config.schedule.clone(),
            config.tasks.clone(),
        ))
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// load holidays up front when the cache is stale, recording the refresh
    fn refresh_holidays(&mut self, time_provider: &SafeTimeProvider) -> Result<()> {
        if let Some(holiday_count) = self.calendar.refresh_if_stale(time_provider)? {
            self.events.emit(Event::HolidaysRefreshed {
                holiday_count,
                timestamp: time_provider.now(),
            });
        }
        Ok(())
    }
}
