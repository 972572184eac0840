use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use tracing::{error, info, info_span};
use uuid::Uuid;

use crate::errors::Result;
use crate::events::Event;
use crate::mandate::compensation::SCHEDULE_FAILED_NOTE;
use crate::mandate::{MandateOrchestrator, ScheduleOutcome};
use crate::provider::{CreateScheduleInput, ProviderError};
use crate::state::{MandateLifecycle, MandateState};
use crate::types::{ClientId, PendingCollection};

impl MandateOrchestrator {
    /// schedule a one-off collection of the client's pending balance
    ///
    /// Called after a mandate has been created, so the client is taken to hold one.
    /// A pending collection already recorded for the same date and amount makes the
    /// call a no-op.
    pub fn create_schedule(
        &mut self,
        client_id: ClientId,
        time_provider: &SafeTimeProvider,
    ) -> Result<ScheduleOutcome> {
        let mut lifecycle =
            MandateLifecycle::new(client_id, MandateState::MandateActive, time_provider.now());
        self.create_schedule_for(&mut lifecycle, time_provider)
    }

    pub fn create_schedule_for(
        &mut self,
        lifecycle: &mut MandateLifecycle,
        time_provider: &SafeTimeProvider,
    ) -> Result<ScheduleOutcome> {
        let operation_id = Uuid::new_v4();
        let client_id = lifecycle.client_id();
        let span = info_span!("create_schedule", %operation_id, client_id);
        let _enter = span.enter();

        lifecycle.require_mandate()?;

        let balance = self.ledger.pending_outstanding_balance(client_id).map_err(|err| {
            error!(step = "pending balance", error = %err, "unable to fetch pending outstanding balance");
            err
        })?;

        if !balance.is_positive() {
            info!(balance = %balance, "no pending balance, direct debit schedule not required");
            let now = time_provider.now();
            lifecycle.transition(MandateState::ScheduleSkipped, now, &mut self.events)?;
            self.events.emit(Event::ScheduleSkipped {
                operation_id,
                client_id,
                balance,
                timestamp: now,
            });
            return Ok(ScheduleOutcome::Skipped {
                operation_id,
                client_id,
                balance,
                state: lifecycle.state(),
            });
        }

        let collection_date = self.resolve_collection_date(time_provider)?;

        let pending = self.ledger.pending_collections(client_id).map_err(|err| {
            error!(step = "pending collections", error = %err, "unable to fetch pending collections");
            err
        })?;
        let already_pending = pending
            .iter()
            .any(|collection| collection.collection_date == collection_date && collection.amount == balance);
        if already_pending {
            info!(%collection_date, amount = %balance, "skipping direct debit schedule creation as a schedule already exists");
            self.events.emit(Event::ScheduleAlreadyPending {
                operation_id,
                client_id,
                collection_date,
                amount: balance,
                timestamp: time_provider.now(),
            });
            return Ok(ScheduleOutcome::AlreadyPending {
                operation_id,
                client_id,
                collection_date,
                amount: balance,
                state: lifecycle.state(),
            });
        }

        let client = self.case_record.get_client(client_id).map_err(|err| {
            error!(step = "fetch client", error = %err, "unable to fetch client");
            err
        })?;

        let input = CreateScheduleInput {
            customer: client.provider_customer(),
            date: collection_date,
            amount: balance,
            frequency: self.schedule.frequency.clone(),
            total_payments: self.schedule.total_payments,
        };

        if let Err(err) = self.provider.create_schedule(&input) {
            match &err {
                ProviderError::Validation { messages } => {
                    error!(step = "create schedule", errors = ?messages, "validation errors returned from payment provider");
                }
                ProviderError::Api | ProviderError::ModulusCheckFailed => {
                    error!(step = "create schedule", error = %err, "unable to create schedule");
                }
            }
            return Err(err.into());
        }

        let collection = PendingCollection {
            collection_date,
            amount: balance,
        };

        if let Err(err) = self.ledger.record_pending_collection(client_id, &collection) {
            error!(
                step = "record pending collection",
                error = %err,
                "failed to record pending collection after successful schedule instruction with payment provider"
            );
            let task_type = self.tasks.schedule_failed;
            self.raise_compensating_task(operation_id, client_id, task_type, SCHEDULE_FAILED_NOTE, time_provider);
            return Err(err);
        }

        let now = time_provider.now();
        lifecycle.transition(MandateState::ScheduleActive, now, &mut self.events)?;
        self.events.emit(Event::ScheduleCreated {
            operation_id,
            client_id,
            collection_date,
            amount: balance,
            timestamp: now,
        });
        info!(%collection_date, amount = %balance, "direct debit schedule created");

        Ok(ScheduleOutcome::Scheduled {
            operation_id,
            client_id,
            collection_date,
            amount: balance,
            state: lifecycle.state(),
        })
    }

    /// last working day of the month at least the lead time away from today
    pub fn resolve_collection_date(&mut self, time_provider: &SafeTimeProvider) -> Result<NaiveDate> {
        self.refresh_holidays(time_provider)?;

        let today = time_provider.now().date_naive();
        let earliest = self
            .calendar
            .add_working_days(today, self.schedule.lead_working_days, time_provider)?;
        self.calendar.last_working_day_of_month(earliest, time_provider)
    }
}
