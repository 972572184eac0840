/// quick start - mandate, schedule and cancel against in-memory collaborators
use std::sync::{Arc, Mutex};

use direct_debit_rs::calendar::{HolidayCache, StaticHolidaySource};
use direct_debit_rs::chrono::{Duration, NaiveDate, TimeZone, Utc};
use direct_debit_rs::provider::{
    CancelMandateRequest, CreateMandateRequest, CreateScheduleInput, RemoveScheduledPaymentRequest,
};
use direct_debit_rs::types::{CaseType, ClientStatus, FeePayer};
use direct_debit_rs::{
    BankDetails, Calendar, CaseRecordClient, ClientId, ClientSnapshot, CompensatingTask,
    LedgerClient, MandateOrchestrator, Money, PaymentMethod, PaymentProvider, PendingCollection,
    ProviderError, SafeTimeProvider, ScheduleConfig, TaskConfig, TimeSource,
};

/// provider that accepts everything and prints what it was asked to do
struct PrintingProvider;

impl PaymentProvider for PrintingProvider {
    fn modulus_check(&self, sort_code: &str, account_number: &str) -> Result<(), ProviderError> {
        println!("provider: modulus check {} {}", sort_code, account_number);
        Ok(())
    }

    fn create_mandate(&self, request: &CreateMandateRequest) -> Result<(), ProviderError> {
        println!("provider: create mandate for {}", request.client_reference);
        Ok(())
    }

    fn create_schedule(&self, input: &CreateScheduleInput) -> Result<(), ProviderError> {
        println!("provider: collect {} on {}", input.amount, input.date);
        Ok(())
    }

    fn cancel_mandate(&self, request: &CancelMandateRequest) -> Result<(), ProviderError> {
        println!("provider: close mandate from {}", request.closure_date);
        Ok(())
    }

    fn remove_scheduled_payment(&self, request: &RemoveScheduledPaymentRequest) -> Result<(), ProviderError> {
        println!("provider: remove {} collection on {}", request.amount, request.collection_date);
        Ok(())
    }
}

struct OneClient(ClientSnapshot);

impl CaseRecordClient for OneClient {
    fn get_client(&self, _client_id: ClientId) -> direct_debit_rs::Result<ClientSnapshot> {
        Ok(self.0.clone())
    }

    fn create_task(&self, task: &CompensatingTask) -> direct_debit_rs::Result<()> {
        println!("case record: task {} raised", task.task_type.code());
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryLedger {
    collections: Mutex<Vec<PendingCollection>>,
}

impl LedgerClient for InMemoryLedger {
    fn pending_outstanding_balance(&self, _client_id: ClientId) -> direct_debit_rs::Result<Money> {
        Ok(Money::from_major(250))
    }

    fn pending_collections(&self, _client_id: ClientId) -> direct_debit_rs::Result<Vec<PendingCollection>> {
        Ok(self.collections.lock().map(|c| c.clone()).unwrap_or_default())
    }

    fn record_pending_collection(
        &self,
        _client_id: ClientId,
        collection: &PendingCollection,
    ) -> direct_debit_rs::Result<()> {
        if let Ok(mut collections) = self.collections.lock() {
            collections.push(collection.clone());
        }
        Ok(())
    }

    fn update_payment_method(&self, _client_id: ClientId, method: PaymentMethod) -> direct_debit_rs::Result<()> {
        println!("ledger: payment method now {}", method.key());
        Ok(())
    }

    fn cancel_pending_collection(
        &self,
        _client_id: ClientId,
        collection: &PendingCollection,
    ) -> direct_debit_rs::Result<()> {
        if let Ok(mut collections) = self.collections.lock() {
            collections.retain(|c| c != collection);
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // monday 6 january 2025
    let start = Utc
        .with_ymd_and_hms(2025, 1, 6, 9, 0, 0)
        .single()
        .ok_or("invalid start time")?;
    let time = SafeTimeProvider::new(TimeSource::Test(start));

    let new_year = NaiveDate::from_ymd_opt(2025, 1, 1).ok_or("invalid date")?;
    let calendar = Calendar::new(
        Arc::new(HolidayCache::stale(Duration::hours(12))),
        Box::new(StaticHolidaySource::new(vec![new_year])),
    );

    let client = ClientSnapshot {
        id: 1,
        court_ref: "12345678".to_string(),
        surname: "Holmes".to_string(),
        fee_payer: Some(FeePayer {
            id: Some(2),
            status: "Active".to_string(),
        }),
        active_case_type: Some(CaseType {
            handle: "HW".to_string(),
            label: None,
        }),
        client_status: Some(ClientStatus {
            handle: "ACTIVE".to_string(),
            label: None,
        }),
        address_line1: "221b Baker Street".to_string(),
        town: "London".to_string(),
        post_code: "NW1 6XE".to_string(),
    };

    let mut orchestrator = MandateOrchestrator::new(
        calendar,
        Box::new(PrintingProvider),
        Box::new(OneClient(client)),
        Box::new(InMemoryLedger::default()),
        ScheduleConfig::default(),
        TaskConfig::default(),
    );

    let bank_details = BankDetails {
        account_name: "S Holmes".to_string(),
        sort_code: "30-33-30".to_string(),
        account_number: "12345678".to_string(),
    };

    let created = orchestrator.create_mandate(1, &bank_details, &time)?;
    println!("mandate: {:?}", created.state);

    let scheduled = orchestrator.create_schedule(1, &time)?;
    println!("schedule: {:?}", scheduled);

    // a second call finds the collection already pending
    let repeated = orchestrator.create_schedule(1, &time)?;
    println!("repeat schedule: {:?}", repeated);

    let cancelled = orchestrator.cancel_mandate(1, &time)?;
    println!(
        "cancelled: closes {} and withdrew {} collection(s)",
        cancelled.closure_date,
        cancelled.removed_collections.len()
    );

    for event in orchestrator.events.take_events() {
        println!("event: {:?}", event);
    }

    Ok(())
}
