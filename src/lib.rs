pub mod backend;
pub mod calendar;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod mandate;
pub mod provider;
pub mod state;
pub mod types;

#[cfg(test)]
mod testing;

// re-export key types
pub use backend::{CaseRecordClient, FinanceLedgerClient, LedgerClient, SiriusCaseRecordClient};
pub use calendar::{BankHolidaySource, Calendar, HolidayCache, HolidaySource, StaticHolidaySource};
pub use config::{BackendConfig, EngineConfig, HolidayConfig, ProviderConfig, ScheduleConfig, TaskConfig};
pub use decimal::Money;
pub use errors::{DirectDebitError, Result, ValidationErrors};
pub use events::{Event, EventStore};
pub use mandate::{CancelMandateOutcome, CreateMandateOutcome, MandateOrchestrator, ScheduleOutcome};
pub use provider::{PaymentProvider, ProviderClient, ProviderError};
pub use state::{MandateLifecycle, MandateState};
pub use types::{
    Address, BankDetails, ClientId, ClientSnapshot, CompensatingTask, PaymentMethod,
    PendingCollection, ProviderCustomer, TaskType,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
