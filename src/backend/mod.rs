pub mod case_record;
pub mod http;
pub mod ledger;

use crate::decimal::Money;
use crate::errors::Result;
use crate::types::{ClientId, ClientSnapshot, CompensatingTask, PaymentMethod, PendingCollection};

pub use case_record::SiriusCaseRecordClient;
pub use ledger::FinanceLedgerClient;

/// case-management record store
pub trait CaseRecordClient {
    /// fresh eligibility snapshot for a client
    fn get_client(&self, client_id: ClientId) -> Result<ClientSnapshot>;

    /// raise a manual follow-up task
    fn create_task(&self, task: &CompensatingTask) -> Result<()>;
}

/// internal finance ledger
pub trait LedgerClient {
    /// balance owed including future-dated confirmed entries
    fn pending_outstanding_balance(&self, client_id: ClientId) -> Result<Money>;

    /// collections already anticipated for the client
    fn pending_collections(&self, client_id: ClientId) -> Result<Vec<PendingCollection>>;

    fn record_pending_collection(&self, client_id: ClientId, collection: &PendingCollection) -> Result<()>;

    fn update_payment_method(&self, client_id: ClientId, method: PaymentMethod) -> Result<()>;

    /// withdraw a collection that will no longer be taken
    fn cancel_pending_collection(&self, client_id: ClientId, collection: &PendingCollection) -> Result<()>;
}
