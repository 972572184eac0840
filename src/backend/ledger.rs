use serde::Serialize;

use crate::backend::http::JsonService;
use crate::backend::LedgerClient;
use crate::config::BackendConfig;
use crate::decimal::Money;
use crate::errors::{DirectDebitError, Result};
use crate::types::{ClientId, PaymentMethod, PendingCollection};

/// finance ledger reached over the finance api
pub struct FinanceLedgerClient {
    service: JsonService,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePaymentMethod {
    payment_method: PaymentMethod,
}

impl FinanceLedgerClient {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            service: JsonService::new("finance", &config.finance_url, config.timeout()),
        }
    }
}

fn ledger_error(message: String) -> DirectDebitError {
    DirectDebitError::Ledger { message }
}

impl LedgerClient for FinanceLedgerClient {
    fn pending_outstanding_balance(&self, client_id: ClientId) -> Result<Money> {
        let pence: i64 = self
            .service
            .get_json(&format!("/clients/{}/balance/pending", client_id))
            .map_err(ledger_error)?;
        Ok(Money::from_minor(pence))
    }

    fn pending_collections(&self, client_id: ClientId) -> Result<Vec<PendingCollection>> {
        self.service
            .get_json(&format!("/clients/{}/pending-collections", client_id))
            .map_err(ledger_error)
    }

    fn record_pending_collection(&self, client_id: ClientId, collection: &PendingCollection) -> Result<()> {
        self.service
            .send_json(
                "POST",
                &format!("/clients/{}/pending-collections", client_id),
                collection,
                201,
            )
            .map_err(ledger_error)
    }

    fn update_payment_method(&self, client_id: ClientId, method: PaymentMethod) -> Result<()> {
        self.service
            .send_json(
                "PUT",
                &format!("/clients/{}/payment-method", client_id),
                &UpdatePaymentMethod {
                    payment_method: method,
                },
                204,
            )
            .map_err(ledger_error)
    }

    fn cancel_pending_collection(&self, client_id: ClientId, collection: &PendingCollection) -> Result<()> {
        let pence = collection.amount.to_minor().ok_or_else(|| {
            ledger_error(format!("collection amount {} cannot be expressed in pence", collection.amount))
        })?;
        self.service
            .delete(
                &format!(
                    "/clients/{}/pending-collections/{}/{}",
                    client_id,
                    collection.collection_date.format("%Y-%m-%d"),
                    pence
                ),
                204,
            )
            .map_err(ledger_error)
    }
}
