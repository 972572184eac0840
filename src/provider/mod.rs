pub mod client;
pub mod mandate;
pub mod modulus;
pub mod schedule;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::ProviderClient;
pub use mandate::{CancelMandateRequest, CreateMandateRequest};
pub use schedule::{CreateScheduleInput, RemoveScheduledPaymentRequest};

/// failures surfaced by the payment provider adapter
///
/// `Api` carries no provider status or body; those are only logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("unexpected response from payment provider")]
    Api,

    #[error("payment provider rejected the request: {}", .messages.join("; "))]
    Validation {
        messages: Vec<String>,
    },

    #[error("bank details failed the modulus check")]
    ModulusCheckFailed,
}

/// structured body of an unprocessable-entity response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPayload {
    #[serde(rename = "Messages", default)]
    pub messages: Vec<String>,
}

/// contract for the external payment collection service
pub trait PaymentProvider {
    /// confirm the account exists and accepts direct debits
    fn modulus_check(&self, sort_code: &str, account_number: &str) -> Result<(), ProviderError>;

    fn create_mandate(&self, request: &CreateMandateRequest) -> Result<(), ProviderError>;

    fn create_schedule(&self, input: &CreateScheduleInput) -> Result<(), ProviderError>;

    fn cancel_mandate(&self, request: &CancelMandateRequest) -> Result<(), ProviderError>;

    fn remove_scheduled_payment(&self, request: &RemoveScheduledPaymentRequest) -> Result<(), ProviderError>;
}

impl PaymentProvider for ProviderClient {
    fn modulus_check(&self, sort_code: &str, account_number: &str) -> Result<(), ProviderError> {
        ProviderClient::modulus_check(self, sort_code, account_number)
    }

    fn create_mandate(&self, request: &CreateMandateRequest) -> Result<(), ProviderError> {
        ProviderClient::create_mandate(self, request)
    }

    fn create_schedule(&self, input: &CreateScheduleInput) -> Result<(), ProviderError> {
        ProviderClient::create_schedule(self, input)
    }

    fn cancel_mandate(&self, request: &CancelMandateRequest) -> Result<(), ProviderError> {
        ProviderClient::cancel_mandate(self, request)
    }

    fn remove_scheduled_payment(&self, request: &RemoveScheduledPaymentRequest) -> Result<(), ProviderError> {
        ProviderClient::remove_scheduled_payment(self, request)
    }
}
