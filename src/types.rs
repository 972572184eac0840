use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;

/// case-management identifier for a client
pub type ClientId = i32;

/// status a fee payer must hold for a mandate to be created
pub const ACTIVE_FEE_PAYER_STATUS: &str = "Active";

/// client status handle required for a mandate to be created
pub const ACTIVE_CLIENT_STATUS_HANDLE: &str = "ACTIVE";

/// how a client settles their invoices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "DEMANDED")]
    Demanded,
    #[serde(rename = "DIRECT DEBIT")]
    DirectDebit,
}

impl PaymentMethod {
    /// key used by the ledger
    pub fn key(&self) -> &'static str {
        match self {
            PaymentMethod::Demanded => "DEMANDED",
            PaymentMethod::DirectDebit => "DIRECT DEBIT",
        }
    }
}

/// bank details supplied by the caller when setting up a mandate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    #[serde(rename = "AccountName")]
    pub account_name: String,
    #[serde(rename = "SortCode")]
    pub sort_code: String,
    #[serde(rename = "AccountNumber")]
    pub account_number: String,
}

/// postal address sent to the payment provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "Line1")]
    pub line1: String,
    #[serde(rename = "Town")]
    pub town: String,
    #[serde(rename = "PostCode")]
    pub post_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePayer {
    pub id: Option<i32>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseType {
    pub handle: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientStatus {
    pub handle: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// client identity, address and eligibility attributes read from the case record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSnapshot {
    pub id: ClientId,
    #[serde(rename = "caseRecNumber")]
    pub court_ref: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub fee_payer: Option<FeePayer>,
    #[serde(default)]
    pub active_case_type: Option<CaseType>,
    #[serde(default)]
    pub client_status: Option<ClientStatus>,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub town: String,
    #[serde(rename = "postcode", default)]
    pub post_code: String,
}

impl ClientSnapshot {
    pub fn address(&self) -> Address {
        Address {
            line1: self.address_line1.clone(),
            town: self.town.clone(),
            post_code: self.post_code.clone(),
        }
    }

    /// reference and surname identifying the client to the payment provider
    pub fn provider_customer(&self) -> ProviderCustomer {
        ProviderCustomer {
            client_reference: self.court_ref.clone(),
            surname: self.surname.clone(),
        }
    }
}

/// customer identity as known by the payment provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCustomer {
    pub client_reference: String,
    pub surname: String,
}

/// internal record of an anticipated direct debit collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCollection {
    pub collection_date: NaiveDate,
    /// amount in pence
    #[serde(with = "pence")]
    pub amount: Money,
}

/// manual follow-up task codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskType {
    /// schedule created at the provider but not recorded internally
    #[serde(rename = "FDSC")]
    DirectDebitScheduleFailed,
    /// mandate cancelled at the provider but payment method not reverted
    #[serde(rename = "FDCM")]
    DirectDebitCancellationFailed,
}

impl TaskType {
    pub fn code(&self) -> &'static str {
        match self {
            TaskType::DirectDebitScheduleFailed => "FDSC",
            TaskType::DirectDebitCancellationFailed => "FDCM",
        }
    }
}

/// follow-up raised when provider state and internal state have diverged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompensatingTask {
    pub client_id: ClientId,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub due_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<i32>,
    pub notes: String,
}

/// serde helper for integer pence on the wire
pub(crate) mod pence {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::decimal::Money;

    pub fn serialize<S: Serializer>(amount: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        match amount.to_minor() {
            Some(pence) => serializer.serialize_i64(pence),
            None => Err(serde::ser::Error::custom("amount out of range")),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let pence = i64::deserialize(deserializer)?;
        Ok(Money::from_minor(pence))
    }
}
