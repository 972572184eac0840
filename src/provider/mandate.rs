use chrono::NaiveDate;
use serde::Serialize;

use crate::provider::{ProviderClient, ProviderError};
use crate::types::{Address, BankDetails, ProviderCustomer};

/// everything the provider needs to set up a variable mandate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMandateRequest {
    pub client_reference: String,
    pub surname: String,
    pub address: Address,
    pub bank_details: BankDetails,
}

/// identifies the mandate to close and when collections stop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelMandateRequest {
    pub customer: ProviderCustomer,
    pub closure_date: NaiveDate,
}

#[derive(Serialize)]
struct MandateBody<'a> {
    #[serde(rename = "SchemeCode")]
    scheme_code: &'a str,
    #[serde(rename = "ClientReference")]
    client_reference: &'a str,
    #[serde(rename = "LastName")]
    surname: &'a str,
    #[serde(rename = "Address")]
    address: &'a Address,
    #[serde(rename = "BankAccount")]
    bank_account: BankAccount<'a>,
}

#[derive(Serialize)]
struct BankAccount<'a> {
    #[serde(rename = "BankDetails")]
    bank_details: &'a BankDetails,
}

impl ProviderClient {
    pub fn create_mandate(&self, request: &CreateMandateRequest) -> Result<(), ProviderError> {
        let body = MandateBody {
            scheme_code: self.scheme_code(),
            client_reference: &request.client_reference,
            surname: &request.surname,
            address: &request.address,
            bank_account: BankAccount {
                bank_details: &request.bank_details,
            },
        };

        let path = format!("/Customers/{}/VariableMandates/Create", self.scheme_code());
        self.send("create mandate", self.request("POST", &path), Some(&body))?;
        Ok(())
    }

    /// close a mandate so no collections are taken after the closure date
    pub fn cancel_mandate(&self, request: &CancelMandateRequest) -> Result<(), ProviderError> {
        let path = format!(
            "{}/Mandates/{}",
            self.customer_path(&request.customer),
            request.closure_date.format("%Y-%m-%d")
        );
        self.send::<()>("cancel mandate", self.request("DELETE", &path), None)?;
        Ok(())
    }
}
