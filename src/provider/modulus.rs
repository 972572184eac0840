use serde::Deserialize;
use tracing::error;

use crate::provider::{ProviderClient, ProviderError};

#[derive(Debug, Deserialize)]
struct ModulusCheckResponse {
    #[serde(rename = "Valid")]
    valid: bool,
    #[serde(rename = "DirectDebitCapable")]
    direct_debit_capable: bool,
}

impl ProviderClient {
    /// confirm a sort code and account number pair can be collected from
    ///
    /// A well-formed account the provider reports as invalid or not direct debit
    /// capable fails with `ModulusCheckFailed`, never the generic api error.
    pub fn modulus_check(&self, sort_code: &str, account_number: &str) -> Result<(), ProviderError> {
        let request = self
            .request("GET", "/BankAccounts")
            .query("sortcode", sort_code)
            .query("accountnumber", account_number);

        let response = self.send::<()>("modulus check", request, None)?;

        let check: ModulusCheckResponse = response.into_json().map_err(|err| {
            error!(error = %err, "unable to parse modulus check response");
            ProviderError::Api
        })?;

        if !check.valid || !check.direct_debit_capable {
            return Err(ProviderError::ModulusCheckFailed);
        }

        Ok(())
    }
}
