use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use tracing::{error, info};

use crate::config::ProviderConfig;
use crate::provider::{ProviderError, ValidationPayload};
use crate::types::ProviderCustomer;

/// path prefix of every provider endpoint
const API_PREFIX: &str = "/AllpayApi";

/// authenticated client for the payment provider
pub struct ProviderClient {
    agent: ureq::Agent,
    host: String,
    api_key: String,
    scheme_code: String,
}

impl ProviderClient {
    pub fn new(config: &ProviderConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout())
            .build();
        Self {
            agent,
            host: config.host.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            scheme_code: config.scheme_code.clone(),
        }
    }

    pub fn scheme_code(&self) -> &str {
        &self.scheme_code
    }

    /// build an authenticated request against the provider
    pub(crate) fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = format!("{}{}{}", self.host, API_PREFIX, path);
        info!(method, url = %url, "making payment provider request");
        self.agent
            .request(method, &url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Accept", "application/json")
    }

    /// path segment identifying a customer under this scheme
    pub(crate) fn customer_path(&self, customer: &ProviderCustomer) -> String {
        format!(
            "/Customers/{}/{}/{}",
            self.scheme_code,
            STANDARD.encode(customer.client_reference.as_bytes()),
            STANDARD.encode(customer.surname.as_bytes()),
        )
    }

    /// send a request and apply the uniform response policy
    ///
    /// 200 is success, 422 decodes provider validation messages, anything else
    /// (including transport failures) collapses to an opaque api error.
    pub(crate) fn send<T: Serialize>(
        &self,
        step: &'static str,
        request: ureq::Request,
        body: Option<&T>,
    ) -> Result<ureq::Response, ProviderError> {
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };

        match result {
            Ok(resp) if resp.status() == 200 => Ok(resp),
            Ok(resp) => {
                error!(step, status = resp.status(), "payment provider returned unexpected status code");
                Err(ProviderError::Api)
            }
            Err(ureq::Error::Status(422, resp)) => match resp.into_json::<ValidationPayload>() {
                Ok(payload) => {
                    error!(step, errors = ?payload.messages, "payment provider returned validation errors");
                    Err(ProviderError::Validation {
                        messages: payload.messages,
                    })
                }
                Err(err) => {
                    error!(step, error = %err, "unable to parse payment provider validation response");
                    Err(ProviderError::Api)
                }
            },
            Err(ureq::Error::Status(status, _)) => {
                error!(step, status, "payment provider returned unexpected status code");
                Err(ProviderError::Api)
            }
            Err(ureq::Error::Transport(transport)) => {
                error!(step, error = %transport, "unable to send payment provider request");
                Err(ProviderError::Api)
            }
        }
    }
}
