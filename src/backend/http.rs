use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

/// json-over-http access to an internal service
///
/// Failures are returned as plain messages; each client wraps them in its own
/// error variant.
pub(crate) struct JsonService {
    agent: ureq::Agent,
    base_url: String,
    name: &'static str,
}

impl JsonService {
    pub(crate) fn new(name: &'static str, base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            name,
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        self.agent
            .request(method, &format!("{}{}", self.base_url, path))
            .set("Accept", "application/json")
    }

    /// GET a json document, expecting 200
    pub(crate) fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, String> {
        let response = self.dispatch("GET", path, self.request("GET", path).call(), 200)?;
        response.into_json().map_err(|err| {
            error!(service = self.name, path, error = %err, "unable to parse response");
            format!("unable to parse {} response: {}", self.name, err)
        })
    }

    /// send a json body, expecting `expected` as the status
    pub(crate) fn send_json<B: Serialize>(
        &self,
        method: &str,
        path: &str,
        body: &B,
        expected: u16,
    ) -> Result<(), String> {
        let result = self.request(method, path).send_json(body);
        self.dispatch(method, path, result, expected).map(|_| ())
    }

    /// DELETE without a body, expecting `expected` as the status
    pub(crate) fn delete(&self, path: &str, expected: u16) -> Result<(), String> {
        let result = self.request("DELETE", path).call();
        self.dispatch("DELETE", path, result, expected).map(|_| ())
    }

    fn dispatch(
        &self,
        method: &str,
        path: &str,
        result: std::result::Result<ureq::Response, ureq::Error>,
        expected: u16,
    ) -> Result<ureq::Response, String> {
        let status = match result {
            Ok(resp) if resp.status() == expected => return Ok(resp),
            Ok(resp) => resp.status(),
            Err(ureq::Error::Status(status, _)) => status,
            Err(ureq::Error::Transport(transport)) => {
                error!(service = self.name, method, path, error = %transport, "unable to send request");
                return Err(format!("unable to reach {}: {}", self.name, transport));
            }
        };

        error!(service = self.name, method, path, status, "request returned unexpected status code");
        if status == 401 {
            Err(format!("unauthorised request to {}", self.name))
        } else {
            Err(format!("{} returned status {}", self.name, status))
        }
    }
}
