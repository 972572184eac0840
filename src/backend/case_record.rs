use crate::backend::http::JsonService;
use crate::backend::CaseRecordClient;
use crate::config::BackendConfig;
use crate::errors::{DirectDebitError, Result};
use crate::types::{ClientId, ClientSnapshot, CompensatingTask};

/// case record store reached over the supervision api
pub struct SiriusCaseRecordClient {
    service: JsonService,
}

impl SiriusCaseRecordClient {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            service: JsonService::new("sirius", &config.sirius_url, config.timeout()),
        }
    }
}

fn case_record_error(message: String) -> DirectDebitError {
    DirectDebitError::CaseRecord { message }
}

impl CaseRecordClient for SiriusCaseRecordClient {
    fn get_client(&self, client_id: ClientId) -> Result<ClientSnapshot> {
        self.service
            .get_json(&format!("/supervision-api/v1/clients/{}", client_id))
            .map_err(case_record_error)
    }

    fn create_task(&self, task: &CompensatingTask) -> Result<()> {
        self.service
            .send_json("POST", "/supervision-api/v1/tasks", task, 201)
            .map_err(case_record_error)
    }
}
