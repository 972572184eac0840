use hourglass_rs::SafeTimeProvider;
use tracing::{error, info};
use uuid::Uuid;

use crate::events::Event;
use crate::mandate::MandateOrchestrator;
use crate::types::{ClientId, CompensatingTask, TaskType};

pub const SCHEDULE_FAILED_NOTE: &str = "The direct debit collection schedule for this client was created with the payment provider, but the pending collection could not be recorded";

pub const CANCELLATION_FAILED_NOTE: &str = "The direct debit mandate for this client was cancelled with the payment provider, but the payment method could not be updated";

pub const COLLECTION_REMOVAL_FAILED_NOTE: &str = "The direct debit mandate for this client was cancelled with the payment provider, but scheduled collections after the closure date could not be removed";

impl MandateOrchestrator {
    /// raise a manual follow-up after the provider and internal records diverge
    ///
    /// A failure to create the task is logged and recorded, never returned: the
    /// caller still reports the error that caused the divergence.
    pub(crate) fn raise_compensating_task(
        &mut self,
        operation_id: Uuid,
        client_id: ClientId,
        task_type: TaskType,
        notes: &str,
        time_provider: &SafeTimeProvider,
    ) {
        let now = time_provider.now();
        let task = CompensatingTask {
            client_id,
            task_type,
            due_date: now.date_naive(),
            assignee: self.tasks.assignee,
            notes: notes.to_string(),
        };

        match self.case_record.create_task(&task) {
            Ok(()) => {
                info!(client_id, task_type = task_type.code(), "raised compensating task");
                self.events.emit(Event::CompensatingTaskRaised {
                    operation_id,
                    client_id,
                    task_type,
                    timestamp: now,
                });
            }
            Err(err) => {
                error!(client_id, task_type = task_type.code(), error = %err, "failed to raise compensating task");
                self.events.emit(Event::CompensatingTaskFailed {
                    operation_id,
                    client_id,
                    task_type,
                    reason: err.to_string(),
                    timestamp: now,
                });
            }
        }
    }
}
