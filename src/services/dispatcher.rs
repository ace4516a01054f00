//! Action dispatcher.
//!
//! Decodes one raw scheduler-queue message, validates it against the
//! action schemas, and invokes the matching handler. Dispatch never
//! fails from the caller's point of view: malformed input and handler
//! errors are logged and swallowed so a poison message cannot stall
//! the queue, and the poll loop acks unconditionally afterwards.

use anyhow::Result;
use serde_json::Value;
use tracing::error;

use crate::domain::models::SchedulerAction;

use super::scheduler::SchedulerService;

pub struct Dispatcher {
    scheduler: SchedulerService,
}

impl Dispatcher {
    pub fn new(scheduler: SchedulerService) -> Self {
        Self { scheduler }
    }

    /// Decode and dispatch one raw message.
    pub async fn dispatch(&self, raw: &str) {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                error!(error = %err, body = raw, "received malformed message");
                return;
            }
        };

        let Some(action) = value.get("action").and_then(Value::as_str) else {
            error!(body = raw, "received message with no 'action'");
            return;
        };
        if !SchedulerAction::KNOWN_ACTIONS.contains(&action) {
            error!(action, "received message with unknown action");
            return;
        }
        let action = action.to_string();

        let message: SchedulerAction = match serde_json::from_value(value) {
            Ok(message) => message,
            Err(err) => {
                error!(action = %action, error = %err, "received message with invalid fields");
                return;
            }
        };

        if let Err(err) = self.handle(message).await {
            error!(action = %action, error = ?err, "exception thrown in handler");
        }
    }

    async fn handle(&self, message: SchedulerAction) -> Result<()> {
        match message {
            SchedulerAction::Schedule { id } => self.scheduler.schedule_run(id).await,
            SchedulerAction::ScheduleInstances {
                run_id,
                instance_ids,
            } => {
                self.scheduler
                    .schedule_instances(run_id, &instance_ids)
                    .await
            }
            SchedulerAction::ProcessResults { run_id, results } => {
                self.scheduler.process_results(run_id, &results).await
            }
            SchedulerAction::ProcessValidation {
                result_id,
                solver_id,
                validation,
                stdout,
                node_name,
            } => {
                self.scheduler
                    .process_validation(result_id, solver_id, validation, stdout, node_name)
                    .await
            }
        }
    }
}
