//! Queue message types.
//!
//! The scheduler consumes a tagged union keyed on `action` from its
//! own queue and produces `run` / `validate` work items for the
//! worker queues. Schema validation is the deserialiser: a message
//! missing a required field fails to decode as a whole, which the
//! dispatcher logs and drops.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::result::{SolverResult, Verdict};

/// The named queues forming the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueName {
    /// Self-addressed control-plane messages.
    Scheduler,
    /// Work for regression/validation workers.
    Regression,
    /// Work for performance-measurement workers.
    Performance,
}

impl QueueName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduler => "scheduler",
            Self::Regression => "regression",
            Self::Performance => "performance",
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw message received from a queue.
///
/// `id` is assigned by the transport on receive and only used for
/// log correlation; acknowledgement is keyed on queue and body.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub id: String,
    pub queue: QueueName,
    pub body: String,
}

/// Control-plane messages consumed from the `scheduler` queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SchedulerAction {
    /// Expand a run into batched `schedule_instances` messages.
    Schedule { id: i64 },
    /// Emit per-instance work for one batch, or revalidate existing
    /// results.
    ScheduleInstances { run_id: i64, instance_ids: Vec<i64> },
    /// Ingest a worker's results and schedule their validation.
    ProcessResults {
        run_id: i64,
        results: Vec<WorkerResult>,
    },
    /// Forward a validation outcome to the control API.
    ProcessValidation {
        result_id: i64,
        solver_id: i64,
        validation: Verdict,
        stdout: String,
        #[serde(default)]
        node_name: Option<String>,
    },
}

impl SchedulerAction {
    /// The `action` tags this scheduler understands.
    pub const KNOWN_ACTIONS: [&'static str; 4] = [
        "schedule",
        "schedule_instances",
        "process_results",
        "process_validation",
    ];

    pub fn action_name(&self) -> &'static str {
        match self {
            Self::Schedule { .. } => "schedule",
            Self::ScheduleInstances { .. } => "schedule_instances",
            Self::ProcessResults { .. } => "process_results",
            Self::ProcessValidation { .. } => "process_validation",
        }
    }
}

/// One result element of a `process_results` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerResult {
    pub instance_id: i64,
    pub result: SolverResult,
    pub stdout: String,
    pub runtime: f64,
    #[serde(default)]
    pub node_name: Option<String>,
}

/// Work items produced for the `regression` and `performance`
/// queues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorkerCommand {
    /// Execute one solver on one instance. One message per instance;
    /// workers operate at instance granularity.
    Run {
        run_id: i64,
        solver_id: i64,
        instance_id: i64,
        arguments: Value,
    },
    /// Independently validate an existing result.
    Validate { result_id: i64, solver_id: i64 },
}
