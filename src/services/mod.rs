//! Application services for the SMTLab scheduler.

pub mod dispatcher;
pub mod scheduler;
pub mod validation;
pub mod worker;

pub use dispatcher::Dispatcher;
pub use scheduler::{batch_size, SchedulerService};
pub use validation::{plan_validation, remaining_validators, SkipReason, ValidationPlan};
pub use worker::{backoff_delay, spawn_workers, WorkerConfig};
