//! Domain models for the SMTLab scheduler.

pub mod config;
pub mod message;
pub mod result;
pub mod run;
pub mod solver;

pub use config::{Config, HttpConfig, LoggingConfig, QueueConfig, QueueTransport};
pub use message::{QueueMessage, QueueName, SchedulerAction, WorkerCommand, WorkerResult};
pub use result::{NewResult, NewValidation, ResultInfo, SolverResult, ValidationRecord, Verdict};
pub use run::{InstanceInfo, RunInfo};
pub use solver::SolverInfo;
