//! Domain ports (interfaces) for the SMTLab scheduler.

pub mod control_api;
pub mod message_queue;

pub use control_api::ControlApi;
pub use message_queue::MessageQueue;
