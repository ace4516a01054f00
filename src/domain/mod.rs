//! Domain layer for the SMTLab scheduler.
//!
//! Contains the entity projections the scheduler manipulates by
//! reference, the queue message types, and the ports (interfaces)
//! through which the scheduler reaches the control API and the
//! message bus.

pub mod models;
pub mod ports;
