//! SMTLab scheduler, the scheduling core of a distributed SMT
//! solver benchmarking service.
//!
//! The scheduler sits between the control-plane API and the worker
//! pools: it expands runs into batched per-instance work, routes work
//! items to the `performance` or `regression` queue, ingests returned
//! results, and decides which results require independent
//! cross-validation by additional solvers.
//!
//! The crate is stateless between messages: all durable state lives
//! in the control API and the queues.

pub mod domain;
pub mod infrastructure;
pub mod services;
