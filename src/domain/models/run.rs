use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A run as seen by the scheduler: one solver applied to every
/// instance of a benchmark.
///
/// `arguments` is an opaque pass-through: the control API owns its
/// shape and workers interpret it, so the scheduler carries it as raw
/// JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub id: i64,
    pub solver_id: i64,
    pub benchmark_id: i64,
    #[serde(default)]
    pub arguments: Value,
    /// Routes work to the `performance` queue when set, `regression`
    /// otherwise.
    #[serde(default)]
    pub performance: bool,
}

/// An instance descriptor. The scheduler only needs the identity;
/// unknown fields returned by the API are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub id: i64,
}
