use serde::{Deserialize, Serialize};

/// A solver registered with the control API.
///
/// The scheduler only cares about identity and whether the solver is
/// authoritative for cross-checking other solvers' results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverInfo {
    pub id: i64,
    #[serde(default)]
    pub validation_solver: bool,
}
