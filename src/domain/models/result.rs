//! Result and validation projections.
//!
//! The control API owns the full result records; the scheduler reads
//! them to decide routing and validation, and appends new results and
//! validation verdicts. Outcome strings form an open set (`sat`,
//! `unsat`, `unknown`, `timeout`, ...), so both [`SolverResult`] and
//! [`Verdict`] round-trip unrecognised values verbatim.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The outcome of one solver invocation on one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SolverResult {
    Sat,
    Unsat,
    /// Any non-definitive outcome: `unknown`, `timeout`, `error`, ...
    Other(String),
}

impl SolverResult {
    /// Only `sat` and `unsat` claims are subject to validation.
    pub fn is_definitive(&self) -> bool {
        matches!(self, Self::Sat | Self::Unsat)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Sat => "sat",
            Self::Unsat => "unsat",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for SolverResult {
    fn from(s: String) -> Self {
        match s.as_str() {
            "sat" => Self::Sat,
            "unsat" => Self::Unsat,
            _ => Self::Other(s),
        }
    }
}

impl From<SolverResult> for String {
    fn from(r: SolverResult) -> Self {
        match r {
            SolverResult::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for SolverResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validating solver's verdict on a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    Valid,
    Invalid,
    /// Any other verdict counts as inconclusive.
    Other(String),
}

impl Verdict {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Verdict {
    fn from(s: String) -> Self {
        match s.as_str() {
            "valid" => Self::Valid,
            "invalid" => Self::Invalid,
            _ => Self::Other(s),
        }
    }
}

impl From<Verdict> for String {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a result's `validations` array.
///
/// Two shapes occur: a direct verdict (`{solver_id, validation}`)
/// recorded by a validation worker, and an inferred cross-reference
/// (`{solver_id, result}`) derived from another run's result on the
/// same instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub solver_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Verdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<SolverResult>,
}

/// A persisted result as returned by the control API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultInfo {
    pub id: i64,
    pub instance_id: i64,
    pub result: SolverResult,
    #[serde(default)]
    pub validations: Vec<ValidationRecord>,
}

impl ResultInfo {
    /// Solver ids with a direct verdict on this result. Inferred
    /// cross-references do not consume the solver slot.
    pub fn directly_validated_by(&self) -> HashSet<i64> {
        self.validations
            .iter()
            .filter(|v| v.validation.is_some())
            .map(|v| v.solver_id)
            .collect()
    }
}

/// Body element for `POST runs/{id}/results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResult {
    pub instance_id: i64,
    pub result: SolverResult,
    pub stdout: String,
    pub runtime: f64,
    pub node_name: String,
}

/// Body element for `POST results/{id}/validation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewValidation {
    pub solver_id: i64,
    pub validation: Verdict,
    pub stdout: String,
    pub node_name: String,
}
