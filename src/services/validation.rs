//! Validation decision engine.
//!
//! Pure functions over a fetched result and solver list; no queue or
//! network, so the policy is unit-testable in isolation. The policy
//! is intentionally asymmetric: `sat` claims demand corroboration,
//! `unsat` claims are accepted on solver word, and a recorded
//! disagreement stops further validation so an operator can
//! adjudicate.

use std::collections::HashSet;

use crate::domain::models::{ResultInfo, SolverInfo, SolverResult, Verdict};

/// Classification of a result's existing validations.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ValidationTally {
    pub agreeing: usize,
    pub disagreeing: usize,
    pub inconclusive: usize,
    /// Solvers with a direct verdict on this result. Cross-references
    /// inferred from other runs' results do not consume the slot.
    pub already_used: HashSet<i64>,
}

/// What `schedule_validation` should do for a result.
#[derive(Debug, PartialEq, Eq)]
pub enum ValidationPlan {
    Skip(SkipReason),
    Corroborate { already_used: HashSet<i64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Non-definitive results carry nothing to corroborate.
    NotDefinitive,
    /// Unsat claims are self-certifying in this system.
    UnsatAccepted,
    /// A disagreement is already recorded; more validation adds no
    /// signal.
    Disagreement,
}

/// Tally a result's validations.
///
/// Entries with a `validation` verdict classify by its value; entries
/// with only a cross-referenced `result` classify by equality with
/// the result under test when definitive, else count as inconclusive.
pub fn tally_validations(result: &ResultInfo) -> ValidationTally {
    let mut tally = ValidationTally::default();

    for record in &result.validations {
        if let Some(verdict) = &record.validation {
            tally.already_used.insert(record.solver_id);
            match verdict {
                Verdict::Valid => tally.agreeing += 1,
                Verdict::Invalid => tally.disagreeing += 1,
                Verdict::Other(_) => tally.inconclusive += 1,
            }
        } else if let Some(cross) = &record.result {
            if cross.is_definitive() {
                if *cross == result.result {
                    tally.agreeing += 1;
                } else {
                    tally.disagreeing += 1;
                }
            } else {
                tally.inconclusive += 1;
            }
        } else {
            tally.inconclusive += 1;
        }
    }

    tally
}

/// Decide whether a result needs additional validation.
pub fn plan_validation(result: &ResultInfo) -> ValidationPlan {
    if !result.result.is_definitive() {
        return ValidationPlan::Skip(SkipReason::NotDefinitive);
    }

    let tally = tally_validations(result);

    if result.result == SolverResult::Unsat {
        return ValidationPlan::Skip(SkipReason::UnsatAccepted);
    }
    if tally.disagreeing > 0 {
        return ValidationPlan::Skip(SkipReason::Disagreement);
    }

    ValidationPlan::Corroborate {
        already_used: tally.already_used,
    }
}

/// Validation solvers that have not yet validated this result.
pub fn remaining_validators(solvers: &[SolverInfo], already_used: &HashSet<i64>) -> Vec<i64> {
    solvers
        .iter()
        .filter(|s| s.validation_solver)
        .map(|s| s.id)
        .filter(|id| !already_used.contains(id))
        .collect()
}
