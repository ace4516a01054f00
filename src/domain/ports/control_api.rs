use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::{InstanceInfo, NewResult, NewValidation, ResultInfo, RunInfo, SolverInfo};

/// Port for the control-plane REST API.
///
/// The scheduler reads runs, instances, results and solvers by id and
/// appends results and validation verdicts. Implementations decode
/// JSON bodies into the domain projections and never cache.
#[async_trait]
pub trait ControlApi: Send + Sync {
    /// `GET runs/{id}`
    async fn get_run(&self, run_id: i64) -> Result<RunInfo>;

    /// `GET benchmarks/{id}/instances`
    async fn get_benchmark_instances(&self, benchmark_id: i64) -> Result<Vec<InstanceInfo>>;

    /// `GET runs/{id}/results`
    async fn get_run_results(&self, run_id: i64) -> Result<Vec<ResultInfo>>;

    /// `POST runs/{id}/results`
    ///
    /// Returns the newly-persisted results with their assigned ids.
    /// The API deduplicates per `(run_id, instance_id)`, which is
    /// what makes re-processing the same message safe.
    async fn post_run_results(&self, run_id: i64, results: &[NewResult]) -> Result<Vec<ResultInfo>>;

    /// `GET results/{id}`
    async fn get_result(&self, result_id: i64) -> Result<ResultInfo>;

    /// `POST results/{id}/validation`
    async fn post_validation(&self, result_id: i64, validations: &[NewValidation]) -> Result<()>;

    /// `GET solvers`
    async fn get_solvers(&self) -> Result<Vec<SolverInfo>>;
}
