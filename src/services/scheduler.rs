//! Scheduling handlers.
//!
//! The four message handlers plus the validation scheduler they
//! share. Handlers are stateless between messages: every decision is
//! made against state fetched from the control API at call time, and
//! all coordination happens through the queues.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::domain::models::{
    NewResult, NewValidation, QueueName, SchedulerAction, Verdict, WorkerCommand, WorkerResult,
};
use crate::domain::ports::{ControlApi, MessageQueue};

use super::validation::{plan_validation, remaining_validators, ValidationPlan};

/// Batch size for a run with `total` instances. Caps the per-run
/// message count while keeping latency low for small runs.
pub fn batch_size(total: usize) -> usize {
    match total {
        0..=10 => 1,
        11..=100 => 5,
        101..=1_000 => 10,
        1_001..=10_000 => 15,
        _ => 20,
    }
}

/// The scheduler's message handlers.
pub struct SchedulerService {
    api: Arc<dyn ControlApi>,
    queue: Arc<dyn MessageQueue>,
}

impl SchedulerService {
    pub fn new(api: Arc<dyn ControlApi>, queue: Arc<dyn MessageQueue>) -> Self {
        Self { api, queue }
    }

    /// `schedule`: expand a run into batched `schedule_instances`
    /// messages on the scheduler's own queue.
    ///
    /// The indirection is deliberate: it bounds per-handler work and
    /// lets the pool drain the batches in parallel.
    pub async fn schedule_run(&self, run_id: i64) -> Result<()> {
        info!(run_id, "scheduling run");
        let run = self
            .api
            .get_run(run_id)
            .await
            .with_context(|| format!("failed to fetch run {run_id}"))?;
        let instances = self
            .api
            .get_benchmark_instances(run.benchmark_id)
            .await
            .with_context(|| format!("failed to fetch instances of benchmark {}", run.benchmark_id))?;

        let batch = batch_size(instances.len());
        debug!(
            run_id,
            instances = instances.len(),
            batch,
            "expanding run into batches"
        );

        for chunk in instances.chunks(batch) {
            let message = SchedulerAction::ScheduleInstances {
                run_id,
                instance_ids: chunk.iter().map(|i| i.id).collect(),
            };
            self.queue
                .enqueue(QueueName::Scheduler, &serde_json::to_value(&message)?)
                .await
                .context("failed to enqueue schedule_instances batch")?;
        }
        Ok(())
    }

    /// `schedule_instances`: emit per-instance `run` work to the
    /// appropriate worker queue, or revalidate existing results.
    pub async fn schedule_instances(&self, run_id: i64, instance_ids: &[i64]) -> Result<()> {
        info!(run_id, count = instance_ids.len(), "scheduling instances");
        let run = self
            .api
            .get_run(run_id)
            .await
            .with_context(|| format!("failed to fetch run {run_id}"))?;
        let destination = if run.performance {
            QueueName::Performance
        } else {
            QueueName::Regression
        };

        let existing = self
            .api
            .get_run_results(run_id)
            .await
            .with_context(|| format!("failed to fetch results of run {run_id}"))?;
        let result_by_instance: HashMap<i64, i64> =
            existing.iter().map(|r| (r.instance_id, r.id)).collect();

        let (to_validate, to_run): (Vec<i64>, Vec<i64>) = instance_ids
            .iter()
            .copied()
            .partition(|id| result_by_instance.contains_key(id));

        // one message per instance; workers operate at instance granularity
        for instance_id in to_run {
            let command = WorkerCommand::Run {
                run_id,
                solver_id: run.solver_id,
                instance_id,
                arguments: run.arguments.clone(),
            };
            self.queue
                .enqueue(destination, &serde_json::to_value(&command)?)
                .await
                .with_context(|| format!("failed to enqueue run work onto '{destination}'"))?;
        }

        for instance_id in to_validate {
            if let Some(&result_id) = result_by_instance.get(&instance_id) {
                debug!(
                    run_id,
                    instance_id, result_id, "instance already has a result, checking validation"
                );
                self.schedule_validation(result_id).await?;
            }
        }
        Ok(())
    }

    /// `process_results`: post worker results to the API, then
    /// schedule validation of each persisted result.
    pub async fn process_results(&self, run_id: i64, results: &[WorkerResult]) -> Result<()> {
        info!(run_id, count = results.len(), "processing results");
        let body: Vec<NewResult> = results
            .iter()
            .map(|r| NewResult {
                instance_id: r.instance_id,
                result: r.result.clone(),
                stdout: r.stdout.clone(),
                runtime: r.runtime,
                node_name: r.node_name.clone().unwrap_or_default(),
            })
            .collect();

        let stored = self
            .api
            .post_run_results(run_id, &body)
            .await
            .with_context(|| format!("failed to post results of run {run_id}"))?;

        for result in &stored {
            self.schedule_validation(result.id).await?;
        }
        Ok(())
    }

    /// `process_validation`: forward one validation verdict to the
    /// control API.
    pub async fn process_validation(
        &self,
        result_id: i64,
        solver_id: i64,
        validation: Verdict,
        stdout: String,
        node_name: Option<String>,
    ) -> Result<()> {
        info!(result_id, solver_id, verdict = %validation, "recording validation");
        let entry = NewValidation {
            solver_id,
            validation,
            stdout,
            node_name: node_name.unwrap_or_default(),
        };
        self.api
            .post_validation(result_id, std::slice::from_ref(&entry))
            .await
            .with_context(|| format!("failed to post validation of result {result_id}"))
    }

    /// Decide which solvers must independently check a result and
    /// enqueue one `validate` work item per remaining candidate.
    pub async fn schedule_validation(&self, result_id: i64) -> Result<()> {
        let result = self
            .api
            .get_result(result_id)
            .await
            .with_context(|| format!("failed to fetch result {result_id}"))?;

        match plan_validation(&result) {
            ValidationPlan::Skip(reason) => {
                debug!(result_id, reason = ?reason, "not scheduling validation");
            }
            ValidationPlan::Corroborate { already_used } => {
                let solvers = self
                    .api
                    .get_solvers()
                    .await
                    .context("failed to fetch solvers")?;
                for solver_id in remaining_validators(&solvers, &already_used) {
                    debug!(result_id, solver_id, "scheduling validation");
                    let command = WorkerCommand::Validate { result_id, solver_id };
                    self.queue
                        .enqueue(QueueName::Regression, &serde_json::to_value(&command)?)
                        .await
                        .context("failed to enqueue validate work")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_follows_the_table() {
        assert_eq!(batch_size(0), 1);
        assert_eq!(batch_size(7), 1);
        assert_eq!(batch_size(10), 1);
        assert_eq!(batch_size(11), 5);
        assert_eq!(batch_size(100), 5);
        assert_eq!(batch_size(101), 10);
        assert_eq!(batch_size(250), 10);
        assert_eq!(batch_size(1_000), 10);
        assert_eq!(batch_size(1_001), 15);
        assert_eq!(batch_size(10_000), 15);
        assert_eq!(batch_size(10_001), 20);
        assert_eq!(batch_size(1_000_000), 20);
    }
}
