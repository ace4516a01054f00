//! Shared test fixtures: an in-memory control API double and
//! helpers for driving the scheduler against the in-process queue.

// not every test binary uses every fixture
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use smtlab_scheduler::domain::models::{
    InstanceInfo, NewResult, NewValidation, QueueName, ResultInfo, RunInfo, SolverInfo,
    SolverResult,
};
use smtlab_scheduler::domain::ports::{ControlApi, MessageQueue};
use smtlab_scheduler::infrastructure::queue::MemoryQueue;

/// In-memory stand-in for the control API.
///
/// Seed runs, instances, results and solvers up front; the double
/// records posted results and validations and assigns result ids the
/// way the real API does.
#[derive(Default)]
pub struct FakeControlApi {
    runs: HashMap<i64, RunInfo>,
    instances: HashMap<i64, Vec<InstanceInfo>>,
    solvers: Vec<SolverInfo>,
    results: Mutex<HashMap<i64, ResultInfo>>,
    run_results: Mutex<HashMap<i64, Vec<i64>>>,
    next_result_id: AtomicI64,
    pub posted_result_batches: AtomicUsize,
    pub posted_validations: Mutex<Vec<(i64, Vec<NewValidation>)>>,
}

impl FakeControlApi {
    pub fn new() -> Self {
        Self {
            next_result_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    pub fn with_run(mut self, run: RunInfo) -> Self {
        self.runs.insert(run.id, run);
        self
    }

    pub fn with_instances(mut self, benchmark_id: i64, count: i64) -> Self {
        self.instances.insert(
            benchmark_id,
            (1..=count).map(|id| InstanceInfo { id }).collect(),
        );
        self
    }

    pub fn with_solvers(mut self, solvers: Vec<SolverInfo>) -> Self {
        self.solvers = solvers;
        self
    }

    /// Seed an existing result for `(run_id, instance_id)` and return
    /// its id.
    pub async fn seed_result(&self, run_id: i64, result: ResultInfo) -> i64 {
        let id = result.id;
        self.results.lock().await.insert(id, result);
        self.run_results
            .lock()
            .await
            .entry(run_id)
            .or_default()
            .push(id);
        id
    }
}

pub fn run_info(id: i64, benchmark_id: i64, performance: bool) -> RunInfo {
    RunInfo {
        id,
        solver_id: 2,
        benchmark_id,
        arguments: serde_json::json!(["-T:30"]),
        performance,
    }
}

pub fn sat_result(id: i64, instance_id: i64) -> ResultInfo {
    ResultInfo {
        id,
        instance_id,
        result: SolverResult::Sat,
        validations: vec![],
    }
}

pub fn validation_solver(id: i64) -> SolverInfo {
    SolverInfo {
        id,
        validation_solver: true,
    }
}

#[async_trait]
impl ControlApi for FakeControlApi {
    async fn get_run(&self, run_id: i64) -> Result<RunInfo> {
        self.runs
            .get(&run_id)
            .cloned()
            .ok_or_else(|| anyhow!("run {run_id} not found"))
    }

    async fn get_benchmark_instances(&self, benchmark_id: i64) -> Result<Vec<InstanceInfo>> {
        Ok(self.instances.get(&benchmark_id).cloned().unwrap_or_default())
    }

    async fn get_run_results(&self, run_id: i64) -> Result<Vec<ResultInfo>> {
        let results = self.results.lock().await;
        Ok(self
            .run_results
            .lock()
            .await
            .get(&run_id)
            .map(|ids| ids.iter().filter_map(|id| results.get(id).cloned()).collect())
            .unwrap_or_default())
    }

    async fn post_run_results(&self, run_id: i64, results: &[NewResult]) -> Result<Vec<ResultInfo>> {
        self.posted_result_batches.fetch_add(1, Ordering::SeqCst);
        let mut stored = Vec::with_capacity(results.len());
        for new in results {
            let id = self.next_result_id.fetch_add(1, Ordering::SeqCst);
            let info = ResultInfo {
                id,
                instance_id: new.instance_id,
                result: new.result.clone(),
                validations: vec![],
            };
            self.results.lock().await.insert(id, info.clone());
            self.run_results
                .lock()
                .await
                .entry(run_id)
                .or_default()
                .push(id);
            stored.push(info);
        }
        Ok(stored)
    }

    async fn get_result(&self, result_id: i64) -> Result<ResultInfo> {
        self.results
            .lock()
            .await
            .get(&result_id)
            .cloned()
            .ok_or_else(|| anyhow!("result {result_id} not found"))
    }

    async fn post_validation(&self, result_id: i64, validations: &[NewValidation]) -> Result<()> {
        self.posted_validations
            .lock()
            .await
            .push((result_id, validations.to_vec()));
        Ok(())
    }

    async fn get_solvers(&self) -> Result<Vec<SolverInfo>> {
        Ok(self.solvers.clone())
    }
}

/// Pop every pending message off a queue without dispatching it.
pub async fn drain(queue: &MemoryQueue, name: QueueName) -> Vec<serde_json::Value> {
    let mut bodies = Vec::new();
    loop {
        let messages = queue
            .poll(name, 64, Duration::from_millis(1))
            .await
            .expect("memory queue poll cannot fail");
        if messages.is_empty() {
            return bodies;
        }
        for message in messages {
            bodies.push(serde_json::from_str(&message.body).expect("queue bodies are JSON"));
        }
    }
}
