//! End-to-end scenarios for the scheduling handlers, run against the
//! in-process queue and the control API double.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{drain, run_info, sat_result, validation_solver, FakeControlApi};
use smtlab_scheduler::domain::models::{
    QueueName, ResultInfo, SolverResult, ValidationRecord, Verdict,
};
use smtlab_scheduler::domain::ports::{ControlApi, MessageQueue};
use smtlab_scheduler::infrastructure::queue::MemoryQueue;
use smtlab_scheduler::services::{Dispatcher, SchedulerService};

struct Harness {
    api: Arc<FakeControlApi>,
    queue: Arc<MemoryQueue>,
    service: SchedulerService,
    dispatcher: Dispatcher,
}

fn harness(api: FakeControlApi) -> Harness {
    let api = Arc::new(api);
    let queue = Arc::new(MemoryQueue::new());
    let service = SchedulerService::new(
        Arc::clone(&api) as Arc<dyn ControlApi>,
        Arc::clone(&queue) as Arc<dyn MessageQueue>,
    );
    let dispatcher = Dispatcher::new(SchedulerService::new(
        Arc::clone(&api) as Arc<dyn ControlApi>,
        Arc::clone(&queue) as Arc<dyn MessageQueue>,
    ));
    Harness {
        api,
        queue,
        service,
        dispatcher,
    }
}

impl Harness {
    /// Dispatch scheduler-queue messages until none remain, following
    /// the recursive self-enqueueing to completion.
    async fn pump(&self) {
        loop {
            let messages = self
                .queue
                .poll(QueueName::Scheduler, 16, Duration::from_millis(1))
                .await
                .expect("memory queue poll cannot fail");
            if messages.is_empty() {
                return;
            }
            for message in messages {
                self.dispatcher.dispatch(&message.body).await;
            }
        }
    }
}

// S1: 7 instances, performance=false, none pre-run: batch size 1
// gives 7 one-id schedule_instances messages, each emitting one run
// on regression.
#[tokio::test]
async fn small_run_fans_out_one_message_per_instance() {
    let h = harness(
        FakeControlApi::new()
            .with_run(run_info(1, 1, false))
            .with_instances(1, 7),
    );

    h.service.schedule_run(1).await.unwrap();

    let batches = drain(&h.queue, QueueName::Scheduler).await;
    assert_eq!(batches.len(), 7);
    for (index, batch) in batches.iter().enumerate() {
        assert_eq!(batch["action"], "schedule_instances");
        assert_eq!(batch["run_id"], 1);
        assert_eq!(batch["instance_ids"], serde_json::json!([index as i64 + 1]));
    }

    // drive each batch through the dispatcher
    for batch in &batches {
        h.queue
            .enqueue(QueueName::Scheduler, batch)
            .await
            .unwrap();
    }
    h.pump().await;

    let work = drain(&h.queue, QueueName::Regression).await;
    assert_eq!(work.len(), 7);
    for item in &work {
        assert_eq!(item["action"], "run");
        assert_eq!(item["solver_id"], 2);
        assert_eq!(item["arguments"], serde_json::json!(["-T:30"]));
    }
    assert_eq!(h.queue.len(QueueName::Performance).await, 0);
}

// S2: 250 instances partition into 25 batches of 10, order
// preserved, no overlap, no omission.
#[tokio::test]
async fn medium_run_batches_in_tens() {
    let h = harness(
        FakeControlApi::new()
            .with_run(run_info(2, 9, false))
            .with_instances(9, 250),
    );

    h.service.schedule_run(2).await.unwrap();

    let batches = drain(&h.queue, QueueName::Scheduler).await;
    assert_eq!(batches.len(), 25);

    let mut seen: Vec<i64> = Vec::new();
    for batch in &batches {
        let ids: Vec<i64> = serde_json::from_value(batch["instance_ids"].clone()).unwrap();
        assert_eq!(ids.len(), 10);
        seen.extend(ids);
    }
    assert_eq!(seen, (1..=250).collect::<Vec<i64>>());
}

// S3: one of three instances already has a result: two run messages
// plus validation of the existing result.
#[tokio::test]
async fn existing_results_are_validated_not_rerun() {
    let h = harness(
        FakeControlApi::new()
            .with_run(run_info(5, 3, false))
            .with_solvers(vec![validation_solver(7)]),
    );
    let result_id = h.api.seed_result(5, sat_result(100, 1)).await;

    h.service
        .schedule_instances(5, &[1, 2, 3])
        .await
        .unwrap();

    let work = drain(&h.queue, QueueName::Regression).await;
    let runs: Vec<_> = work.iter().filter(|m| m["action"] == "run").collect();
    let validates: Vec<_> = work.iter().filter(|m| m["action"] == "validate").collect();

    assert_eq!(runs.len(), 2);
    let rerun_ids: Vec<i64> = runs.iter().map(|m| m["instance_id"].as_i64().unwrap()).collect();
    assert_eq!(rerun_ids, vec![2, 3]);

    assert_eq!(validates.len(), 1);
    assert_eq!(validates[0]["result_id"], result_id);
    assert_eq!(validates[0]["solver_id"], 7);
}

// Performance runs route their work to the performance queue.
#[tokio::test]
async fn performance_runs_use_the_performance_queue() {
    let h = harness(FakeControlApi::new().with_run(run_info(6, 3, true)));

    h.service.schedule_instances(6, &[4, 5]).await.unwrap();

    assert_eq!(h.queue.len(QueueName::Performance).await, 2);
    assert_eq!(h.queue.len(QueueName::Regression).await, 0);
}

// S4: a recorded disagreement stops further validation.
#[tokio::test]
async fn disagreement_stops_validation() {
    let h = harness(
        FakeControlApi::new().with_solvers(vec![validation_solver(7), validation_solver(9)]),
    );
    let result = ResultInfo {
        id: 40,
        instance_id: 1,
        result: SolverResult::Sat,
        validations: vec![ValidationRecord {
            solver_id: 9,
            validation: Some(Verdict::Invalid),
            result: None,
        }],
    };
    let result_id = h.api.seed_result(1, result).await;

    h.service.schedule_validation(result_id).await.unwrap();

    assert_eq!(h.queue.len(QueueName::Regression).await, 0);
}

// S5: a fresh sat result gets one validate message per validation
// solver.
#[tokio::test]
async fn fresh_sat_result_is_validated_by_every_validation_solver() {
    let h = harness(FakeControlApi::new().with_solvers(vec![
        validation_solver(7),
        validation_solver(8),
        validation_solver(9),
    ]));
    let result_id = h.api.seed_result(1, sat_result(50, 4)).await;

    h.service.schedule_validation(result_id).await.unwrap();

    let work = drain(&h.queue, QueueName::Regression).await;
    assert_eq!(work.len(), 3);
    let mut solver_ids: Vec<i64> = work
        .iter()
        .map(|m| {
            assert_eq!(m["action"], "validate");
            assert_eq!(m["result_id"], 50);
            m["solver_id"].as_i64().unwrap()
        })
        .collect();
    solver_ids.sort_unstable();
    assert_eq!(solver_ids, vec![7, 8, 9]);
}

// Unsat results are accepted on solver word.
#[tokio::test]
async fn unsat_results_are_never_validated() {
    let h = harness(FakeControlApi::new().with_solvers(vec![validation_solver(7)]));
    let result = ResultInfo {
        id: 60,
        instance_id: 2,
        result: SolverResult::Unsat,
        validations: vec![],
    };
    let result_id = h.api.seed_result(1, result).await;

    h.service.schedule_validation(result_id).await.unwrap();

    assert_eq!(h.queue.len(QueueName::Regression).await, 0);
}

// Solvers that already validated the result directly are not asked
// again; inferred cross-references do not use up the slot.
#[tokio::test]
async fn already_used_solvers_are_skipped() {
    let h = harness(FakeControlApi::new().with_solvers(vec![
        validation_solver(7),
        validation_solver(8),
    ]));
    let result = ResultInfo {
        id: 70,
        instance_id: 3,
        result: SolverResult::Sat,
        validations: vec![
            ValidationRecord {
                solver_id: 7,
                validation: Some(Verdict::Valid),
                result: None,
            },
            ValidationRecord {
                solver_id: 8,
                validation: None,
                result: Some(SolverResult::Sat),
            },
        ],
    };
    let result_id = h.api.seed_result(1, result).await;

    h.service.schedule_validation(result_id).await.unwrap();

    let work = drain(&h.queue, QueueName::Regression).await;
    assert_eq!(work.len(), 1);
    assert_eq!(work[0]["solver_id"], 8);
}

// S6: one POST per process_results message, one validation pass per
// stored result.
#[tokio::test]
async fn process_results_posts_once_and_validates_each_result() {
    let h = harness(FakeControlApi::new().with_solvers(vec![validation_solver(7)]));

    let message = serde_json::json!({
        "action": "process_results",
        "run_id": 3,
        "results": [
            {"instance_id": 4, "result": "sat", "stdout": "", "runtime": 0.1}
        ]
    });
    h.queue.enqueue(QueueName::Scheduler, &message).await.unwrap();
    h.pump().await;

    assert_eq!(h.api.posted_result_batches.load(Ordering::SeqCst), 1);

    let work = drain(&h.queue, QueueName::Regression).await;
    assert_eq!(work.len(), 1);
    assert_eq!(work[0]["action"], "validate");
    assert_eq!(work[0]["solver_id"], 7);
}

// Ingested unsat results produce no validation work.
#[tokio::test]
async fn ingested_unsat_results_skip_validation() {
    let h = harness(FakeControlApi::new().with_solvers(vec![validation_solver(7)]));

    let message = serde_json::json!({
        "action": "process_results",
        "run_id": 3,
        "results": [
            {"instance_id": 5, "result": "unsat", "stdout": "", "runtime": 0.2, "node_name": "w1"}
        ]
    });
    h.queue.enqueue(QueueName::Scheduler, &message).await.unwrap();
    h.pump().await;

    assert_eq!(h.api.posted_result_batches.load(Ordering::SeqCst), 1);
    assert_eq!(h.queue.len(QueueName::Regression).await, 0);
}

// process_validation forwards a single-element array to the API with
// node_name defaulted.
#[tokio::test]
async fn process_validation_forwards_to_the_api() {
    let h = harness(FakeControlApi::new());
    let result_id = h.api.seed_result(1, sat_result(80, 6)).await;

    let message = serde_json::json!({
        "action": "process_validation",
        "result_id": result_id,
        "solver_id": 9,
        "validation": "valid",
        "stdout": "model checked"
    });
    h.queue.enqueue(QueueName::Scheduler, &message).await.unwrap();
    h.pump().await;

    let posted = h.api.posted_validations.lock().await;
    assert_eq!(posted.len(), 1);
    let (posted_result_id, entries) = &posted[0];
    assert_eq!(*posted_result_id, result_id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].solver_id, 9);
    assert_eq!(entries[0].validation, Verdict::Valid);
    assert_eq!(entries[0].node_name, "");
}

// The full recursive flow: schedule -> schedule_instances -> run
// work, driven entirely through the dispatcher.
#[tokio::test]
async fn schedule_message_drives_the_full_fan_out() {
    let h = harness(
        FakeControlApi::new()
            .with_run(run_info(1, 1, false))
            .with_instances(1, 23),
    );

    h.queue
        .enqueue(
            QueueName::Scheduler,
            &serde_json::json!({"action": "schedule", "id": 1}),
        )
        .await
        .unwrap();
    h.pump().await;

    let work = drain(&h.queue, QueueName::Regression).await;
    assert_eq!(work.len(), 23);
    let mut ids: Vec<i64> = work.iter().map(|m| m["instance_id"].as_i64().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=23).collect::<Vec<i64>>());
}
