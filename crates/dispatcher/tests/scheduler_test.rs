mod common;

use std::time::Duration;

use common::{Fixture, MASTER_ID, WORKER_A};
use orchestrator_core::models::{Task, TaskStatus};
use orchestrator_core::traits::TaskControlMessage;
use orchestrator_core::OrchestratorError;
use orchestrator_dispatcher::{CancelOutcome, TaskScheduler};
use orchestrator_testing_utils::TaskBuilder;

const USER: i64 = 42;

#[tokio::test]
async fn test_enqueue_creates_task_queue_item_and_stat() {
    let fx = Fixture::new();

    let task = fx
        .scheduler
        .enqueue(Task::new(7).with_priority(5).with_node(WORKER_A), USER)
        .await
        .unwrap();

    assert!(task.id > 0);
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.audit.created_by, USER);
    assert_eq!(task.audit.updated_by, USER);

    let stored = fx.tasks.get(task.id).unwrap();
    assert_eq!(stored.status, TaskStatus::Pending);

    let item = fx.queue.get(task.id).unwrap();
    assert_eq!(item.priority, 5);
    assert_eq!(item.node_id, Some(WORKER_A));

    let stat = fx.stats.get(task.id).unwrap();
    assert_eq!(stat.result_count, 0);
}

#[tokio::test]
async fn test_enqueue_overrides_incoming_status() {
    let fx = Fixture::new();

    let task = fx
        .scheduler
        .enqueue(Task::new(1).with_status(TaskStatus::Running), USER)
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
}

#[tokio::test]
async fn test_enqueue_task_insert_failure_propagates() {
    let fx = Fixture::new();
    fx.tasks.fail_create.set(true);

    let err = fx.scheduler.enqueue(Task::new(1), USER).await.unwrap_err();
    assert!(err.is_persistence_failure());
    assert_eq!(fx.tasks.count(), 0);
    assert!(fx.queue.is_empty());
    assert!(fx.stats.is_empty());
}

#[tokio::test]
async fn test_enqueue_rolls_back_task_when_queue_insert_fails() {
    let fx = Fixture::new();
    fx.queue.fail_create.set(true);

    let err = fx.scheduler.enqueue(Task::new(1), USER).await.unwrap_err();
    assert!(err.is_persistence_failure());
    assert_eq!(fx.tasks.count(), 0);
    assert!(fx.stats.is_empty());
}

#[tokio::test]
async fn test_enqueue_rolls_back_task_and_queue_item_when_stat_insert_fails() {
    let fx = Fixture::new();
    fx.stats.fail_create.set(true);

    let err = fx.scheduler.enqueue(Task::new(1), USER).await.unwrap_err();
    assert!(err.is_persistence_failure());
    assert_eq!(fx.tasks.count(), 0);
    assert!(fx.queue.is_empty());
}

#[tokio::test]
async fn test_cancel_pending_task_only_removes_queue_item() {
    let fx = Fixture::new();
    let task = fx
        .scheduler
        .enqueue(Task::new(7).with_priority(5).with_node(WORKER_A), USER)
        .await
        .unwrap();

    let outcome = fx.scheduler.cancel(task.id, USER, false).await.unwrap();

    assert_eq!(outcome, CancelOutcome::Dequeued);
    assert!(fx.queue.get(task.id).is_none());
    // 等待中的任务取消后状态保持 pending
    assert_eq!(fx.tasks.get(task.id).unwrap().status, TaskStatus::Pending);
    assert!(fx.local.cancel_calls().is_empty());
    assert_eq!(fx.streams.lookup_calls.get(), 0);
}

#[tokio::test]
async fn test_cancel_pending_task_without_queue_item() {
    let fx = Fixture::new();
    fx.tasks.put(TaskBuilder::new().with_id(3).build());

    let outcome = fx.scheduler.cancel(3, USER, false).await.unwrap();
    assert_eq!(outcome, CancelOutcome::Dequeued);
}

#[tokio::test]
async fn test_cancel_unknown_task_is_not_found() {
    let fx = Fixture::new();

    let err = fx.scheduler.cancel(404, USER, false).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_cancel_running_task_on_master() {
    let fx = Fixture::new();
    fx.tasks
        .put(TaskBuilder::new().with_id(10).running().with_node(MASTER_ID).build());

    let outcome = fx.scheduler.cancel(10, USER, true).await.unwrap();

    assert_eq!(outcome, CancelOutcome::CancelledLocally);
    assert_eq!(fx.local.cancel_calls(), vec![(10, true)]);
    let task = fx.tasks.get(10).unwrap();
    assert_eq!(task.status, TaskStatus::Cancelled);
    assert_eq!(task.audit.updated_by, USER);
}

#[tokio::test]
async fn test_cancel_on_master_failure_leaves_status() {
    let fx = Fixture::new();
    fx.local.fail_cancel.set(true);
    fx.tasks
        .put(TaskBuilder::new().with_id(10).running().with_node(MASTER_ID).build());

    assert!(fx.scheduler.cancel(10, USER, false).await.is_err());
    assert_eq!(fx.tasks.get(10).unwrap().status, TaskStatus::Running);
    assert_eq!(fx.tasks.replace_calls.get(), 0);
}

#[tokio::test]
async fn test_cancel_on_worker_without_stream_marks_abnormal() {
    let fx = Fixture::new();
    fx.tasks
        .put(TaskBuilder::new().with_id(11).running().with_node(WORKER_A).build());

    let outcome = fx.scheduler.cancel(11, USER, false).await.unwrap();

    assert_eq!(outcome, CancelOutcome::MarkedAbnormal);
    let task = fx.tasks.get(11).unwrap();
    assert_eq!(task.status, TaskStatus::Abnormal);
    assert!(!task.error.unwrap_or_default().is_empty());
    assert!(fx.local.cancel_calls().is_empty());
}

#[tokio::test]
async fn test_cancel_on_worker_sends_cancel_message() {
    let fx = Fixture::new();
    let stream = fx.streams.register(12);
    fx.tasks
        .put(TaskBuilder::new().with_id(12).running().with_node(WORKER_A).build());

    let outcome = fx.scheduler.cancel(12, USER, true).await.unwrap();

    assert_eq!(outcome, CancelOutcome::SentToWorker);
    assert_eq!(
        stream.sent_messages(),
        vec![TaskControlMessage::Cancel {
            task_id: 12,
            force: true
        }]
    );
    // 终态由Worker上报
    assert_eq!(fx.tasks.get(12).unwrap().status, TaskStatus::Running);
}

#[tokio::test]
async fn test_cancel_on_worker_send_failure_leaves_task() {
    let fx = Fixture::new();
    let stream = fx.streams.register(13);
    stream.fail_send.set(true);
    fx.tasks
        .put(TaskBuilder::new().with_id(13).running().with_node(WORKER_A).build());

    let err = fx.scheduler.cancel(13, USER, false).await.unwrap_err();

    assert!(matches!(err, OrchestratorError::TransportFailure(_)));
    assert_eq!(fx.tasks.get(13).unwrap().status, TaskStatus::Running);
    assert_eq!(fx.tasks.replace_calls.get(), 0);
}

#[tokio::test]
async fn test_cancel_task_without_node_marks_abnormal() {
    let fx = Fixture::new();
    fx.tasks
        .put(TaskBuilder::new().with_id(14).running().without_node().build());

    let outcome = fx.scheduler.cancel(14, USER, false).await.unwrap();

    assert_eq!(outcome, CancelOutcome::MarkedAbnormal);
    assert_eq!(fx.tasks.get(14).unwrap().status, TaskStatus::Abnormal);
}

#[tokio::test]
async fn test_cancel_task_on_missing_node_marks_abnormal() {
    let fx = Fixture::new();
    fx.tasks
        .put(TaskBuilder::new().with_id(15).running().with_node(99).build());

    fx.scheduler.cancel(15, USER, false).await.unwrap();

    let task = fx.tasks.get(15).unwrap();
    assert_eq!(task.status, TaskStatus::Abnormal);
    assert!(task.error.unwrap().contains("99"));
}

#[tokio::test]
async fn test_cancel_node_lookup_failure_marks_abnormal() {
    let fx = Fixture::new();
    fx.nodes.fail_query.set(true);
    fx.tasks
        .put(TaskBuilder::new().with_id(16).running().with_node(WORKER_A).build());

    fx.scheduler.cancel(16, USER, false).await.unwrap();
    assert_eq!(fx.tasks.get(16).unwrap().status, TaskStatus::Abnormal);
}

#[tokio::test]
async fn test_cancel_returns_persist_failure_of_abnormal_mark() {
    let fx = Fixture::new();
    fx.tasks.fail_replace.set(true);
    fx.tasks
        .put(TaskBuilder::new().with_id(17).running().with_node(WORKER_A).build());

    let err = fx.scheduler.cancel(17, USER, false).await.unwrap_err();
    assert!(err.is_persistence_failure());
}

#[tokio::test]
async fn test_save_task_inserts_new_and_replaces_existing() {
    let fx = Fixture::new();

    let created = fx.scheduler.save_task(Task::new(3), USER).await.unwrap();
    assert!(created.id > 0);
    assert_eq!(created.audit.created_by, USER);

    let mut update = created.clone();
    update.status = TaskStatus::Finished;
    let saved = fx.scheduler.save_task(update, 77).await.unwrap();

    assert_eq!(saved.audit.created_by, USER);
    assert_eq!(saved.audit.created_at, created.audit.created_at);
    assert_eq!(saved.audit.updated_by, 77);
    assert_eq!(fx.tasks.get(created.id).unwrap().status, TaskStatus::Finished);
}

#[tokio::test]
async fn test_save_task_unknown_id_is_not_found() {
    let fx = Fixture::new();

    let mut task = Task::new(1);
    task.id = 500;
    let err = fx.scheduler.save_task(task, USER).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_set_interval() {
    let fx = Fixture::new();
    assert_eq!(fx.scheduler.interval(), Duration::from_secs(5));

    fx.scheduler.set_interval(Duration::from_millis(1500));
    assert_eq!(fx.scheduler.interval(), Duration::from_millis(1500));
}

#[tokio::test]
async fn test_set_interval_saturates_instead_of_truncating() {
    let fx = Fixture::new();

    // u64::MAX + 1 毫秒，截断转换会得到 0
    let huge = Duration::from_secs(u64::MAX / 1000 + 1);
    fx.scheduler.set_interval(huge);
    assert_eq!(fx.scheduler.interval(), Duration::from_millis(u64::MAX));

    fx.scheduler.set_interval(Duration::MAX);
    assert_eq!(fx.scheduler.interval(), Duration::from_millis(u64::MAX));
}
