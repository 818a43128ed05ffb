use std::sync::Arc;
use std::time::Duration;

use orchestrator_core::models::{Record, SPIDER_KEY, TASK_KEY};
use orchestrator_core::traits::SinkRegistry;
use orchestrator_stats::{DataSinkResolver, TaskStatsService};
use orchestrator_testing_utils::{
    record, MockDocumentStore, MockLogStore, MockSinkRegistry, MockSpiderRepository,
    MockStatRepository, MockTaskRepository, SpiderBuilder, StatBuilder, TaskBuilder,
};
use serde_json::json;

const TASK_ID: i64 = 7;
const SPIDER_ID: i64 = 3;
const SINK_ID: i64 = 11;

struct Fixture {
    stats: MockStatRepository,
    store: MockDocumentStore,
    logs: MockLogStore,
    registry: MockSinkRegistry,
    service: TaskStatsService,
}

fn fixture(licensed: bool, with_data_source: bool) -> Fixture {
    fixture_with_registry(licensed, licensed, with_data_source)
}

fn fixture_with_registry(licensed: bool, with_registry: bool, with_data_source: bool) -> Fixture {
    let tasks = MockTaskRepository::new();
    let spiders = MockSpiderRepository::new();
    let stats = MockStatRepository::new();
    let store = MockDocumentStore::new();
    let logs = MockLogStore::new();
    let registry = MockSinkRegistry::new();

    tasks.put(
        TaskBuilder::new()
            .with_id(TASK_ID)
            .with_spider(SPIDER_ID)
            .running()
            .build(),
    );
    let mut spider = SpiderBuilder::new()
        .with_id(SPIDER_ID)
        .with_col_name("results_books");
    if with_data_source {
        spider = spider.with_data_source(SINK_ID);
    }
    spiders.put(spider.build());
    stats.put(StatBuilder::new(TASK_ID).build());

    let resolver = Arc::new(DataSinkResolver::new(
        Arc::new(tasks),
        Arc::new(spiders),
        with_registry.then(|| Arc::new(registry.clone()) as Arc<dyn SinkRegistry>),
        licensed,
        Duration::from_secs(600),
    ));
    let service = TaskStatsService::new(
        resolver,
        Arc::new(stats.clone()),
        Arc::new(store.clone()),
        Arc::new(logs.clone()),
    );

    Fixture {
        stats,
        store,
        logs,
        registry,
        service,
    }
}

async fn wait_for_result_count(stats: &MockStatRepository, expected: i64) -> i64 {
    for _ in 0..100 {
        let count = stats.get(TASK_ID).map(|s| s.result_count).unwrap_or(0);
        if count == expected {
            return count;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    stats.get(TASK_ID).map(|s| s.result_count).unwrap_or(0)
}

fn records(values: Vec<serde_json::Value>) -> Vec<Record> {
    values.into_iter().map(record).collect()
}

#[tokio::test]
async fn test_insert_data_default_mode() {
    let fx = fixture(false, false);

    let written = fx
        .service
        .insert_data(TASK_ID, records(vec![json!({"a": 1}), json!({"a": 2})]))
        .await
        .unwrap();
    assert_eq!(written, 2);

    let docs = fx.store.documents("results_books");
    assert_eq!(docs.len(), 2);
    for (doc, a) in docs.iter().zip([1, 2]) {
        assert_eq!(doc["a"], a);
        assert_eq!(doc[TASK_KEY], TASK_ID);
        assert_eq!(doc[SPIDER_KEY], SPIDER_ID);
    }

    assert_eq!(wait_for_result_count(&fx.stats, 2).await, 2);
}

#[tokio::test]
async fn test_insert_data_default_mode_ignores_data_source() {
    let fx = fixture(false, true);

    fx.service
        .insert_data(TASK_ID, records(vec![json!({"a": 1})]))
        .await
        .unwrap();

    assert_eq!(fx.store.documents("results_books").len(), 1);
    assert_eq!(fx.registry.resolve_calls.get(), 0);
}

#[tokio::test]
async fn test_insert_data_default_mode_store_failure_fails_call() {
    let fx = fixture(false, false);
    fx.store.fail_insert.set(true);

    let err = fx
        .service
        .insert_data(TASK_ID, records(vec![json!({"a": 1}), json!({"a": 2})]))
        .await
        .unwrap_err();
    assert!(err.is_persistence_failure());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(fx.stats.increment_calls.get(), 0);
}

#[tokio::test]
async fn test_insert_data_licensed_mode_writes_per_record() {
    let fx = fixture(true, true);
    let sink = fx.registry.register(SINK_ID);
    sink.fail_on_field("bad");

    let written = fx
        .service
        .insert_data(
            TASK_ID,
            records(vec![json!({"a": 1}), json!({"bad": true}), json!({"a": 3})]),
        )
        .await
        .unwrap();
    assert_eq!(written, 2);

    let rows = sink.rows();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.sink_id, SINK_ID);
        assert_eq!(row.schema_hint, "");
        assert_eq!(row.table_name, "results_books");
        assert_eq!(row.record[TASK_KEY], TASK_ID);
        assert_eq!(row.record[SPIDER_KEY], SPIDER_ID);
    }
    assert!(fx.store.documents("results_books").is_empty());

    assert_eq!(wait_for_result_count(&fx.stats, 2).await, 2);
}

#[tokio::test]
async fn test_insert_data_licensed_mode_without_data_source_uses_default_store() {
    let fx = fixture(true, false);

    let written = fx
        .service
        .insert_data(TASK_ID, records(vec![json!({"a": 1})]))
        .await
        .unwrap();

    assert_eq!(written, 1);
    assert_eq!(fx.store.documents("results_books").len(), 1);
}

#[tokio::test]
async fn test_insert_data_default_mode_never_resolves_sink() {
    // 注册表存在但未授权，且数据源未在注册表中登记
    let fx = fixture_with_registry(false, true, true);

    let written = fx
        .service
        .insert_data(TASK_ID, records(vec![json!({"a": 1}), json!({"a": 2})]))
        .await
        .unwrap();

    assert_eq!(written, 2);
    assert_eq!(fx.registry.resolve_calls.get(), 0);
    assert_eq!(fx.store.documents("results_books").len(), 2);
    assert_eq!(wait_for_result_count(&fx.stats, 2).await, 2);
}

#[tokio::test]
async fn test_insert_data_resolves_sink_once_per_task() {
    let fx = fixture(true, true);
    fx.registry.register(SINK_ID);

    for _ in 0..3 {
        fx.service
            .insert_data(TASK_ID, records(vec![json!({"a": 1})]))
            .await
            .unwrap();
    }

    assert_eq!(fx.registry.resolve_calls.get(), 1);
    assert_eq!(wait_for_result_count(&fx.stats, 3).await, 3);
}

#[tokio::test]
async fn test_counter_failure_is_not_surfaced() {
    let fx = fixture(false, false);
    fx.stats.fail_increment.set(true);

    let written = fx
        .service
        .insert_data(TASK_ID, records(vec![json!({"a": 1})]))
        .await
        .unwrap();
    assert_eq!(written, 1);
}

#[tokio::test]
async fn test_insert_data_unknown_task() {
    let fx = fixture(false, false);

    let err = fx
        .service
        .insert_data(404, records(vec![json!({"a": 1})]))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_insert_empty_batch_is_noop() {
    let fx = fixture(false, false);

    assert_eq!(fx.service.insert_data(TASK_ID, vec![]).await.unwrap(), 0);
    assert_eq!(fx.service.resolver().cached_items(), 0);
}

#[tokio::test]
async fn test_insert_logs_delegates_to_log_store() {
    let fx = fixture(false, false);
    let lines = vec!["starting".to_string(), "done".to_string()];

    fx.service.insert_logs(TASK_ID, &lines).await.unwrap();

    assert_eq!(fx.logs.lines(TASK_ID), lines);
}

#[tokio::test]
async fn test_insert_logs_failure_propagates() {
    let fx = fixture(false, false);
    fx.logs.fail_write.set(true);

    assert!(fx
        .service
        .insert_logs(TASK_ID, &["x".to_string()])
        .await
        .is_err());
}
