use chrono::{Duration, Utc};
use orchestrator_core::{
    config::DatabaseConfig,
    models::{Node, QueueItem, Record, Spider, Stat, Task, TaskStatus, SYSTEM_ACTOR},
    traits::{
        DocumentStore, NodeRepository, QueueItemRepository, SpiderRepository, StatRepository,
        TaskRepository,
    },
};
use orchestrator_infrastructure::{
    DatabaseManager, SqliteDocumentStore, SqliteNodeRepository, SqliteQueueItemRepository,
    SqliteSpiderRepository, SqliteStatRepository, SqliteTaskRepository,
};
use serde_json::json;

async fn setup() -> DatabaseManager {
    let manager = DatabaseManager::in_memory().await.unwrap();
    manager.migrate().await.unwrap();
    manager
}

fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_task_crud() {
    let db = setup().await;
    let repo = SqliteTaskRepository::new(db.pool().clone());

    let created = repo
        .create(&Task::new(11).with_priority(3).with_node(2))
        .await
        .unwrap();
    assert!(created.id > 0);

    let mut loaded = repo.get_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(loaded.spider_id, 11);
    assert_eq!(loaded.priority, 3);
    assert_eq!(loaded.node_id, Some(2));
    assert_eq!(loaded.status, TaskStatus::Pending);

    loaded.mark_abnormal("lost");
    repo.replace(&loaded).await.unwrap();
    let reloaded = repo.get_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, TaskStatus::Abnormal);
    assert_eq!(reloaded.error.as_deref(), Some("lost"));

    repo.delete(created.id).await.unwrap();
    assert!(repo.get_by_id(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_replace_missing_task_is_not_found() {
    let db = setup().await;
    let repo = SqliteTaskRepository::new(db.pool().clone());

    let mut task = Task::new(1);
    task.id = 999;
    let err = repo.replace(&task).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_get_by_statuses_and_bulk_delete() {
    let db = setup().await;
    let repo = SqliteTaskRepository::new(db.pool().clone());

    let pending = repo.create(&Task::new(1)).await.unwrap();
    let running = repo
        .create(&Task::new(1).with_status(TaskStatus::Running))
        .await
        .unwrap();
    let finished = repo
        .create(&Task::new(1).with_status(TaskStatus::Finished))
        .await
        .unwrap();

    let volatile = repo
        .get_by_statuses(&[TaskStatus::Pending, TaskStatus::Running])
        .await
        .unwrap();
    let ids: Vec<i64> = volatile.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![pending.id, running.id]);

    assert!(repo.get_by_statuses(&[]).await.unwrap().is_empty());

    let deleted = repo.delete_by_ids(&[pending.id, finished.id]).await.unwrap();
    assert_eq!(deleted, 2);
    assert!(repo.get_by_id(running.id).await.unwrap().is_some());
    assert_eq!(repo.delete_by_ids(&[]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_queue_items() {
    let db = setup().await;
    let repo = SqliteQueueItemRepository::new(db.pool().clone());

    let mut task = Task::new(1).with_priority(7).with_node(4);
    task.id = 10;
    repo.create(&QueueItem::for_task(&task, SYSTEM_ACTOR))
        .await
        .unwrap();
    task.id = 11;
    repo.create(&QueueItem::for_task(&task, SYSTEM_ACTOR))
        .await
        .unwrap();

    let item = repo.get_by_id(10).await.unwrap().unwrap();
    assert_eq!(item.priority, 7);
    assert_eq!(item.node_id, Some(4));
    assert_eq!(repo.count().await.unwrap(), 2);

    repo.delete(10).await.unwrap();
    // 重复删除不报错
    repo.delete(10).await.unwrap();
    assert_eq!(repo.delete_all().await.unwrap(), 1);
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_stats_retention_query_and_increment() {
    let db = setup().await;
    let repo = SqliteStatRepository::new(db.pool().clone());

    let mut old = Stat::for_task(1, SYSTEM_ACTOR);
    old.audit.created_at = Utc::now() - Duration::days(31);
    repo.create(&old).await.unwrap();
    repo.create(&Stat::for_task(2, SYSTEM_ACTOR)).await.unwrap();

    let expired = repo
        .get_created_before(Utc::now() - Duration::days(30))
        .await
        .unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, 1);

    repo.increment_result_count(2, 5).await.unwrap();
    repo.increment_result_count(2, 2).await.unwrap();
    assert_eq!(repo.get_by_id(2).await.unwrap().unwrap().result_count, 7);

    let err = repo.increment_result_count(99, 1).await.unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(repo.delete_by_ids(&[1]).await.unwrap(), 1);
    assert!(repo.get_by_id(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_nodes_and_spiders() {
    let db = setup().await;
    let nodes = SqliteNodeRepository::new(db.pool().clone());
    let spiders = SqliteSpiderRepository::new(db.pool().clone());

    nodes.upsert(&Node::master(1, "master")).await.unwrap();
    nodes.upsert(&Node::worker(2, "worker-a")).await.unwrap();

    assert!(nodes.get_by_id(1).await.unwrap().unwrap().is_master);
    assert!(!nodes.get_by_id(2).await.unwrap().unwrap().is_master);
    assert_eq!(nodes.get_by_key("worker-a").await.unwrap().unwrap().id, 2);
    assert!(nodes.get_by_id(3).await.unwrap().is_none());

    let spider = Spider {
        id: 5,
        name: "news".to_string(),
        col_name: "results_news".to_string(),
        data_source_id: Some(9),
    };
    spiders.upsert(&spider).await.unwrap();
    assert_eq!(spiders.get_by_id(5).await.unwrap(), Some(spider));
}

#[tokio::test]
async fn test_node_register_is_idempotent() {
    let db = setup().await;
    let nodes = SqliteNodeRepository::new(db.pool().clone());

    let first = nodes.register("master-host", true).await.unwrap();
    assert!(first.is_master);
    assert_eq!(first.name, "master-host");

    let second = nodes.register("master-host", false).await.unwrap();
    assert_eq!(second.id, first.id);
    assert!(!second.is_master);
}

#[tokio::test]
async fn test_document_store_insert_many() {
    let db = setup().await;
    let store = SqliteDocumentStore::new(db.pool().clone());

    store
        .insert_many(
            "results_news",
            &[record(json!({"a": 1})), record(json!({"a": 2}))],
        )
        .await
        .unwrap();
    store.insert_many("results_news", &[]).await.unwrap();

    assert_eq!(store.count("results_news").await.unwrap(), 2);
    assert_eq!(store.count("other").await.unwrap(), 0);

    let docs = store.find("results_news", 10).await.unwrap();
    assert_eq!(docs[0]["a"], 1);
    assert_eq!(docs[1]["a"], 2);
}

#[tokio::test]
async fn test_file_backed_database() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("orchestrator.db").display()),
        ..Default::default()
    };

    let db = DatabaseManager::new(&config).await.unwrap();
    db.migrate().await.unwrap();
    db.health_check().await.unwrap();

    let repo = SqliteTaskRepository::new(db.pool().clone());
    let task = repo.create(&Task::new(1)).await.unwrap();
    assert!(repo.get_by_id(task.id).await.unwrap().is_some());
    db.close().await;
}
