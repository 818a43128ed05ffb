//! Mock implementations for all gateway and collaborator traits
//!
//! In-memory doubles used by unit and scenario tests. Every mock is cheap to
//! clone (state lives behind `Arc`), so a test can keep one handle for
//! assertions and hand another to the service under test.
//!
//! Failure injection uses `fail_*` switches; injected gateway failures surface
//! as `OrchestratorError::PersistenceFailure`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orchestrator_core::models::{Node, QueueItem, Record, Spider, Stat, Task, TaskStatus};
use orchestrator_core::traits::{
    DocumentStore, LocalTaskHandler, LogStore, NodeRepository, QueueItemRepository,
    SinkHandle, SinkRegistry, SpiderRepository, StatRepository, StreamRegistry,
    TaskControlMessage, TaskRepository, TaskStream,
};
use orchestrator_core::{OrchestratorError, OrchestratorResult, ResourceKind};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Shared on/off switch for failure injection
#[derive(Debug, Clone, Default)]
pub struct FailureSwitch(Arc<AtomicBool>);

impl FailureSwitch {
    pub fn set(&self, fail: bool) {
        self.0.store(fail, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self, operation: &str) -> OrchestratorResult<()> {
        if self.is_set() {
            Err(OrchestratorError::PersistenceFailure(format!(
                "injected failure: {operation}"
            )))
        } else {
            Ok(())
        }
    }
}

/// Shared call counter
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Mock implementation of TaskRepository for testing
#[derive(Debug, Clone)]
pub struct MockTaskRepository {
    tasks: Arc<Mutex<HashMap<i64, Task>>>,
    next_id: Arc<Mutex<i64>>,
    pub get_calls: CallCounter,
    pub replace_calls: CallCounter,
    pub fail_create: FailureSwitch,
    pub fail_replace: FailureSwitch,
    pub fail_query: FailureSwitch,
    pub fail_delete: FailureSwitch,
}

impl MockTaskRepository {
    pub fn new() -> Self {
        Self::with_tasks(vec![])
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let max_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        let task_map = tasks.into_iter().map(|t| (t.id, t)).collect();

        Self {
            tasks: Arc::new(Mutex::new(task_map)),
            next_id: Arc::new(Mutex::new(max_id + 1)),
            get_calls: CallCounter::default(),
            replace_calls: CallCounter::default(),
            fail_create: FailureSwitch::default(),
            fail_replace: FailureSwitch::default(),
            fail_query: FailureSwitch::default(),
            fail_delete: FailureSwitch::default(),
        }
    }

    /// Insert or overwrite a task directly, bypassing id generation
    pub fn put(&self, task: Task) {
        let mut next_id = self.next_id.lock().unwrap();
        if task.id >= *next_id {
            *next_id = task.id + 1;
        }
        self.tasks.lock().unwrap().insert(task.id, task);
    }

    pub fn get(&self, id: i64) -> Option<Task> {
        self.tasks.lock().unwrap().get(&id).cloned()
    }

    pub fn count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn get_all_tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.lock().unwrap().values().cloned().collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }
}

impl Default for MockTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskRepository for MockTaskRepository {
    async fn create(&self, task: &Task) -> OrchestratorResult<Task> {
        self.fail_create.check("task create")?;

        let mut next_id = self.next_id.lock().unwrap();
        let mut new_task = task.clone();
        if new_task.is_new() {
            new_task.id = *next_id;
        }
        *next_id = (*next_id).max(new_task.id + 1);

        self.tasks
            .lock()
            .unwrap()
            .insert(new_task.id, new_task.clone());
        Ok(new_task)
    }

    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<Task>> {
        self.get_calls.hit();
        self.fail_query.check("task get")?;
        Ok(self.get(id))
    }

    async fn replace(&self, task: &Task) -> OrchestratorResult<()> {
        self.replace_calls.hit();
        self.fail_replace.check("task replace")?;

        let mut tasks = self.tasks.lock().unwrap();
        match tasks.get_mut(&task.id) {
            Some(existing) => {
                *existing = task.clone();
                Ok(())
            }
            None => Err(OrchestratorError::not_found(ResourceKind::Task, task.id)),
        }
    }

    async fn delete(&self, id: i64) -> OrchestratorResult<()> {
        self.fail_delete.check("task delete")?;
        self.tasks.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn get_by_statuses(&self, statuses: &[TaskStatus]) -> OrchestratorResult<Vec<Task>> {
        self.fail_query.check("task query")?;
        Ok(self
            .get_all_tasks()
            .into_iter()
            .filter(|t| statuses.contains(&t.status))
            .collect())
    }

    async fn delete_by_ids(&self, ids: &[i64]) -> OrchestratorResult<u64> {
        self.fail_delete.check("task bulk delete")?;
        let mut tasks = self.tasks.lock().unwrap();
        Ok(ids.iter().filter(|id| tasks.remove(*id).is_some()).count() as u64)
    }
}

/// Mock implementation of QueueItemRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockQueueItemRepository {
    items: Arc<Mutex<HashMap<i64, QueueItem>>>,
    pub fail_create: FailureSwitch,
    pub fail_delete: FailureSwitch,
}

impl MockQueueItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, item: QueueItem) {
        self.items.lock().unwrap().insert(item.id, item);
    }

    pub fn get(&self, id: i64) -> Option<QueueItem> {
        self.items.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl QueueItemRepository for MockQueueItemRepository {
    async fn create(&self, item: &QueueItem) -> OrchestratorResult<()> {
        self.fail_create.check("queue item create")?;
        self.put(item.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<QueueItem>> {
        Ok(self.get(id))
    }

    async fn delete(&self, id: i64) -> OrchestratorResult<()> {
        self.fail_delete.check("queue item delete")?;
        self.items.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn delete_all(&self) -> OrchestratorResult<u64> {
        self.fail_delete.check("queue item delete all")?;
        let mut items = self.items.lock().unwrap();
        let removed = items.len() as u64;
        items.clear();
        Ok(removed)
    }

    async fn count(&self) -> OrchestratorResult<u64> {
        Ok(self.len() as u64)
    }
}

/// Mock implementation of StatRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockStatRepository {
    stats: Arc<Mutex<HashMap<i64, Stat>>>,
    pub increment_calls: CallCounter,
    pub fail_create: FailureSwitch,
    pub fail_query: FailureSwitch,
    pub fail_delete: FailureSwitch,
    pub fail_increment: FailureSwitch,
}

impl MockStatRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, stat: Stat) {
        self.stats.lock().unwrap().insert(stat.id, stat);
    }

    pub fn get(&self, id: i64) -> Option<Stat> {
        self.stats.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.stats.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StatRepository for MockStatRepository {
    async fn create(&self, stat: &Stat) -> OrchestratorResult<()> {
        self.fail_create.check("stat create")?;
        self.put(stat.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<Stat>> {
        Ok(self.get(id))
    }

    async fn delete(&self, id: i64) -> OrchestratorResult<()> {
        self.fail_delete.check("stat delete")?;
        self.stats.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn get_created_before(&self, cutoff: DateTime<Utc>) -> OrchestratorResult<Vec<Stat>> {
        self.fail_query.check("stat query")?;
        let mut stats: Vec<Stat> = self
            .stats
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.audit.created_at < cutoff)
            .cloned()
            .collect();
        stats.sort_by_key(|s| s.id);
        Ok(stats)
    }

    async fn delete_by_ids(&self, ids: &[i64]) -> OrchestratorResult<u64> {
        self.fail_delete.check("stat bulk delete")?;
        let mut stats = self.stats.lock().unwrap();
        Ok(ids.iter().filter(|id| stats.remove(*id).is_some()).count() as u64)
    }

    async fn increment_result_count(&self, id: i64, delta: i64) -> OrchestratorResult<()> {
        self.increment_calls.hit();
        self.fail_increment.check("stat increment")?;

        let mut stats = self.stats.lock().unwrap();
        match stats.get_mut(&id) {
            Some(stat) => {
                stat.result_count += delta;
                Ok(())
            }
            None => Err(OrchestratorError::not_found(ResourceKind::Stat, id)),
        }
    }
}

/// Mock implementation of NodeRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockNodeRepository {
    nodes: Arc<Mutex<HashMap<i64, Node>>>,
    pub fail_query: FailureSwitch,
}

impl MockNodeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes(nodes: Vec<Node>) -> Self {
        let repo = Self::default();
        for node in nodes {
            repo.put(node);
        }
        repo
    }

    pub fn put(&self, node: Node) {
        self.nodes.lock().unwrap().insert(node.id, node);
    }
}

#[async_trait]
impl NodeRepository for MockNodeRepository {
    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<Node>> {
        self.fail_query.check("node get")?;
        Ok(self.nodes.lock().unwrap().get(&id).cloned())
    }
}

/// Mock implementation of SpiderRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockSpiderRepository {
    spiders: Arc<Mutex<HashMap<i64, Spider>>>,
    pub get_calls: CallCounter,
}

impl MockSpiderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, spider: Spider) {
        self.spiders.lock().unwrap().insert(spider.id, spider);
    }
}

#[async_trait]
impl SpiderRepository for MockSpiderRepository {
    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<Spider>> {
        self.get_calls.hit();
        Ok(self.spiders.lock().unwrap().get(&id).cloned())
    }
}

/// In-memory default document store
#[derive(Debug, Clone, Default)]
pub struct MockDocumentStore {
    collections: Arc<Mutex<HashMap<String, Vec<Record>>>>,
    pub fail_insert: FailureSwitch,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self, collection: &str) -> Vec<Record> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn insert_many(&self, collection: &str, records: &[Record]) -> OrchestratorResult<()> {
        self.fail_insert.check("document insert")?;
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .extend(records.iter().cloned());
        Ok(())
    }
}

/// Recording task stream
#[derive(Debug, Clone, Default)]
pub struct MockTaskStream {
    sent: Arc<Mutex<Vec<TaskControlMessage>>>,
    pub fail_send: FailureSwitch,
}

impl MockTaskStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_messages(&self) -> Vec<TaskControlMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskStream for MockTaskStream {
    async fn send(&self, message: TaskControlMessage) -> OrchestratorResult<()> {
        if self.fail_send.is_set() {
            return Err(OrchestratorError::TransportFailure(
                "injected failure: stream send".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// Mock cancellation stream registry
#[derive(Clone, Default)]
pub struct MockStreamRegistry {
    streams: Arc<Mutex<HashMap<i64, Arc<MockTaskStream>>>>,
    pub lookup_calls: CallCounter,
}

impl MockStreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, task_id: i64) -> Arc<MockTaskStream> {
        let stream = Arc::new(MockTaskStream::new());
        self.streams
            .lock()
            .unwrap()
            .insert(task_id, stream.clone());
        stream
    }
}

#[async_trait]
impl StreamRegistry for MockStreamRegistry {
    async fn lookup(&self, task_id: i64) -> Option<Arc<dyn TaskStream>> {
        self.lookup_calls.hit();
        self.streams
            .lock()
            .unwrap()
            .get(&task_id)
            .map(|stream| stream.clone() as Arc<dyn TaskStream>)
    }
}

/// Recording local task handler
#[derive(Debug, Clone, Default)]
pub struct MockLocalTaskHandler {
    calls: Arc<Mutex<Vec<(i64, bool)>>>,
    pub fail_cancel: FailureSwitch,
}

impl MockLocalTaskHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(task_id, force)` of every cancel call, including failed ones
    pub fn cancel_calls(&self) -> Vec<(i64, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocalTaskHandler for MockLocalTaskHandler {
    async fn cancel(&self, task_id: i64, force: bool) -> OrchestratorResult<()> {
        self.calls.lock().unwrap().push((task_id, force));
        if self.fail_cancel.is_set() {
            return Err(OrchestratorError::Internal(format!(
                "injected failure: local cancel {task_id}"
            )));
        }
        Ok(())
    }
}

/// One row written through [`MockSinkHandle`]
#[derive(Debug, Clone, PartialEq)]
pub struct SinkRow {
    pub sink_id: i64,
    pub schema_hint: String,
    pub table_name: String,
    pub record: Record,
}

/// Recording external sink handle
///
/// Records carrying the configured poison field are rejected.
#[derive(Debug, Clone, Default)]
pub struct MockSinkHandle {
    rows: Arc<Mutex<Vec<SinkRow>>>,
    poison_field: Arc<Mutex<Option<String>>>,
}

impl MockSinkHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on_field(&self, field: &str) {
        *self.poison_field.lock().unwrap() = Some(field.to_string());
    }

    pub fn rows(&self) -> Vec<SinkRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SinkHandle for MockSinkHandle {
    async fn create_row(
        &self,
        sink_id: i64,
        schema_hint: &str,
        table_name: &str,
        record: &Record,
    ) -> OrchestratorResult<()> {
        if let Some(field) = self.poison_field.lock().unwrap().as_deref() {
            if record.contains_key(field) {
                return Err(OrchestratorError::PersistenceFailure(format!(
                    "injected failure: row with field {field}"
                )));
            }
        }

        self.rows.lock().unwrap().push(SinkRow {
            sink_id,
            schema_hint: schema_hint.to_string(),
            table_name: table_name.to_string(),
            record: record.clone(),
        });
        Ok(())
    }
}

/// Mock external sink registry
#[derive(Clone, Default)]
pub struct MockSinkRegistry {
    handles: Arc<Mutex<HashMap<i64, Arc<MockSinkHandle>>>>,
    pub resolve_calls: CallCounter,
}

impl MockSinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, sink_id: i64) -> Arc<MockSinkHandle> {
        let handle = Arc::new(MockSinkHandle::new());
        self.handles
            .lock()
            .unwrap()
            .insert(sink_id, handle.clone());
        handle
    }
}

#[async_trait]
impl SinkRegistry for MockSinkRegistry {
    async fn resolve_sink(&self, sink_id: i64) -> OrchestratorResult<Arc<dyn SinkHandle>> {
        self.resolve_calls.hit();
        self.handles
            .lock()
            .unwrap()
            .get(&sink_id)
            .map(|handle| handle.clone() as Arc<dyn SinkHandle>)
            .ok_or_else(|| OrchestratorError::not_found(ResourceKind::Sink, sink_id))
    }
}

/// In-memory log store
#[derive(Debug, Clone, Default)]
pub struct MockLogStore {
    lines: Arc<Mutex<HashMap<i64, Vec<String>>>>,
    pub fail_write: FailureSwitch,
}

impl MockLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self, task_id: i64) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .get(&task_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl LogStore for MockLogStore {
    async fn write_lines(&self, task_id: i64, lines: &[String]) -> OrchestratorResult<()> {
        self.fail_write.check("log write")?;
        self.lines
            .lock()
            .unwrap()
            .entry(task_id)
            .or_default()
            .extend(lines.iter().cloned());
        Ok(())
    }

    async fn find(
        &self,
        task_id: i64,
        pattern: &str,
        skip: usize,
        limit: usize,
    ) -> OrchestratorResult<Vec<String>> {
        Ok(self
            .lines(task_id)
            .into_iter()
            .filter(|line| line.contains(pattern))
            .skip(skip)
            .take(limit)
            .collect())
    }
}
