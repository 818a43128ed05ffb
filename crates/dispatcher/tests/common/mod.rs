#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use orchestrator_dispatcher::TaskSchedulerService;
use orchestrator_testing_utils::{
    MockLocalTaskHandler, MockNodeRepository, MockQueueItemRepository, MockStatRepository,
    MockStreamRegistry, MockTaskRepository,
};
use orchestrator_core::models::Node;

pub const MASTER_ID: i64 = 1;
pub const WORKER_A: i64 = 2;

/// Scheduler wired to in-memory collaborators
pub struct Fixture {
    pub tasks: MockTaskRepository,
    pub queue: MockQueueItemRepository,
    pub stats: MockStatRepository,
    pub nodes: MockNodeRepository,
    pub local: MockLocalTaskHandler,
    pub streams: MockStreamRegistry,
    pub scheduler: Arc<TaskSchedulerService>,
}

impl Fixture {
    pub fn new() -> Self {
        let tasks = MockTaskRepository::new();
        let queue = MockQueueItemRepository::new();
        let stats = MockStatRepository::new();
        let nodes = MockNodeRepository::with_nodes(vec![
            Node::master(MASTER_ID, "master"),
            Node::worker(WORKER_A, "worker-a"),
        ]);
        let local = MockLocalTaskHandler::new();
        let streams = MockStreamRegistry::new();

        let scheduler = Arc::new(TaskSchedulerService::new(
            Arc::new(tasks.clone()),
            Arc::new(queue.clone()),
            Arc::new(stats.clone()),
            Arc::new(nodes.clone()),
            Arc::new(local.clone()),
            Arc::new(streams.clone()),
            Duration::from_secs(5),
        ));

        Self {
            tasks,
            queue,
            stats,
            nodes,
            local,
            streams,
            scheduler,
        }
    }
}
