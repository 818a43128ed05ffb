pub mod sqlite_document_store;
pub mod sqlite_node_repository;
pub mod sqlite_queue_item_repository;
pub mod sqlite_spider_repository;
pub mod sqlite_stat_repository;
pub mod sqlite_task_repository;

pub use sqlite_document_store::SqliteDocumentStore;
pub use sqlite_node_repository::SqliteNodeRepository;
pub use sqlite_queue_item_repository::SqliteQueueItemRepository;
pub use sqlite_spider_repository::SqliteSpiderRepository;
pub use sqlite_stat_repository::SqliteStatRepository;
pub use sqlite_task_repository::SqliteTaskRepository;
