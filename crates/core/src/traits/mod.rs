pub mod log_store;
pub mod repository;
pub mod sink;
pub mod task_executor;
pub mod transport;

pub use log_store::*;
pub use repository::*;
pub use sink::*;
pub use task_executor::*;
pub use transport::*;
