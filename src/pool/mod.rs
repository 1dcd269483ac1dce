//! Worker pool and worker implementations

pub mod worker;
pub mod worker_pool;

pub use worker::{Worker, WorkerStatSnapshot, WorkerStats};
pub use worker_pool::{WorkerPool, WorkerPoolConfig};
