//! Convenient re-exports for common types and traits

pub use crate::core::{narrow, Cast, JobId, Outcome, Payload, ResultHandle, Result, ThreadError};
pub use crate::diagnostics::{EventSink, ExitReason, LogSink, NoopSink, PoolEvent, WriterSink};
pub use crate::pool::{WorkerPool, WorkerPoolConfig, WorkerStats};
