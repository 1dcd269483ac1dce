//! Core types for the worker pool

pub mod cast;
pub mod error;
pub mod handle;
pub mod job;
pub mod shutdown;

pub use cast::{narrow, Cast};
pub use error::{Result, ThreadError};
pub use handle::ResultHandle;
pub use job::{Job, JobId, Outcome, Payload, Runner};
pub use shutdown::{ShutdownListener, ShutdownSignal};
