//! Error types for the worker pool

/// Result type for worker pool operations
pub type Result<T> = std::result::Result<T, ThreadError>;

/// Errors that can occur in the worker pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ThreadError {
    /// The pool has been closed and no longer accepts jobs
    #[error("worker pool is closed")]
    PoolClosed,

    /// `close()` was invoked on a pool that was already closed
    #[error("worker pool was already closed")]
    AlreadyClosed,

    /// A result could not be narrowed to the requested type
    #[error("result cast failed: expected a value of type `{expected}`")]
    CastMismatch {
        /// Name of the requested type
        expected: &'static str,
    },

    /// The job's runner panicked; the worker recovered and delivered this instead
    #[error("Job panicked (job_id: {job_id}): {message}")]
    JobPanicked {
        /// ID of the job whose runner panicked
        job_id: u64,
        /// Panic message
        message: String,
    },

    /// No result arrived on a handle within the caller's timeout
    #[error("No result after {timeout_ms}ms (job_id: {job_id})")]
    ResultTimeout {
        /// ID of the job being waited on
        job_id: u64,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{thread_id}: {message}")]
    SpawnError {
        /// ID of the thread that failed to spawn
        thread_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{thread_id}: {message}")]
    JoinError {
        /// ID of the thread that failed to join
        thread_id: usize,
        /// Error message
        message: String,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },
}

impl ThreadError {
    /// Create a cast mismatch error for the requested type
    pub fn cast_mismatch<T: ?Sized>() -> Self {
        ThreadError::CastMismatch {
            expected: std::any::type_name::<T>(),
        }
    }

    /// Create a job panicked error
    pub fn job_panicked(job_id: u64, message: impl Into<String>) -> Self {
        ThreadError::JobPanicked {
            job_id,
            message: message.into(),
        }
    }

    /// Create a result timeout error
    pub fn result_timeout(job_id: u64, timeout_ms: u64) -> Self {
        ThreadError::ResultTimeout { job_id, timeout_ms }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        thread_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ThreadError::SpawnError {
            thread_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(thread_id: usize, message: impl Into<String>) -> Self {
        ThreadError::JoinError {
            thread_id,
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        ThreadError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error reports a closed pool
    pub fn is_pool_closed(&self) -> bool {
        matches!(self, ThreadError::PoolClosed)
    }
}
