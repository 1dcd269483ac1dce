//! Tracing integration for observability.
//!
//! Available with the `tracing` feature. Workers run inside a `worker` span
//! and each runner inside a `job_execution` span; the functions below emit
//! metric-shaped events that a subscriber can aggregate.
//!
//! # Example
//!
//! ```rust,ignore
//! use csv_worker_pool::prelude::*;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("csv_worker_pool=trace".parse().unwrap()))
//!     .init();
//!
//! let pool = WorkerPool::new(4)?;
//! let handle = pool.add(|| 1 + 1)?;
//! ```

/// Metrics recording functions for observability.
///
/// These functions emit tracing events that can be consumed by
/// metrics collection systems like Prometheus via tracing-opentelemetry.
pub mod metrics {
    use crate::core::JobId;
    use std::time::Duration;

    /// Records a job accepted by a worker.
    #[inline]
    pub fn record_submission(job_id: JobId) {
        tracing::trace!(counter.jobs_submitted = 1, job_id = job_id, "job submitted");
    }

    /// Records job completion with timing.
    #[inline]
    pub fn record_completion(duration: Duration) {
        tracing::trace!(
            counter.jobs_completed = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job completed successfully"
        );
    }

    /// Records a job panic event.
    #[inline]
    pub fn record_panic(duration: Duration) {
        tracing::trace!(
            counter.jobs_panicked = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job panicked"
        );
    }

    /// Records worker becoming busy.
    #[inline]
    pub fn record_worker_busy(worker_id: usize) {
        tracing::trace!(gauge.workers_busy = 1, worker_id = worker_id, "worker busy");
    }

    /// Records worker becoming idle.
    #[inline]
    pub fn record_worker_idle(worker_id: usize) {
        tracing::trace!(
            gauge.workers_busy = -1i64,
            worker_id = worker_id,
            "worker idle"
        );
    }

    /// Records pool startup.
    #[inline]
    pub fn record_pool_start(num_workers: usize) {
        tracing::info!(workers = num_workers, "worker pool started");
    }

    /// Records pool shutdown.
    #[inline]
    pub fn record_pool_shutdown(jobs_processed: u64, jobs_panicked: u64) {
        tracing::info!(
            jobs_processed = jobs_processed,
            jobs_panicked = jobs_panicked,
            "worker pool shutdown complete"
        );
    }
}
