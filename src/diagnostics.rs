//! Lifecycle diagnostics.
//!
//! Every state change in the pool is reported to an [`EventSink`] as a
//! [`PoolEvent`]. The default sink discards everything.
//!
//! # Example
//!
//! ```rust
//! use csv_worker_pool::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let config = WorkerPoolConfig::new(2).with_event_sink(Arc::new(LogSink));
//! let pool = WorkerPool::with_config(config)?;
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```

use crate::core::JobId;
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;

/// Why a worker thread stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// The job feed disconnected
    FeedClosed,
    /// Shutdown fired while the worker waited for a job
    ShutdownWhileIdle,
    /// Shutdown fired before the finished result could be handed over
    ShutdownWhileDelivering,
    /// The worker claimed a job after shutdown fired and dropped it unrun
    ShutdownBeforeStart,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::FeedClosed => write!(f, "jobs channel closed"),
            ExitReason::ShutdownWhileIdle => write!(f, "shutdown signal received while idle"),
            ExitReason::ShutdownWhileDelivering => {
                write!(f, "shutdown signal received while sending result")
            }
            ExitReason::ShutdownBeforeStart => {
                write!(f, "shutdown signal received before starting job")
            }
        }
    }
}

/// A lifecycle event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolEvent {
    /// A worker thread started
    WorkerStarted {
        /// Worker index
        worker_id: usize,
    },
    /// A job was handed to a worker
    JobQueued {
        /// Job ID
        job_id: JobId,
    },
    /// A submission was refused because the pool is closed
    JobRejected {
        /// Job ID
        job_id: JobId,
    },
    /// A worker began running a job
    JobStarted {
        /// Worker index
        worker_id: usize,
        /// Job ID
        job_id: JobId,
    },
    /// A job's runner panicked; the panic was delivered as an error
    JobPanicked {
        /// Worker index
        worker_id: usize,
        /// Job ID
        job_id: JobId,
        /// Panic message
        message: String,
    },
    /// A job's outcome was written to its handle
    ResultDelivered {
        /// Worker index
        worker_id: usize,
        /// Job ID
        job_id: JobId,
    },
    /// The caller dropped the handle before the outcome was ready
    ResultAbandoned {
        /// Worker index
        worker_id: usize,
        /// Job ID
        job_id: JobId,
    },
    /// A job claimed after shutdown was dropped without running
    JobDiscarded {
        /// Worker index
        worker_id: usize,
        /// Job ID
        job_id: JobId,
    },
    /// A worker thread is about to return
    WorkerExiting {
        /// Worker index
        worker_id: usize,
        /// Why it is leaving
        reason: ExitReason,
    },
    /// `close()` was called
    PoolClosing,
}

impl fmt::Display for PoolEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolEvent::WorkerStarted { worker_id } => write!(f, "Worker {}: started", worker_id),
            PoolEvent::JobQueued { job_id } => write!(f, "Job {} queued successfully", job_id),
            PoolEvent::JobRejected { job_id } => {
                write!(f, "Failed to add job {}: pool is closed", job_id)
            }
            PoolEvent::JobStarted { worker_id, job_id } => {
                write!(f, "Worker {}: executing job {}", worker_id, job_id)
            }
            PoolEvent::JobPanicked {
                worker_id,
                job_id,
                message,
            } => write!(f, "Worker {}: job {} panicked: {}", worker_id, job_id, message),
            PoolEvent::ResultDelivered { worker_id, job_id } => {
                write!(f, "Worker {}: result of job {} sent successfully", worker_id, job_id)
            }
            PoolEvent::ResultAbandoned { worker_id, job_id } => {
                write!(f, "Worker {}: result of job {} abandoned by caller", worker_id, job_id)
            }
            PoolEvent::JobDiscarded { worker_id, job_id } => {
                write!(f, "Worker {}: job {} discarded, pool is closed", worker_id, job_id)
            }
            PoolEvent::WorkerExiting { worker_id, reason } => {
                write!(f, "Worker {}: {}, exiting", worker_id, reason)
            }
            PoolEvent::PoolClosing => write!(f, "Closing worker pool"),
        }
    }
}

/// Receiver of lifecycle events.
///
/// Called from worker threads and submitters concurrently, so
/// implementations must be cheap and must not block on the pool.
pub trait EventSink: Send + Sync {
    /// Record one event
    fn record(&self, event: &PoolEvent);
}

impl<F> EventSink for F
where
    F: Fn(&PoolEvent) + Send + Sync,
{
    fn record(&self, event: &PoolEvent) {
        self(event)
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn record(&self, _event: &PoolEvent) {}
}

/// Forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, event: &PoolEvent) {
        match event {
            PoolEvent::JobPanicked { .. } => log::warn!("{}", event),
            PoolEvent::PoolClosing | PoolEvent::WorkerExiting { .. } => log::info!("{}", event),
            _ => log::debug!("{}", event),
        }
    }
}

/// Writes one line per event to any [`Write`]r
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink").finish_non_exhaustive()
    }
}

impl<W: Write + Send> EventSink for WriterSink<W> {
    fn record(&self, event: &PoolEvent) {
        let mut writer = self.writer.lock();
        // A failing diagnostics writer must not take the pool down
        if let Err(e) = writeln!(writer, "{}", event) {
            log::warn!("failed to write pool event: {}", e);
        }
    }
}
