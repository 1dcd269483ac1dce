//! Worker thread implementation
//!
//! Each worker is a small state machine:
//!
//! ```text
//!            job arrives              runner returns / panics
//!   Idle ───────────────▶ Executing ─────────────────────────▶ Delivering
//!    │ ▲                                                          │
//!    │ └──────────────── handle accepted (or was dropped) ────────┤
//!    │                                                            │
//!    └── shutdown / feed closed ──▶ Terminated ◀── shutdown ──────┘
//! ```
//!
//! Every blocking point is a `select!` against the pool's shutdown signal,
//! so a worker can always be released by `close()`.

use crate::core::{Job, JobId, Outcome, Result, Runner, ShutdownListener, ThreadError};
use crate::diagnostics::{EventSink, ExitReason, PoolEvent};
use crossbeam_channel::{select, Receiver, Sender, TrySendError};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::{debug, span, Level};

/// Longest a dropped worker, or a dropped pool as a whole, waits for threads
pub(crate) const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Jobs whose runner returned normally
    pub jobs_completed: AtomicU64,
    /// Jobs whose runner panicked
    pub jobs_panicked: AtomicU64,
    /// Outcomes written to a handle
    pub results_delivered: AtomicU64,
    /// Outcomes nobody was left to read
    pub results_abandoned: AtomicU64,
    /// Jobs claimed after shutdown and dropped unrun
    pub jobs_discarded: AtomicU64,
    /// Total time spent running jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

/// Point-in-time copy of [`WorkerStats`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStatSnapshot {
    /// Jobs whose runner returned normally
    pub jobs_completed: u64,
    /// Jobs whose runner panicked
    pub jobs_panicked: u64,
    /// Outcomes written to a handle
    pub results_delivered: u64,
    /// Outcomes nobody was left to read
    pub results_abandoned: u64,
    /// Jobs claimed after shutdown and dropped unrun
    pub jobs_discarded: u64,
    /// Total time spent running jobs (microseconds)
    pub total_processing_time_us: u64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Add processing time
    pub fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Jobs run, whether they returned or panicked
    pub fn get_jobs_executed(&self) -> u64 {
        self.jobs_completed.load(Ordering::Relaxed) + self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Get total jobs panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Get total results delivered
    pub fn get_results_delivered(&self) -> u64 {
        self.results_delivered.load(Ordering::Relaxed)
    }

    /// Get average processing time per job in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.get_jobs_executed();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Copy every counter
    pub fn snapshot(&self) -> WorkerStatSnapshot {
        WorkerStatSnapshot {
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_panicked: self.jobs_panicked.load(Ordering::Relaxed),
            results_delivered: self.results_delivered.load(Ordering::Relaxed),
            results_abandoned: self.results_abandoned.load(Ordering::Relaxed),
            jobs_discarded: self.jobs_discarded.load(Ordering::Relaxed),
            total_processing_time_us: self.total_processing_time_us.load(Ordering::Relaxed),
        }
    }
}

/// Everything a worker thread shares with its pool
pub(crate) struct WorkerContext {
    pub(crate) jobs: Receiver<Job>,
    pub(crate) shutdown: ShutdownListener,
    pub(crate) sink: Arc<dyn EventSink>,
}

enum Idle {
    Claimed(Job),
    Exit(ExitReason),
}

enum Delivery {
    Delivered,
    Abandoned,
    Interrupted,
}

/// A worker thread bound to the pool's job feed
#[derive(Debug)]
pub struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a worker thread named `name`
    pub(crate) fn spawn(id: usize, name: String, context: WorkerContext) -> Result<Self> {
        let stats = Arc::new(WorkerStats::new());
        let stats_clone = Arc::clone(&stats);

        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || {
                Self::run(id, context, stats_clone);
            })
            .map_err(|e| ThreadError::spawn_with_source(id, "thread builder failed", e))?;

        Ok(Self {
            id,
            thread: Some(thread),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Returns true once the thread has returned
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Join the worker thread
    pub fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| ThreadError::join(self.id, "Worker panicked"))?;
        }
        Ok(())
    }

    /// Wait for the thread until `deadline`.
    ///
    /// Returns false when the thread is still running at the deadline; it is
    /// then detached, so a runner stuck in user code cannot hang the caller.
    pub(crate) fn join_by(&mut self, deadline: Instant) -> bool {
        let thread = match self.thread.take() {
            Some(thread) => thread,
            None => return true,
        };

        loop {
            if thread.is_finished() {
                if let Err(panic_info) = thread.join() {
                    log::error!(
                        "Worker {} panicked during shutdown: {}",
                        self.id,
                        panic_message(&*panic_info)
                    );
                }
                return true;
            }

            if Instant::now() >= deadline {
                log::warn!(
                    "Worker {} did not finish before the join deadline. Thread may be leaked.",
                    self.id
                );
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Main worker loop
    fn run(id: usize, context: WorkerContext, stats: Arc<WorkerStats>) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        let WorkerContext {
            jobs,
            shutdown,
            sink,
        } = context;

        sink.record(&PoolEvent::WorkerStarted { worker_id: id });

        let reason = loop {
            let job = match Self::wait_for_job(&jobs, &shutdown) {
                Idle::Claimed(job) => job,
                Idle::Exit(reason) => break reason,
            };

            // A job won the race against a shutdown that already fired
            if shutdown.is_fired() {
                WorkerStats::bump(&stats.jobs_discarded);
                sink.record(&PoolEvent::JobDiscarded {
                    worker_id: id,
                    job_id: job.id,
                });
                break ExitReason::ShutdownBeforeStart;
            }

            let Job {
                id: job_id,
                runner,
                result,
            } = job;

            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_worker_busy(id);

            sink.record(&PoolEvent::JobStarted {
                worker_id: id,
                job_id,
            });
            let outcome = Self::execute_job(id, job_id, runner, &stats, sink.as_ref());

            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_worker_idle(id);

            match Self::deliver(result, outcome, &shutdown) {
                Delivery::Delivered => {
                    WorkerStats::bump(&stats.results_delivered);
                    sink.record(&PoolEvent::ResultDelivered {
                        worker_id: id,
                        job_id,
                    });
                }
                Delivery::Abandoned => {
                    WorkerStats::bump(&stats.results_abandoned);
                    sink.record(&PoolEvent::ResultAbandoned {
                        worker_id: id,
                        job_id,
                    });
                }
                Delivery::Interrupted => {
                    WorkerStats::bump(&stats.results_abandoned);
                    break ExitReason::ShutdownWhileDelivering;
                }
            }
        };

        #[cfg(feature = "tracing")]
        debug!(
            jobs_executed = stats.get_jobs_executed(),
            jobs_panicked = stats.get_jobs_panicked(),
            "worker shutting down"
        );

        sink.record(&PoolEvent::WorkerExiting {
            worker_id: id,
            reason,
        });
    }

    /// Idle state: block until a job arrives or the pool shuts down
    fn wait_for_job(jobs: &Receiver<Job>, shutdown: &ShutdownListener) -> Idle {
        select! {
            recv(jobs) -> msg => match msg {
                Ok(job) => Idle::Claimed(job),
                Err(_) => Idle::Exit(ExitReason::FeedClosed),
            },
            recv(shutdown.receiver()) -> _ => Idle::Exit(ExitReason::ShutdownWhileIdle),
        }
    }

    /// Run a job with panic protection, turning a panic into an error outcome
    fn execute_job(
        id: usize,
        job_id: JobId,
        runner: Runner,
        stats: &WorkerStats,
        sink: &dyn EventSink,
    ) -> Outcome {
        #[cfg(feature = "tracing")]
        let job_span = span!(Level::DEBUG, "job_execution", job_id = job_id);
        #[cfg(feature = "tracing")]
        let _job_guard = job_span.enter();

        let start = Instant::now();
        let panic_result = catch_unwind(AssertUnwindSafe(runner));
        let elapsed = start.elapsed();
        stats.add_processing_time(elapsed.as_micros() as u64);

        match panic_result {
            Ok(payload) => {
                WorkerStats::bump(&stats.jobs_completed);
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_completion(elapsed);
                Ok(payload)
            }
            Err(panic_info) => {
                let message = panic_message(&*panic_info);
                log::error!("Worker {}: job {} panicked: {}", id, job_id, message);
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_panic(elapsed);
                WorkerStats::bump(&stats.jobs_panicked);
                sink.record(&PoolEvent::JobPanicked {
                    worker_id: id,
                    job_id,
                    message: message.clone(),
                });
                Err(ThreadError::job_panicked(job_id, message))
            }
        }
    }

    /// Delivering state: hand the outcome over unless shutdown gets there first
    fn deliver(result: Sender<Outcome>, outcome: Outcome, shutdown: &ShutdownListener) -> Delivery {
        match result.try_send(outcome) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Disconnected(_)) => Delivery::Abandoned,
            Err(TrySendError::Full(outcome)) => select! {
                send(result, outcome) -> sent => match sent {
                    Ok(()) => Delivery::Delivered,
                    Err(_) => Delivery::Abandoned,
                },
                recv(shutdown.receiver()) -> _ => Delivery::Interrupted,
            },
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.join_by(Instant::now() + JOIN_TIMEOUT);
    }
}
