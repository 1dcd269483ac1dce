//! Worker pool implementation

use crate::core::{Job, ResultHandle, Result, Runner, ShutdownSignal, ThreadError};
use crate::diagnostics::{EventSink, NoopSink, PoolEvent};
use crate::pool::worker::{
    Worker, WorkerContext, WorkerStatSnapshot, WorkerStats, JOIN_TIMEOUT,
};
use crossbeam_channel::{bounded, select, Sender};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Configuration for a worker pool
#[derive(Clone)]
pub struct WorkerPoolConfig {
    /// Number of worker threads, fixed for the pool's lifetime
    pub num_workers: usize,
    /// Thread name prefix
    pub thread_name_prefix: String,
    /// Receiver of lifecycle events
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for WorkerPoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPoolConfig")
            .field("num_workers", &self.num_workers)
            .field("thread_name_prefix", &self.thread_name_prefix)
            .field("sink", &"<event sink>")
            .finish()
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: 3,
            thread_name_prefix: "worker".to_string(),
            sink: Arc::new(NoopSink),
        }
    }
}

impl WorkerPoolConfig {
    /// Create a new configuration with the given number of workers
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers,
            ..Default::default()
        }
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Send every lifecycle event to `sink`.
    ///
    /// The default sink discards everything.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(ThreadError::invalid_config(
                "num_workers",
                "Number of workers must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// A fixed-size pool of workers that run argument-free jobs and hand each
/// result back through its own [`ResultHandle`].
///
/// # Handoff
///
/// Jobs travel over a rendezvous channel: [`add`](Self::add) returns only
/// once a worker has accepted the job, so at most `num_workers` jobs are in
/// flight and submitters feel backpressure directly.
///
/// # Shutdown Mechanism
///
/// [`close`](Self::close) fires a one-shot broadcast that every blocked
/// worker and every blocked submitter is also waiting on. Idle workers exit
/// at once; a worker busy in a runner exits as soon as the runner returns
/// and its outcome has been handed over (or shutdown wins that race). Jobs
/// are never started after `close` returns. Handles that are never read do
/// not keep anything alive.
pub struct WorkerPool {
    config: WorkerPoolConfig,
    jobs: Sender<Job>,
    shutdown: ShutdownSignal,
    workers: Mutex<Vec<Worker>>,
    stats: Vec<Arc<WorkerStats>>,
    total_jobs_submitted: AtomicU64,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .field(
                "total_jobs_submitted",
                &self.total_jobs_submitted.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool with `num_workers` workers and default options
    pub fn new(num_workers: usize) -> Result<Self> {
        Self::with_config(WorkerPoolConfig::new(num_workers))
    }

    /// Create a pool with custom configuration.
    ///
    /// Workers are spawned immediately and start waiting for jobs.
    pub fn with_config(config: WorkerPoolConfig) -> Result<Self> {
        config.validate()?;

        let (jobs, feed) = bounded::<Job>(0);
        let shutdown = ShutdownSignal::new();

        let mut workers = Vec::with_capacity(config.num_workers);
        for id in 0..config.num_workers {
            let context = WorkerContext {
                jobs: feed.clone(),
                shutdown: shutdown.listener(),
                sink: Arc::clone(&config.sink),
            };
            let name = format!("{}-{}", config.thread_name_prefix, id);
            match Worker::spawn(id, name, context) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    // Release the workers that did start before bailing out
                    shutdown.fire();
                    return Err(e);
                }
            }
        }

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_start(config.num_workers);

        let stats = workers.iter().map(Worker::stats).collect();

        Ok(Self {
            config,
            jobs,
            shutdown,
            workers: Mutex::new(workers),
            stats,
            total_jobs_submitted: AtomicU64::new(0),
        })
    }

    /// Submit a job.
    ///
    /// Blocks until a worker accepts the job. Returns
    /// [`ThreadError::PoolClosed`] without blocking if the pool is closed,
    /// and unblocks with the same error if the pool closes while waiting.
    ///
    /// Safe to call from many threads at once; the first idle worker wins
    /// and there is no ordering across concurrent submitters.
    ///
    /// # Example
    ///
    /// ```
    /// use csv_worker_pool::prelude::*;
    ///
    /// # fn main() -> Result<()> {
    /// let pool = WorkerPool::new(3)?;
    ///
    /// let handles = (0..10)
    ///     .map(|i| pool.add(move || i * 2).map(ResultHandle::cast::<i32>))
    ///     .collect::<Result<Vec<_>>>()?;
    ///
    /// let mut doubled = handles
    ///     .into_iter()
    ///     .flatten()
    ///     .collect::<Result<Vec<_>>>()?;
    /// doubled.sort();
    /// assert_eq!(doubled, (0..10).map(|i| i * 2).collect::<Vec<_>>());
    /// # pool.shutdown()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn add<F, T>(&self, runner: F) -> Result<ResultHandle>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Any + Send,
    {
        let (job, handle) = Job::new(runner);
        self.dispatch(job)?;
        Ok(handle)
    }

    /// Submit a runner that already produces an opaque [`Payload`](crate::core::Payload)
    pub fn add_boxed(&self, runner: Runner) -> Result<ResultHandle> {
        let (job, handle) = Job::from_runner(runner);
        self.dispatch(job)?;
        Ok(handle)
    }

    /// Hand a job to the feed, racing the handoff against shutdown
    fn dispatch(&self, job: Job) -> Result<()> {
        let job_id = job.id();

        if self.shutdown.is_fired() {
            self.config.sink.record(&PoolEvent::JobRejected { job_id });
            return Err(ThreadError::PoolClosed);
        }

        let listener = self.shutdown.listener();
        let accepted = select! {
            send(self.jobs, job) -> sent => sent.is_ok(),
            recv(listener.receiver()) -> _ => false,
        };

        if !accepted {
            self.config.sink.record(&PoolEvent::JobRejected { job_id });
            return Err(ThreadError::PoolClosed);
        }

        self.total_jobs_submitted.fetch_add(1, Ordering::Relaxed);
        self.config.sink.record(&PoolEvent::JobQueued { job_id });

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_submission(job_id);

        Ok(())
    }

    /// Broadcast shutdown.
    ///
    /// Releases every idle worker, every worker stuck delivering and every
    /// submitter blocked in [`add`](Self::add). Does not wait for runners
    /// that are executing; use [`shutdown`](Self::shutdown) for that.
    ///
    /// The transition happens once: a second call returns
    /// [`ThreadError::AlreadyClosed`] and changes nothing.
    pub fn close(&self) -> Result<()> {
        if !self.shutdown.fire() {
            return Err(ThreadError::AlreadyClosed);
        }
        self.config.sink.record(&PoolEvent::PoolClosing);
        Ok(())
    }

    /// Close the pool (if it is still open) and wait for every worker to exit
    pub fn shutdown(&self) -> Result<()> {
        match self.close() {
            Ok(()) | Err(ThreadError::AlreadyClosed) => {}
            Err(e) => return Err(e),
        }

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            worker.join()?;
        }

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_shutdown(
            self.total_jobs_executed(),
            self.total_jobs_panicked(),
        );

        Ok(())
    }

    /// Returns true once [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_fired()
    }

    /// Get the number of worker threads
    pub fn num_workers(&self) -> usize {
        self.config.num_workers
    }

    /// Number of workers whose thread is still running
    pub fn live_workers(&self) -> usize {
        self.workers
            .lock()
            .iter()
            .filter(|worker| !worker.is_finished())
            .count()
    }

    /// Get total number of jobs accepted by a worker
    pub fn total_jobs_submitted(&self) -> u64 {
        self.total_jobs_submitted.load(Ordering::Relaxed)
    }

    /// Get statistics for all workers
    pub fn get_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.stats.clone()
    }

    /// Sum of every worker's counters
    pub fn stats(&self) -> WorkerStatSnapshot {
        self.stats
            .iter()
            .map(|stats| stats.snapshot())
            .fold(WorkerStatSnapshot::default(), |acc, s| WorkerStatSnapshot {
                jobs_completed: acc.jobs_completed + s.jobs_completed,
                jobs_panicked: acc.jobs_panicked + s.jobs_panicked,
                results_delivered: acc.results_delivered + s.results_delivered,
                results_abandoned: acc.results_abandoned + s.results_abandoned,
                jobs_discarded: acc.jobs_discarded + s.jobs_discarded,
                total_processing_time_us: acc.total_processing_time_us
                    + s.total_processing_time_us,
            })
    }

    /// Get total jobs executed across all workers
    pub fn total_jobs_executed(&self) -> u64 {
        self.stats.iter().map(|s| s.get_jobs_executed()).sum()
    }

    /// Get total jobs panicked across all workers
    pub fn total_jobs_panicked(&self) -> u64 {
        self.stats.iter().map(|s| s.get_jobs_panicked()).sum()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.close().is_ok() {
            log::debug!(
                "worker pool '{}' closed on drop",
                self.config.thread_name_prefix
            );
        }

        // One deadline for the whole pool, not one per worker
        let deadline = Instant::now() + JOIN_TIMEOUT;
        for mut worker in std::mem::take(&mut *self.workers.lock()) {
            worker.join_by(deadline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Payload;
    use crate::diagnostics::ExitReason;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_worker_pool_creation() {
        let pool = WorkerPool::new(4).expect("Failed to create worker pool");
        assert!(!pool.is_closed());
        assert_eq!(pool.num_workers(), 4);
        assert_eq!(pool.get_stats().len(), 4);

        pool.shutdown().expect("Failed to shutdown pool");
        assert!(pool.is_closed());
        assert_eq!(pool.live_workers(), 0);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = WorkerPool::new(0);
        assert!(matches!(result, Err(ThreadError::InvalidConfig { .. })));
    }

    #[test]
    fn test_config_builder() {
        let config = WorkerPoolConfig::new(2).with_thread_name_prefix("csv");
        assert_eq!(config.num_workers, 2);
        assert_eq!(config.thread_name_prefix, "csv");
        assert!(format!("{:?}", config).contains("<event sink>"));

        assert_eq!(WorkerPoolConfig::default().num_workers, 3);
    }

    #[test]
    fn test_thread_names_use_prefix() {
        let config = WorkerPoolConfig::new(1).with_thread_name_prefix("statement");
        let pool = WorkerPool::with_config(config).expect("Failed to create worker pool");

        let name = pool
            .add(|| thread::current().name().map(str::to_string))
            .expect("Failed to submit job")
            .cast::<Option<String>>()
            .next()
            .expect("value")
            .expect("ok");
        assert_eq!(name.as_deref(), Some("statement-0"));

        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_job_execution() {
        let pool = WorkerPool::new(2).expect("Failed to create worker pool");
        let counter = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let counter_clone = Arc::clone(&counter);
                pool.add(move || counter_clone.fetch_add(1, Ordering::Relaxed))
                    .expect("Failed to submit job")
            })
            .collect();

        for handle in handles {
            assert!(handle.recv().expect("value").is_ok());
        }

        assert_eq!(counter.load(Ordering::Relaxed), 10);
        assert_eq!(pool.total_jobs_submitted(), 10);

        pool.shutdown().expect("Failed to shutdown pool");
        assert_eq!(pool.total_jobs_executed(), 10);
        assert_eq!(pool.stats().results_delivered, 10);
    }

    #[test]
    fn test_add_boxed() {
        let pool = WorkerPool::new(1).expect("Failed to create worker pool");
        let handle = pool
            .add_boxed(Box::new(|| Box::new(7u16) as Payload))
            .expect("Failed to submit job");
        assert_eq!(handle.cast::<u16>().next().unwrap().unwrap(), 7);
        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_add_after_close() {
        let pool = WorkerPool::new(2).expect("Failed to create worker pool");
        pool.close().expect("Failed to close pool");

        let start = Instant::now();
        let result = pool.add(|| 1);
        assert!(matches!(result, Err(ThreadError::PoolClosed)));
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_double_close_is_reported() {
        let pool = WorkerPool::new(1).expect("Failed to create worker pool");
        pool.close().expect("Failed to close pool");
        assert!(matches!(pool.close(), Err(ThreadError::AlreadyClosed)));

        // shutdown after close still joins
        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_close_unblocks_pending_add() {
        let pool = Arc::new(WorkerPool::new(1).expect("Failed to create worker pool"));
        let (started_tx, started_rx) = crossbeam_channel::bounded(0);
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);

        // Occupy the only worker
        let busy = pool
            .add(move || {
                started_tx.send(()).unwrap();
                let _ = release_rx.recv();
            })
            .expect("Failed to submit blocking job");
        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("Blocking job should start");

        let pool_clone = Arc::clone(&pool);
        let blocked = thread::spawn(move || pool_clone.add(|| "never runs").map(|_| ()));

        thread::sleep(Duration::from_millis(50));
        pool.close().expect("Failed to close pool");

        let result = blocked.join().expect("submitter panicked");
        assert!(matches!(result, Err(ThreadError::PoolClosed)));

        drop(release_tx);
        assert!(busy.recv().expect("value").is_ok());
        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_events_reach_sink() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = Arc::clone(&events);
        let config = WorkerPoolConfig::new(1)
            .with_event_sink(Arc::new(move |e: &PoolEvent| events_clone.lock().push(e.clone())));
        let pool = WorkerPool::with_config(config).expect("Failed to create worker pool");

        let handle = pool.add(|| 1u8).expect("Failed to submit job");
        let job_id = handle.job_id();
        handle.recv().expect("value").expect("ok");
        pool.shutdown().expect("Failed to shutdown pool");
        let _ = pool.add(|| 2u8);

        let events = events.lock();
        assert!(events.contains(&PoolEvent::WorkerStarted { worker_id: 0 }));
        assert!(events.contains(&PoolEvent::JobQueued { job_id }));
        assert!(events.contains(&PoolEvent::JobStarted {
            worker_id: 0,
            job_id
        }));
        assert!(events.contains(&PoolEvent::ResultDelivered {
            worker_id: 0,
            job_id
        }));
        assert!(events.contains(&PoolEvent::PoolClosing));
        assert!(events.contains(&PoolEvent::WorkerExiting {
            worker_id: 0,
            reason: ExitReason::ShutdownWhileIdle
        }));
        assert!(events
            .iter()
            .any(|e| matches!(e, PoolEvent::JobRejected { .. })));
    }

    #[test]
    fn test_drop_closes_pool() {
        let pool = WorkerPool::new(2).expect("Failed to create worker pool");
        let stats = pool.get_stats();
        let handle = pool.add(|| 3u8).expect("Failed to submit job");

        let start = Instant::now();
        drop(pool);
        assert!(start.elapsed() < Duration::from_secs(5));

        // The job was accepted before the drop, so it either delivered or the handle closed
        match handle.recv() {
            Some(outcome) => assert_eq!(*outcome.unwrap().downcast::<u8>().unwrap(), 3),
            None => assert_eq!(stats.iter().map(|s| s.get_results_delivered()).sum::<u64>(), 0),
        }
    }
}
