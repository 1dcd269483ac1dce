//! Job type and the opaque values it produces

use crate::core::error::Result;
use crate::core::handle::ResultHandle;
use crossbeam_channel::{bounded, Sender};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier assigned to every job at submission
pub type JobId = u64;

/// An opaque job result
pub type Payload = Box<dyn Any + Send>;

/// What a worker delivers on a job's handle: the runner's value, or the
/// error describing why there is none
pub type Outcome = Result<Payload>;

/// A boxed, argument-free runner producing one opaque value
pub type Runner = Box<dyn FnOnce() -> Payload + Send>;

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

fn next_job_id() -> JobId {
    NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed)
}

/// One unit of work plus the private slot its result is written to.
///
/// A job is consumed exactly once by exactly one worker.
pub struct Job {
    pub(crate) id: JobId,
    pub(crate) runner: Runner,
    pub(crate) result: Sender<Outcome>,
}

impl Job {
    /// Create a job from a closure, returning it together with the handle
    /// its result will be delivered on.
    pub fn new<F, T>(runner: F) -> (Self, ResultHandle)
    where
        F: FnOnce() -> T + Send + 'static,
        T: Any + Send,
    {
        Self::from_runner(Box::new(move || Box::new(runner()) as Payload))
    }

    /// Create a job from an already boxed runner
    pub fn from_runner(runner: Runner) -> (Self, ResultHandle) {
        let id = next_job_id();
        let (tx, rx) = bounded(1);
        let job = Self {
            id,
            runner,
            result: tx,
        };
        (job, ResultHandle::new(id, rx))
    }

    /// Get the job's ID
    pub fn id(&self) -> JobId {
        self.id
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({})", self.id)
    }
}
