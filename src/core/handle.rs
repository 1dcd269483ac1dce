//! Per-job result handles
//!
//! A [`ResultHandle`] is a one-shot future: its worker writes exactly one
//! [`Outcome`], or the handle is closed with nothing in it. A closed, empty
//! handle means the job never ran (the pool shut down before it started, or
//! shutdown won the race against the delivery).
//!
//! # Example
//!
//! ```rust
//! use csv_worker_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::new(2)?;
//! let handle = pool.add(|| 6 * 7)?;
//!
//! let answer = handle.cast::<i32>().next().expect("job delivered a value")?;
//! assert_eq!(answer, 42);
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```

use crate::core::cast::Cast;
use crate::core::error::{Result, ThreadError};
use crate::core::job::{JobId, Outcome};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::any::Any;
use std::time::Duration;

/// The reading end of a job's capacity-one result slot
#[derive(Debug)]
pub struct ResultHandle {
    job_id: JobId,
    rx: Receiver<Outcome>,
}

impl ResultHandle {
    pub(crate) fn new(job_id: JobId, rx: Receiver<Outcome>) -> Self {
        Self { job_id, rx }
    }

    /// ID of the job this handle belongs to
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Block until the job's outcome arrives.
    ///
    /// Returns `None` once the handle is closed with no value in it.
    pub fn recv(&self) -> Option<Outcome> {
        self.rx.recv().ok()
    }

    /// Block for at most `timeout` waiting on the outcome.
    ///
    /// The pool never cancels the job itself: on
    /// [`ThreadError::ResultTimeout`] it may still be running, and the handle
    /// can be read again or simply dropped.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Outcome>> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(RecvTimeoutError::Disconnected) => Ok(None),
            Err(RecvTimeoutError::Timeout) => Err(ThreadError::result_timeout(
                self.job_id,
                timeout.as_millis() as u64,
            )),
        }
    }

    /// Returns true if an outcome is waiting to be read
    pub fn is_ready(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Narrow this handle's results to `T`
    pub fn cast<T: Any>(self) -> Cast<T> {
        Cast::new(self)
    }
}
