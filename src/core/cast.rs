//! Narrowing opaque results into typed ones.
//!
//! [`Cast<T>`] reads a [`ResultHandle`] lazily and forwards each outcome
//! after downcasting it to `T`. A value of any other type becomes
//! [`ThreadError::CastMismatch`] instead of being forwarded, and errors the
//! worker delivered (such as [`ThreadError::JobPanicked`]) pass through
//! unchanged. Closure of the handle ends the iterator.

use crate::core::error::{Result, ThreadError};
use crate::core::handle::ResultHandle;
use crate::core::job::{JobId, Payload};
use std::any::Any;
use std::marker::PhantomData;
use std::time::Duration;

/// Downcast a single payload to `T`
pub fn narrow<T: Any>(payload: Payload) -> Result<T> {
    payload
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| ThreadError::cast_mismatch::<T>())
}

/// Typed view over a [`ResultHandle`]
#[derive(Debug)]
pub struct Cast<T> {
    source: ResultHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> Cast<T> {
    pub(crate) fn new(source: ResultHandle) -> Self {
        Self {
            source,
            _marker: PhantomData,
        }
    }

    /// ID of the underlying job
    pub fn job_id(&self) -> JobId {
        self.source.job_id()
    }

    /// Like [`Iterator::next`] but gives up after `timeout`
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<Result<T>>> {
        Ok(self
            .source
            .recv_timeout(timeout)?
            .map(|outcome| outcome.and_then(narrow::<T>)))
    }

    /// Give the opaque handle back
    pub fn into_inner(self) -> ResultHandle {
        self.source
    }
}

impl<T: Any> Iterator for Cast<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let outcome = self.source.recv()?;
        Some(outcome.and_then(narrow::<T>))
    }
}
