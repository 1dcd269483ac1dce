//! # CSV Worker Pool
//!
//! A bounded worker pool where every submitted job gets its own result
//! handle, with a shutdown that never leaks a thread.
//!
//! ## Features
//!
//! - **Fixed Worker Set**: N named OS threads created once, pulling jobs from a rendezvous feed
//! - **Result Handles**: Each job's value arrives on a single-use, capacity-one channel
//! - **Type Adapter**: Narrow opaque results into typed values with [`Cast`](core::Cast)
//! - **Leak-Free Shutdown**: Every blocking point races a one-shot broadcast signal
//! - **Panic Recovery**: A panicking job is delivered as an error; its worker keeps serving
//! - **Diagnostics**: Lifecycle events through a pluggable [`EventSink`](diagnostics::EventSink)
//!
//! ## Quick Start
//!
//! ```rust
//! use csv_worker_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::new(4)?;
//!
//! // Submit jobs; each returns a handle for its own result
//! let handles = (0..10)
//!     .map(|i| pool.add(move || format!("job {} done", i)))
//!     .collect::<Result<Vec<_>>>()?;
//!
//! for handle in handles {
//!     for message in handle.cast::<String>() {
//!         println!("{}", message?);
//!     }
//! }
//!
//! // Shutdown gracefully
//! pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Pool Configuration
//!
//! ```rust
//! use csv_worker_pool::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let config = WorkerPoolConfig::new(8)
//!     .with_thread_name_prefix("statement")
//!     .with_event_sink(Arc::new(WriterSink::new(std::io::stderr())));
//!
//! let pool = WorkerPool::with_config(config)?;
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Mixed Result Types
//!
//! ```rust
//! use csv_worker_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::new(2)?;
//!
//! let number = pool.add(|| 7u64)?;
//! let text = pool.add(|| "seven")?;
//!
//! assert_eq!(number.cast::<u64>().next().transpose()?, Some(7));
//!
//! // Asking for the wrong type is an error, not a crash
//! let wrong = text.cast::<u64>().next();
//! assert!(matches!(wrong, Some(Err(ThreadError::CastMismatch { .. }))));
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Worker Statistics
//!
//! ```rust
//! use csv_worker_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! # let pool = WorkerPool::new(2)?;
//! # for _ in 0..10 {
//! #     pool.add(|| ())?.recv();
//! # }
//! // Get statistics
//! let stats = pool.get_stats();
//! for (i, stat) in stats.iter().enumerate() {
//!     println!("Worker {}: {} jobs executed", i, stat.get_jobs_executed());
//! }
//!
//! println!("Total jobs: {}", pool.total_jobs_executed());
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bankstatement;
pub mod core;
pub mod diagnostics;
pub mod pool;
pub mod prelude;

#[cfg(feature = "tracing")]
pub mod tracing;

pub use core::{narrow, Cast, ResultHandle, Result, ThreadError};
pub use pool::{WorkerPool, WorkerPoolConfig, WorkerStats};
