//! Property-based tests for csv_worker_pool using proptest

use csv_worker_pool::prelude::*;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// ============================================================================
// WorkerPoolConfig Tests
// ============================================================================

proptest! {
    /// Any positive worker count is a valid configuration
    #[test]
    fn test_config_worker_count(workers in 1usize..32) {
        let config = WorkerPoolConfig::new(workers);
        prop_assert!(config.validate().is_ok());
        prop_assert_eq!(config.num_workers, workers);
    }

    /// Test that WorkerPoolConfig with custom thread name prefix works
    #[test]
    fn test_config_thread_name_prefix(
        workers in 1usize..8,
        prefix in "[a-z]{3,10}"
    ) {
        let config = WorkerPoolConfig::new(workers)
            .with_thread_name_prefix(&prefix);

        prop_assert_eq!(config.thread_name_prefix, prefix);
    }
}

// ============================================================================
// Result Delivery Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every submitted job produces exactly its own value
    #[test]
    fn test_results_multiset(
        workers in 1usize..6,
        values in prop::collection::vec(any::<i64>(), 1..40)
    ) {
        let pool = WorkerPool::new(workers).unwrap();

        let handles: Vec<_> = values
            .iter()
            .map(|&v| pool.add(move || v).unwrap())
            .collect();

        let mut received: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.cast::<i64>())
            .collect::<Result<_>>()
            .unwrap();
        pool.shutdown().unwrap();

        let mut expected = values.clone();
        expected.sort_unstable();
        received.sort_unstable();
        prop_assert_eq!(received, expected);
    }

    /// No job is ever run twice
    #[test]
    fn test_no_double_claim(workers in 1usize..8, job_count in 1usize..60) {
        let pool = WorkerPool::new(workers).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..job_count)
            .map(|_| {
                let runs = Arc::clone(&runs);
                pool.add(move || {
                    runs.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap()
            })
            .collect();

        let ids: HashSet<JobId> = handles.iter().map(|h| h.job_id()).collect();
        prop_assert_eq!(ids.len(), job_count);

        for handle in handles {
            prop_assert!(handle.recv().is_some());
        }
        pool.shutdown().unwrap();

        prop_assert_eq!(runs.load(Ordering::SeqCst), job_count);
        prop_assert_eq!(pool.total_jobs_executed(), job_count as u64);
    }

    /// At most `num_workers` jobs are ever executing at once
    #[test]
    fn test_bounded_concurrency(workers in 1usize..5, job_count in 1usize..30) {
        let pool = WorkerPool::new(workers).unwrap();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..job_count)
            .map(|_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                pool.add(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(1));
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .unwrap()
            })
            .collect();

        for handle in handles {
            handle.recv();
        }
        pool.shutdown().unwrap();

        prop_assert!(peak.load(Ordering::SeqCst) <= workers,
                     "{} jobs ran at once on {} workers",
                     peak.load(Ordering::SeqCst), workers);
    }
}

// ============================================================================
// Panic Isolation Tests (Reliability)
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Test that worker threads survive job panics
    #[test]
    fn test_panic_isolation(
        panic_count in 1usize..10,
        success_count in 1usize..10
    ) {
        let pool = WorkerPool::new(2).unwrap();

        let panicked: Vec<_> = (0..panic_count)
            .map(|_| pool.add(|| -> u8 { panic!("Intentional panic for testing") }).unwrap())
            .collect();
        let succeeded: Vec<_> = (0..success_count)
            .map(|i| pool.add(move || i).unwrap())
            .collect();

        for handle in panicked {
            let outcome = handle.recv().unwrap();
            prop_assert!(matches!(outcome, Err(ThreadError::JobPanicked { .. })), "expected JobPanicked");
        }
        for handle in succeeded {
            prop_assert!(handle.cast::<usize>().next().unwrap().is_ok());
        }
        pool.shutdown().unwrap();

        prop_assert_eq!(pool.total_jobs_panicked(), panic_count as u64);
    }
}

// ============================================================================
// Safety Tests (No Panics, No Hangs)
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Shutdown with abandoned handles always completes
    #[test]
    fn test_shutdown_with_abandoned_handles(workers in 1usize..8, job_count in 0usize..20) {
        let pool = WorkerPool::new(workers).unwrap();

        for i in 0..job_count {
            drop(pool.add(move || i).unwrap());
        }

        let result = pool.shutdown();
        prop_assert!(result.is_ok(), "Shutdown failed: {:?}", result);
        prop_assert_eq!(pool.live_workers(), 0);
    }

    /// Closing twice is reported, never a crash
    #[test]
    fn test_double_close_safe(workers in 1usize..4) {
        let pool = WorkerPool::new(workers).unwrap();

        prop_assert!(pool.close().is_ok());
        prop_assert!(matches!(pool.close(), Err(ThreadError::AlreadyClosed)));
        prop_assert!(pool.shutdown().is_ok());
    }

    /// Every submission after close is rejected
    #[test]
    fn test_submit_to_closed_pool(workers in 1usize..4, attempts in 1usize..10) {
        let pool = WorkerPool::new(workers).unwrap();
        pool.close().unwrap();

        for i in 0..attempts {
            prop_assert!(matches!(pool.add(move || i), Err(ThreadError::PoolClosed)));
        }
        prop_assert_eq!(pool.total_jobs_submitted(), 0);
    }
}
