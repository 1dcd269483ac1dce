use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use csv_worker_pool::bankstatement::parse_csv;
use csv_worker_pool::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn benchmark_worker_pool_creation(c: &mut Criterion) {
    c.bench_function("worker_pool_creation", |b| {
        b.iter(|| {
            let pool = WorkerPool::new(4).expect("Failed to create pool");
            pool.shutdown().expect("Failed to shutdown pool");
        });
    });
}

fn benchmark_job_submission(c: &mut Criterion) {
    let mut group = c.benchmark_group("job_submission");

    // Lightweight jobs, results read back
    group.bench_function("lightweight_jobs_100", |b| {
        b.iter_batched(
            || WorkerPool::new(4).expect("Failed to create pool"),
            |pool| {
                let handles: Vec<_> = (0..100u64)
                    .map(|i| pool.add(move || black_box(i + 1)).expect("Failed to submit job"))
                    .collect();
                for handle in handles {
                    black_box(handle.cast::<u64>().next());
                }
                pool.shutdown().expect("Failed to shutdown pool");
            },
            BatchSize::SmallInput,
        );
    });

    // Medium workload, results abandoned
    group.bench_function("medium_jobs_100_abandoned", |b| {
        b.iter_batched(
            || WorkerPool::new(4).expect("Failed to create pool"),
            |pool| {
                for _ in 0..100 {
                    let handle = pool
                        .add(|| {
                            // Simulate some work
                            let mut sum = 0u64;
                            for i in 0..1000 {
                                sum = sum.wrapping_add(i);
                            }
                            black_box(sum)
                        })
                        .expect("Failed to submit job");
                    drop(handle);
                }
                pool.shutdown().expect("Failed to shutdown pool");
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_concurrent_submission(c: &mut Criterion) {
    c.bench_function("concurrent_submission_4_threads", |b| {
        b.iter_batched(
            || Arc::new(WorkerPool::new(4).expect("Failed to create pool")),
            |pool| {
                let submitters: Vec<_> = (0..4)
                    .map(|_| {
                        let pool = Arc::clone(&pool);
                        std::thread::spawn(move || {
                            for _ in 0..25 {
                                pool.add(|| ()).expect("Failed to submit job");
                            }
                        })
                    })
                    .collect();

                for submitter in submitters {
                    submitter.join().expect("Thread panicked");
                }

                pool.shutdown().expect("Failed to shutdown pool");
            },
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("tasks_per_second", |b| {
        b.iter_batched(
            || {
                let pool = WorkerPool::new(8).expect("Failed to create pool");
                let counter = Arc::new(AtomicU64::new(0));
                (pool, counter)
            },
            |(pool, counter)| {
                // Submit 1000 tasks
                let handles: Vec<_> = (0..1000)
                    .map(|_| {
                        let counter = Arc::clone(&counter);
                        pool.add(move || counter.fetch_add(1, Ordering::Relaxed))
                            .expect("Failed to submit job")
                    })
                    .collect();

                for handle in handles {
                    handle.recv();
                }
                pool.shutdown().expect("Failed to shutdown pool");

                // Verify all tasks completed
                let total = counter.load(Ordering::Relaxed);
                assert_eq!(total, 1000, "Not all tasks completed");
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_statement_parsing(c: &mut Criterion) {
    let mut text = String::from("timestamp,name,type,amount,status,description");
    for i in 0..500 {
        text.push_str(&format!(
            "\n{},MERCHANT {},DEBIT,{}.25,SUCCESS,purchase {}",
            1624500000 + i,
            i,
            i * 10,
            i
        ));
    }
    let text = Arc::new(text);

    c.bench_function("statements_8_files_on_3_workers", |b| {
        b.iter_batched(
            || WorkerPool::new(3).expect("Failed to create pool"),
            |pool| {
                let handles: Vec<_> = (0..8)
                    .map(|_| {
                        let text = Arc::clone(&text);
                        pool.add(move || parse_csv(text.as_bytes()))
                            .expect("Failed to submit job")
                    })
                    .collect();
                for handle in handles {
                    black_box(handle.recv());
                }
                pool.shutdown().expect("Failed to shutdown pool");
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    benchmark_worker_pool_creation,
    benchmark_job_submission,
    benchmark_concurrent_submission,
    benchmark_throughput,
    benchmark_statement_parsing
);
criterion_main!(benches);
