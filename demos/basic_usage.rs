//! Basic worker pool usage example
//!
//! Demonstrates pool creation, job submission, typed result collection and
//! statistics tracking.
//!
//! Run with: cargo run --example basic_usage

use csv_worker_pool::prelude::*;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== CSV Worker Pool - Basic Usage Example ===\n");

    // Create a pool with 3 workers
    let pool = WorkerPool::new(3)?;
    println!("1. Started worker pool with {} workers", pool.num_workers());

    println!("\n2. Submitting jobs:");
    let mut handles = Vec::new();
    for i in 0..10 {
        let handle = pool.add(move || {
            thread::sleep(Duration::from_millis(20));
            println!(
                "  Job {} executing on {:?}",
                i,
                thread::current().name().unwrap_or("unnamed")
            );
            i * 2
        })?;
        handles.push(handle);
    }
    println!("   Submitted 10 jobs");

    println!("\n3. Collecting results:");
    let mut doubled = Vec::new();
    for handle in handles {
        for value in handle.cast::<i32>() {
            doubled.push(value?);
        }
    }
    doubled.sort_unstable();
    println!("   {:?}", doubled);

    println!("\n4. Mixed result types:");
    let text = pool.add(|| String::from("a statement"))?;
    match text.cast::<u64>().next() {
        Some(Err(e)) => println!("   Asked for the wrong type: {}", e),
        other => println!("   Unexpected: {:?}", other),
    }

    println!("\n5. Per-worker statistics:");
    let stats = pool.get_stats();
    for (i, stat) in stats.iter().enumerate() {
        println!(
            "   Worker {}: {} executed, {} panicked, avg time: {:.2}μs",
            i,
            stat.get_jobs_executed(),
            stat.get_jobs_panicked(),
            stat.get_average_processing_time_us()
        );
    }

    // Graceful shutdown
    println!("\n6. Shutting down worker pool...");
    pool.shutdown()?;
    println!("   Total jobs submitted: {}", pool.total_jobs_submitted());
    println!("   Total jobs executed: {}", pool.total_jobs_executed());

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
