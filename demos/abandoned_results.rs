//! Abandoned results and shutdown example
//!
//! Submits jobs whose handles are never read, closes the pool while a job
//! is still running, and shows that every worker still exits.
//!
//! Run with: cargo run --example abandoned_results

use csv_worker_pool::prelude::*;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    println!("=== CSV Worker Pool - Abandoned Results Example ===\n");

    let config = WorkerPoolConfig::new(2)
        .with_thread_name_prefix("demo")
        .with_event_sink(Arc::new(WriterSink::new(io::stdout())));
    let pool = WorkerPool::with_config(config)?;

    println!("1. Submitting jobs nobody will read:");
    for i in 0..4 {
        drop(pool.add(move || i)?);
    }

    println!("\n2. Submitting a slow job and closing while it runs:");
    let slow = pool.add(|| {
        thread::sleep(Duration::from_millis(200));
        "slow job finished"
    })?;

    let start = Instant::now();
    pool.close()?;
    println!("   close() returned after {:?}", start.elapsed());

    println!("\n3. Submitting after close:");
    match pool.add(|| 0) {
        Err(e) => println!("   Rejected: {}", e),
        Ok(_) => println!("   Unexpectedly accepted"),
    }

    println!("\n4. Closing twice:");
    if let Err(e) = pool.close() {
        println!("   {}", e);
    }

    println!("\n5. Waiting for workers:");
    pool.shutdown()?;
    match slow.cast::<&str>().next() {
        Some(result) => println!("   Slow job result: {}", result?),
        None => println!("   Slow job result was dropped by shutdown"),
    }

    let stats = pool.stats();
    println!(
        "   delivered: {}, abandoned: {}, discarded: {}",
        stats.results_delivered, stats.results_abandoned, stats.jobs_discarded
    );

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
