//! File logging example
//!
//! Demonstrates two file writers with different levels behind the writing
//! thread, and a lifecycle hook.
//!
//! Run with: cargo run --example file_logging

use rust_log_runtime::prelude::*;
use std::sync::Arc;
use std::thread;

struct Banner;

impl Hook for Banner {
    fn start_up(&self) -> Result<()> {
        println!("   logging started");
        Ok(())
    }

    fn shut_down(&self) -> Result<()> {
        println!("   logging stopped");
        Ok(())
    }
}

fn main() {
    println!("=== Rust Log Runtime - File Logging Example ===\n");

    let runtime = Arc::new(
        LoggingRuntime::builder()
            .standard_services()
            .hook(Arc::new(Banner))
            .set("writingthread", "true")
            .set("writer1", "file")
            .set("writer1.file", "app.log")
            .set("writer1.buffered", "true")
            .set("writer1.format", "{date} {level} [{thread}] {message}")
            .set("writer2", "file")
            .set("writer2.file", "errors.log")
            .set("writer2.level", "error")
            .set("writer2.exception", "strip: std")
            .build(),
    );
    runtime.start_up();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let runtime = Arc::clone(&runtime);
            thread::Builder::new()
                .name(format!("worker-{}", worker))
                .spawn(move || {
                    for job in 0..25 {
                        runtime.info(format!("Job {} done", job));
                    }
                    runtime.error(format!("Worker {} ran out of jobs", worker));
                })
        })
        .collect();

    for handle in handles.into_iter().flatten() {
        let _ = handle.join();
    }

    runtime.shut_down();

    println!("\n=== Example completed successfully! ===");
    println!("Check 'app.log' and 'errors.log' for file output");
}
