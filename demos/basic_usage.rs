//! Basic runtime usage example
//!
//! Demonstrates console output, per-level filtering and attaching errors.
//!
//! Run with: cargo run --example basic_usage

use rust_log_runtime::prelude::*;
use rust_log_runtime::{debug, error, info, trace, warn};

fn main() {
    println!("=== Rust Log Runtime - Basic Usage Example ===\n");

    let runtime = LoggingRuntime::builder()
        .standard_services()
        .set("level", "debug")
        .set("writer", "console")
        .set("writer.colors", "true")
        .set("writer.format", "{date:%H:%M:%S%.3f} [{thread}] {level}: {message}")
        .build();
    runtime.start_up();

    trace!(runtime, "Not shown, below the configured level");
    debug!(runtime, "Loaded {} settings", 12);
    info!(runtime, "Application started");
    warn!(runtime, "Cache is {}% full", 85);

    let failure = "eighty".parse::<u16>().unwrap_err();
    error!(runtime, error = &failure, "Invalid port '{}'", "eighty");

    runtime.shut_down();

    println!("\n=== Example completed successfully! ===");
}
