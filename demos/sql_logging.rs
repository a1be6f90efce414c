//! SQL logging example
//!
//! Demonstrates the batched JDBC writer on a SQLite database.
//!
//! Run with: cargo run --example sql_logging

use rust_log_runtime::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("=== Rust Log Runtime - SQL Logging Example ===\n");

    let database = "log.db";
    let connection = rusqlite::Connection::open(database)?;
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS LOG (
            created TEXT NOT NULL,
            level TEXT NOT NULL,
            thread TEXT,
            message TEXT,
            exception TEXT
        )",
    )?;

    let runtime = LoggingRuntime::builder()
        .standard_services()
        .set("writer", "jdbc")
        .set("writer.url", format!("jdbc:sqlite:{}", database))
        .set("writer.table", "LOG")
        .set("writer.fields", "date, level, thread, message, exception")
        .set("writer.batch", "true")
        .build();
    runtime.start_up();

    for order in 0..200 {
        runtime.info(format!("Order {} shipped", order));
    }
    let failure = std::io::Error::new(std::io::ErrorKind::TimedOut, "carrier API timed out");
    runtime.log_error(LogLevel::Error, "Tracking update failed", &failure);

    runtime.shut_down();

    let rows: i64 = connection.query_row("SELECT COUNT(*) FROM LOG", [], |row| row.get(0))?;
    println!("   {} rows in '{}'", rows, database);

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
