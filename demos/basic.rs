//! Basic logging example.
//!
//! This example starts a logger in development mode so every record is
//! mirrored to the console in color, then shuts it down cleanly.

use rotalog::Level;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logger = rotalog::builder()
        .with_path("storage/logs/basic")
        .with_level(Level::Debug)
        .with_dev(true)
        .init()?;

    rotalog::debug!(logger, "This is a debug message");
    rotalog::info!(logger, "Server started on port {}", 8080);
    rotalog::warn!(logger, "This is a warning message");
    rotalog::error!(logger, "This is an error message");

    logger.shutdown()?;
    Ok(())
}
