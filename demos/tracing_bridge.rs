//! Forward `tracing` events into the log file.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logger = rotalog::builder()
        .with_path("storage/logs/bridge")
        .with_dev(true)
        .init()?;
    rotalog::init_tracing(&logger)?;

    tracing::info!("This is an info message");
    tracing::warn!(error_code = 404, path = "/api/users", "Resource not found");

    logger.shutdown()?;
    Ok(())
}
