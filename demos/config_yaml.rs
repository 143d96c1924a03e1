//! Example of loading logger configuration from a YAML file.
//!
//! Run with:
//! ```bash
//! cargo run --example config_yaml
//! ```

use std::collections::HashMap;
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = "demos/config.yaml";
    let config_content = fs::read_to_string(config_path)
        .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));

    let root: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(&config_content)?;
    let config: rotalog::LogConfig = serde_yaml::from_value(root["log"].clone())?;

    let logger = rotalog::Logger::init(&config)?;

    rotalog::debug!(logger, "This is a debug message (filtered at info)");
    rotalog::info!(logger, "This is an info message");
    rotalog::warn!(logger, "This is a warning message");
    rotalog::error!(logger, "This is an error message");

    logger.shutdown()?;
    println!("{:?}", logger.stats());
    Ok(())
}
