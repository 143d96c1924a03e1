//! Rotation example.
//!
//! Writes enough records to roll over several files with both strategies and
//! prints the resulting layout.

use rotalog::{LogConfig, Logger, RotationStrategy};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;

    // Indexed: app.1.log, app.2.log, ... with 25 lines each.
    let indexed = Logger::init(
        &LogConfig::new()
            .with_path(temp_dir.path().join("indexed").join("app.log"))
            .with_strategy(RotationStrategy::Indexed)
            .with_max_lines(25),
    )?;

    // Archive: app.log plus archive/1.log, archive/2.log, ... at roughly 1KB each.
    let archive = Logger::init(
        &LogConfig::new()
            .with_path(temp_dir.path().join("archive").join("app.log"))
            .with_strategy(RotationStrategy::Archive)
            .with_max_file_size(1024),
    )?;

    for i in 0..100 {
        rotalog::info!(indexed, "Log message number {}", i);
        rotalog::info!(archive, "Log message number {}", i);
        if i % 10 == 0 {
            // Let the periodic flush run so size rotation sees several batches.
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }

    indexed.shutdown()?;
    archive.shutdown()?;

    for dir in ["indexed", "archive", "archive/archive"] {
        let mut names: Vec<_> = std::fs::read_dir(temp_dir.path().join(dir))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        println!("{}: {:?}", dir, names);
    }

    println!("indexed stats: {:?}", indexed.stats());
    println!("archive stats: {:?}", archive.stats());
    Ok(())
}
