//! Logging initialization for the CLI.
//!
//! Command output goes to stdout as JSON, so logs never share it: verbose runs
//! print to stderr, everything else appends to the log file.

use rvsn_util::log::{default_log_path, init, LogConfig, LogLevel, LogTarget};
use std::path::PathBuf;

/// Initialize logging. `level` comes from the project configuration and is
/// ignored when `verbose` is set. Returns the log file path if logging to file.
pub fn init_logging(verbose: bool, level: Option<&str>) -> Option<PathBuf> {
    if verbose {
        return init(LogConfig {
            level: LogLevel::Debug,
            target: LogTarget::Stderr,
            include_location: true,
        });
    }

    let level = match level.map(str::parse::<LogLevel>) {
        Some(Ok(level)) => level,
        Some(Err(e)) => {
            eprintln!("Warning: {e}, using info");
            LogLevel::Info
        }
        None => LogLevel::Info,
    };

    init(LogConfig {
        level,
        target: default_log_path().map_or(LogTarget::Off, LogTarget::File),
        include_location: false,
    })
}
