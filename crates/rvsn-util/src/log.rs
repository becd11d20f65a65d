//! Logging setup using tracing.
//!
//! Events from the rvsn crates are filtered by one configured level; events
//! from dependencies only pass at warn and above. `RUST_LOG` replaces the
//! whole filter when set.

use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::{fmt as tracing_fmt, prelude::*, EnvFilter};

/// Crates whose events follow the configured level.
const CRATES: &[&str] = &["rvsn", "rvsn_core", "rvsn_storage", "rvsn_diff", "rvsn_util"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Filter directive applying this level to the rvsn crates.
    pub fn directive(&self) -> String {
        let mut parts = vec!["warn".to_string()];
        parts.extend(CRATES.iter().map(|c| format!("{c}={}", self.as_str())));
        parts.join(",")
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where log events go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// Discard events; spans still work.
    #[default]
    Off,
    Stderr,
    /// Append to a file, creating its directory.
    File(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub target: LogTarget,
    /// Include source file and line in events.
    pub include_location: bool,
}

/// Initialize logging. Call once at startup.
///
/// Returns the log file written to. A file that cannot be opened is reported
/// on stderr and logging falls back to [`LogTarget::Off`].
pub fn init(config: LogConfig) -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.directive()));
    let registry = tracing_subscriber::registry().with(filter);
    let location = config.include_location;

    match config.target {
        LogTarget::Off => {
            registry.init();
            None
        }
        LogTarget::Stderr => {
            let layer = tracing_fmt::layer()
                .with_writer(std::io::stderr)
                .with_file(location)
                .with_line_number(location);
            registry.with(layer).init();
            None
        }
        LogTarget::File(path) => match open_log_file(&path) {
            Ok(file) => {
                let layer = tracing_fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_file(location)
                    .with_line_number(location);
                registry.with(layer).init();
                Some(path)
            }
            Err(e) => {
                eprintln!("Warning: Could not open log file {}: {e}", path.display());
                registry.init();
                None
            }
        },
    }
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Default log file: `<local data dir>/rvsn/logs/rvsn.log`.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("rvsn").join("logs").join("rvsn.log"))
}
