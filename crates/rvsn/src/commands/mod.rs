//! Command handlers for the rvsn CLI.

pub mod history;
pub mod logging;
pub mod tree;

pub use history::*;
pub use logging::*;
pub use tree::*;

use serde::Serialize;

/// Print a command result as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
