//! Shared utilities for rvsn.
//!
//! This crate provides common utilities used across the rvsn workspace:
//! - Commit identifier generation
//! - Content hashing
//! - Logging setup with tracing
//! - Project item id (slash separated path) helpers
//! - RAII-based timing for operation measurement

pub mod hash;
pub mod id;
pub mod log;
pub mod path;
pub mod timing;

pub use hash::content_hash;
pub use id::commit_id;
pub use timing::TimingGuard;
