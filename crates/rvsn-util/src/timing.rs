//! Duration logging for long-running repository operations.
//!
//! ```rust,ignore
//! let _timing = TimingGuard::repository("commit");
//! // ... work; the duration is logged when the guard drops ...
//! ```

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Operations at least this slow are logged at info.
const NOTICEABLE: Duration = Duration::from_millis(250);

/// Operations at least this slow are logged as a warning.
const SLOW: Duration = Duration::from_secs(10);

/// Logs how long it lived when dropped.
pub struct TimingGuard {
    scope: &'static str,
    operation: String,
    start: Instant,
    noticeable: Duration,
    slow: Duration,
}

impl TimingGuard {
    pub fn new(scope: &'static str, operation: impl Into<String>) -> Self {
        Self {
            scope,
            operation: operation.into(),
            start: Instant::now(),
            noticeable: NOTICEABLE,
            slow: SLOW,
        }
    }

    /// Guard for an operation of the repository handle.
    pub fn repository(operation: impl Into<String>) -> Self {
        Self::new("repository", operation)
    }

    /// Override the info and warn thresholds.
    pub fn with_thresholds(mut self, noticeable: Duration, slow: Duration) -> Self {
        self.noticeable = noticeable;
        self.slow = slow;
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let ms = elapsed.as_millis() as u64;

        if elapsed >= self.slow {
            warn!(scope = self.scope, operation = %self.operation, ms, "Slow operation");
        } else if elapsed >= self.noticeable {
            info!(scope = self.scope, operation = %self.operation, ms, "Operation finished");
        } else {
            debug!(scope = self.scope, operation = %self.operation, ms, "Operation finished");
        }
    }
}
