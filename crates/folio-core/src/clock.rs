//! Injectable time source.
//!
//! Session expiry, version stamps and change-feed events all read the time
//! through [`Clock`] so tests can pin and advance it.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Clock abstraction for injectable time source.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock implementation (production use).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock clock for tests.
///
/// Shared behind an `Arc` with the component under test, so advancing goes
/// through interior mutability.
#[derive(Debug)]
pub struct MockClock {
    current_time: Mutex<DateTime<Utc>>,
}

impl MockClock {
    /// Create a new mock clock at the specified time.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            current_time: Mutex::new(time),
        }
    }

    /// Create a mock clock at a fixed test time (2026-01-15 12:00:00 UTC).
    pub fn fixed() -> Self {
        let time = DateTime::parse_from_rfc3339("2026-01-15T12:00:00Z")
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        Self::new(time)
    }

    /// Advance the clock by the specified duration.
    pub fn advance(&self, duration: Duration) {
        let mut current = self
            .current_time
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current += duration;
    }

    /// Jump to an absolute time (may move backwards).
    pub fn set(&self, time: DateTime<Utc>) {
        let mut current = self
            .current_time
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = time;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self
            .current_time
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
