//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (chrono reads the JS clock on wasm32)
//! - Storage (see `persistence`)

use std::cell::Cell;

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Source of the current instant
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }

    /// `2026-10-16T08:30:00.000Z`, the format page scripts expect
    fn now_iso(&self) -> String {
        iso8601(self.now())
    }
}

/// Format an instant the way `Date.prototype.toISOString` does
pub fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    at: Cell<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at: Cell::new(at) }
    }

    /// Clock at the given epoch milliseconds (falls back to the epoch if out of range)
    pub fn from_millis(millis: i64) -> Self {
        Self::new(DateTime::from_timestamp_millis(millis).unwrap_or_default())
    }

    pub fn advance(&self, by: Duration) {
        self.at.set(self.at.get() + by);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.at.set(at);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at.get()
    }
}

/// Millisecond id from `clock`, bumped past every id in `taken`.
///
/// Two records created in the same millisecond still get distinct ids.
pub fn unique_millis(clock: &dyn Clock, taken: impl IntoIterator<Item = i64>) -> i64 {
    let now = clock.now_millis();
    match taken.into_iter().max() {
        Some(max) if max >= now => max + 1,
        _ => now,
    }
}
