// Utility functions for ad-ranking-service

use chrono::{DateTime, Utc};

pub const MILLIS_PER_HOUR: f64 = 60.0 * 60.0 * 1000.0;
pub const MILLIS_PER_DAY: f64 = 24.0 * MILLIS_PER_HOUR;

/// Source of "now" for timestamps and recency terms
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn from_millis(millis: i64) -> Self {
        Self(DateTime::from_timestamp_millis(millis).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Age of an epoch-millisecond timestamp in days. Negative for timestamps
/// ahead of `now`.
pub fn age_in_days(now: DateTime<Utc>, timestamp_ms: i64) -> f64 {
    age_in_millis(now, timestamp_ms) / MILLIS_PER_DAY
}

/// Age of an epoch-millisecond timestamp in hours.
pub fn age_in_hours(now: DateTime<Utc>, timestamp_ms: i64) -> f64 {
    age_in_millis(now, timestamp_ms) / MILLIS_PER_HOUR
}

// Stored timestamps can hold any i64, so subtract in f64
fn age_in_millis(now: DateTime<Utc>, timestamp_ms: i64) -> f64 {
    now.timestamp_millis() as f64 - timestamp_ms as f64
}

/// Exponential decay `e^(-age / time_constant)`, never reaches 0
pub fn exponential_decay(age: f64, time_constant: f64) -> f64 {
    (-age / time_constant).exp()
}
