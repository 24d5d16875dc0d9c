// src/utils.rs - Time and identifier helpers shared across the stores

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};

/// Wall-clock helpers
pub struct Time;

impl Time {
    /// Get current UTC time
    pub fn now() -> DateTime<Utc> {
        Utc::now()
    }

    /// Get current timestamp as milliseconds since epoch
    pub fn now_millis() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Create a DateTime from milliseconds since epoch
    pub fn from_millis(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Current time as an ISO-8601 string with millisecond precision
    pub fn iso_now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Issues timestamp-derived identifiers that stay unique and strictly
/// increasing even when several are requested within one millisecond.
#[derive(Debug)]
pub struct IdSource {
    last: AtomicI64,
}

impl IdSource {
    pub fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Next identifier: the current epoch-millisecond value, bumped past the
    /// previously issued id when the clock has not advanced.
    pub fn next(&self) -> i64 {
        let now = Time::now_millis();
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(if now > last { now } else { last + 1 })
            })
            .unwrap_or(0);
        if now > prev {
            now
        } else {
            prev + 1
        }
    }
}

impl Default for IdSource {
    fn default() -> Self {
        Self::new()
    }
}
