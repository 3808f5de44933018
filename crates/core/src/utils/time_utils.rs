use chrono::{DateTime, TimeZone, Utc};

/// Current time as epoch milliseconds, the unit every JS payload uses.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Converts epoch milliseconds back to a UTC instant.
///
/// Returns `None` for values outside chrono's representable range.
pub fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
