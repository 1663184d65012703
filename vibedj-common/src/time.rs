//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current Unix epoch time in milliseconds, as carried in authenticated requests
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
