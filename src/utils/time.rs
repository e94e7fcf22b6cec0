use chrono::{DateTime, Utc};

/// Unix seconds, used for session expiry
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Human-readable UTC timestamp for pages
pub fn format_utc(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Whole days left until `end`, never negative
pub fn days_remaining(end: &DateTime<Utc>, now: &DateTime<Utc>) -> i64 {
    (*end - *now).num_days().max(0)
}
