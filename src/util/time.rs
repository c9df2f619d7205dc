use chrono::Utc;

/// Milliseconds since epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
