use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counter value given to a session on first sighting.
pub const BASE_COUNTER: i64 = 0;

/// Persisted admission state of one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Client network address; unique across the store.
    pub client_key: String,
    pub last_seen: DateTime<Utc>,
    pub sequence_counter: i64,
}

/// Format of `cntime` as written to the store, valid as a SQL `DATETIME`
/// literal.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders `at` for the `cntime` column.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a stored `cntime` value.
///
/// Accepts the `YYYY-MM-DD HH:MM:SS` text of a `DATETIME` column and
/// RFC3339. Zero dates and garbage yield `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
