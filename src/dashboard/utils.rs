// ========================================
// DASHBOARD UTILS
// ========================================

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;

/// Serializes a UTC instant as RFC 3339 with microseconds and a `Z` suffix,
/// e.g. `2024-05-01T12:30:00.123456Z`.
pub fn iso_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}
