//! Timestamp encoding for stored columns.
//!
//! All timestamps are stored as RFC 3339 UTC text with fixed microsecond
//! precision, so comparing the text in SQL orders rows chronologically.

use chrono::{DateTime, Datelike, SecondsFormat, SubsecRound, Utc};
use tokio_rusqlite::rusqlite::{self, Row, types::Type};

/// Encode a timestamp for storage, e.g. `2024-05-01T18:30:00.000000Z`.
pub fn encode(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Whether `ts` fits the four-digit year of the stored format.
pub fn is_storable(ts: DateTime<Utc>) -> bool {
    (0..=9999).contains(&ts.year())
}

/// Decode a stored timestamp.
pub fn decode(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}

/// Drop precision below what the store keeps.
pub fn truncate(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

/// Read a timestamp column, reporting unparseable text as a conversion failure.
pub(crate) fn column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    decode(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
