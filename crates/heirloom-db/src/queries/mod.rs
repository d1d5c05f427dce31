//! Database query modules.
//!
//! - submissions: Catalog rows (insert, list, get, partial update, photo replacement)
//! - superseded_files: Ledger of files replaced during edits

pub mod submissions;
pub mod superseded_files;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Format a timestamp the way the catalog stores it (RFC 3339, UTC).
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 with any offset. Rows written without an offset are
/// taken to be UTC.
pub(crate) fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_format_timestamp_is_utc_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 18, 30, 5).unwrap();
        assert_eq!(format_timestamp(ts), "2024-06-01T18:30:05.000000+00:00");
    }

    #[test]
    fn test_parse_timestamp_with_offset() {
        let ts = parse_timestamp(0, "2024-06-01T13:30:05.123456-05:00").unwrap();
        assert_eq!(ts.hour(), 18);
        assert_eq!(ts.day(), 1);
    }

    #[test]
    fn test_parse_timestamp_naive_is_utc() {
        let ts = parse_timestamp(0, "2024-06-01T18:30:05").unwrap();
        assert_eq!(ts.hour(), 18);

        let ts = parse_timestamp(0, "2024-06-01 18:30:05").unwrap();
        assert_eq!(ts.minute(), 30);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp(6, "yesterday").is_err());
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let now = Utc::now();
        let parsed = parse_timestamp(0, &format_timestamp(now)).unwrap();
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }
}
