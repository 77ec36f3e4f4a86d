//! Lenient timestamp parsing for the formats seen in session logs.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a log timestamp into a `DateTime<Utc>`.
///
/// Accepts RFC 3339 (with `Z` or an explicit offset) and naive datetimes with
/// either `T` or a space separating date and time, which are assumed UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let normalized = if raw.ends_with('Z') {
        raw.replace('Z', "+00:00")
    } else {
        raw.to_string()
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }

    anyhow::bail!("unrecognized timestamp: {}", raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_z_suffix() {
        let dt = parse_timestamp("2025-06-01T12:30:00.500Z").unwrap();
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn parses_explicit_offset() {
        let dt = parse_timestamp("2025-06-01T14:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn parses_naive_as_utc() {
        assert!(parse_timestamp("2025-06-01T12:30:00").is_ok());
        assert!(parse_timestamp("2025-06-01 12:30:00").is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("not a time").is_err());
    }
}
