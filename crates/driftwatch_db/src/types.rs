//! Ledger record types.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// Timestamp format persisted in the ledger tables.
///
/// Sorts lexicographically in chronological order, so `ORDER BY date` on the
/// TEXT column is a chronological sort.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the `ingested_files` ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestedFileRecord {
    pub recorded_at: DateTime<Utc>,
    /// Basename only, no directory component.
    pub file: String,
}

impl IngestedFileRecord {
    pub fn new(recorded_at: DateTime<Utc>, file: impl Into<String>) -> Self {
        Self {
            recorded_at,
            file: file.into(),
        }
    }
}

/// One row of the `model_score` ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub recorded_at: DateTime<Utc>,
    /// F1-style metric in [0, 1].
    pub score: f64,
}

impl ScoreRecord {
    pub fn new(recorded_at: DateTime<Utc>, score: f64) -> Self {
        Self { recorded_at, score }
    }
}

/// Format a timestamp the way the ledger tables store it.
pub fn format_date(ts: &DateTime<Utc>) -> String {
    ts.format(DATE_FORMAT).to_string()
}

/// Parse a ledger timestamp.
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(NaiveDateTime::parse_from_str(raw, DATE_FORMAT)?.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_round_trip() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 7, 14, 30, 5).unwrap();
        let raw = format_date(&ts);
        assert_eq!(raw, "2026-08-07 14:30:05");
        assert_eq!(parse_date(&raw).unwrap(), ts);
    }

    #[test]
    fn format_sorts_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2026, 8, 7, 9, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap();
        assert!(format_date(&earlier) < format_date(&later));
    }
}
