//! Record filtering: the time-window grammar and the project-name filter.
//!
//! Time filters are a single string argument covering everything from
//! `7d` to `2025-01-01T09:30,2025-01-02T18:45`. The grammar arms are tried in
//! a fixed priority order and the first one that matches wins; a string that
//! matches none of them is a user-input error, never silently defaulted.

use crate::models::UsageRecord;
use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, Utc};

static MONTH_NAMES: &[(&str, u32)] = &[
    ("january", 1),
    ("jan", 1),
    ("february", 2),
    ("feb", 2),
    ("march", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("june", 6),
    ("jun", 6),
    ("july", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sep", 9),
    ("october", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

/// An inclusive `[start, end]` window of instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeFilter {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeFilter {
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_at(input, Utc::now())
    }

    /// Parse against an explicit "now", which anchors relative durations and
    /// the current-year month ranges.
    pub fn parse_at(input: &str, now: DateTime<Utc>) -> Result<Self> {
        let trimmed = input.trim();

        let parsed = parse_relative(trimmed, now)
            .or_else(|| parse_month_span(trimmed, now))
            .or_else(|| parse_cross_year_span(trimmed))
            .or_else(|| parse_date_span(trimmed))
            .or_else(|| parse_datetime_span(trimmed));

        parsed.ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid time filter: '{}'. Valid formats: relative durations (30min, 12h, 7d, \
                 3m, 1y), month ranges (4-6, apr-jun, january-march), cross-year ranges \
                 (2024-11-2025-2), date ranges (2025-01-01,2025-01-31), and date-time ranges \
                 (2025-01-01T09,2025-01-02T17 or 2025-01-01T09:30:00,2025-01-02T18:45:30, \
                 with 'T' or a space before the time)",
                input
            )
        })
    }

    /// Both edges are inclusive.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// `<N><unit>` where unit is min/h/d/m/y; window is the last N units up to now.
fn parse_relative(s: &str, now: DateTime<Utc>) -> Option<TimeFilter> {
    // "min" before "m": "30min" must not parse as months of "30mi".
    for suffix in ["min", "h", "d", "m", "y"] {
        let Some(digits) = s.strip_suffix(suffix) else {
            continue;
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let n: u32 = digits.parse().ok()?;
        let start = match suffix {
            "min" => now - Duration::minutes(n as i64),
            "h" => now - Duration::hours(n as i64),
            "d" => now - Duration::days(n as i64),
            "m" => now.checked_sub_months(Months::new(n))?,
            _ => now.checked_sub_months(Months::new(n.checked_mul(12)?))?,
        };
        return Some(TimeFilter { start, end: now });
    }
    None
}

/// `MM-MM` or `apr-jun` within the current year.
fn parse_month_span(s: &str, now: DateTime<Utc>) -> Option<TimeFilter> {
    let (first, second) = s.split_once('-')?;
    if second.contains('-') {
        return None;
    }
    // Both ends must use the same form; "apr-6" is a typo, not a range.
    let numeric = |t: &str| t.bytes().all(|b| b.is_ascii_digit());
    if numeric(first) != numeric(second) {
        return None;
    }
    let start_month = parse_month_token(first)?;
    let end_month = parse_month_token(second)?;
    span_of_months(now.year(), start_month, now.year(), end_month)
}

/// `YYYY-M-YYYY-M`, months may be one or two digits.
fn parse_cross_year_span(s: &str) -> Option<TimeFilter> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 4 || parts[0].len() != 4 || parts[2].len() != 4 {
        return None;
    }
    let start_year: i32 = parse_number(parts[0])?;
    let start_month = numeric_month(parts[1])?;
    let end_year: i32 = parse_number(parts[2])?;
    let end_month = numeric_month(parts[3])?;
    span_of_months(start_year, start_month, end_year, end_month)
}

/// `YYYY-MM-DD,YYYY-MM-DD`: whole days at second precision.
fn parse_date_span(s: &str) -> Option<TimeFilter> {
    let (first, second) = s.split_once(',')?;
    let start = NaiveDate::parse_from_str(first.trim(), "%Y-%m-%d").ok()?;
    let end = NaiveDate::parse_from_str(second.trim(), "%Y-%m-%d").ok()?;
    Some(TimeFilter {
        start: start.and_hms_opt(0, 0, 0)?.and_utc(),
        end: end.and_hms_opt(23, 59, 59)?.and_utc(),
    })
}

/// Date-time pair at hour, minute or second precision; the end bound fills
/// its missing components with :59.
fn parse_datetime_span(s: &str) -> Option<TimeFilter> {
    let (first, second) = s.split_once(',')?;
    let start = parse_datetime_bound(first.trim(), false)?;
    let end = parse_datetime_bound(second.trim(), true)?;
    Some(TimeFilter {
        start: start.and_utc(),
        end: end.and_utc(),
    })
}

fn parse_datetime_bound(s: &str, is_end: bool) -> Option<NaiveDateTime> {
    let (date_part, time_part) = s.split_once(['T', ' '])?;
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;

    let fields: Vec<&str> = time_part.split(':').collect();
    if fields.is_empty() || fields.len() > 3 {
        return None;
    }
    let mut parts = [0u32; 3];
    for (i, field) in fields.iter().enumerate() {
        parts[i] = parse_number(field)?;
    }
    if is_end {
        for slot in parts.iter_mut().skip(fields.len()) {
            *slot = 59;
        }
    }
    date.and_hms_opt(parts[0], parts[1], parts[2])
}

fn parse_month_token(s: &str) -> Option<u32> {
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return numeric_month(s);
    }
    let lower = s.to_lowercase();
    MONTH_NAMES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|&(_, number)| number)
}

fn numeric_month(s: &str) -> Option<u32> {
    let month: u32 = parse_number(s)?;
    (1..=12).contains(&month).then_some(month)
}

fn parse_number<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// First day of the start month through the last second of the end month.
fn span_of_months(
    start_year: i32,
    start_month: u32,
    end_year: i32,
    end_month: u32,
) -> Option<TimeFilter> {
    let start = NaiveDate::from_ymd_opt(start_year, start_month, 1)?;
    let end = last_day_of_month(end_year, end_month)?;
    Some(TimeFilter {
        start: start.and_hms_opt(0, 0, 0)?.and_utc(),
        end: end.and_hms_opt(23, 59, 59)?.and_utc(),
    })
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_months(Months::new(1))?.pred_opt()
}

/// Apply the optional time and project predicates to a record set.
///
/// Records without a timestamp never satisfy a time filter. The project
/// filter is a case-insensitive substring match.
pub fn apply_filters(
    records: &[UsageRecord],
    time: Option<&TimeFilter>,
    project: Option<&str>,
) -> Vec<UsageRecord> {
    let project_needle = project.map(|p| p.to_lowercase());
    records
        .iter()
        .filter(|record| {
            if let Some(window) = time {
                match record.timestamp {
                    Some(ts) if window.contains(ts) => {}
                    _ => return false,
                }
            }
            if let Some(needle) = &project_needle {
                if !record.project.to_lowercase().contains(needle) {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}
