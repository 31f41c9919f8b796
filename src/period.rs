//! Calendar-month range resolution.
//!
//! Reporting requests arrive as `YYYY-MM` month keys and are resolved into a
//! half-open `[start, end)` date interval. All month arithmetic is done on
//! the calendar (December rolls into the next year), never by string math.

use crate::error::{ExpenseTrackerError, Result};
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;

/// Canonical zone used when a request carries no timezone context. The app
/// serves a Brazilian audience, so São Paulo is the sensible default.
pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::America::Sao_Paulo;

fn month_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}$").unwrap())
}

/// Resolves an IANA zone name, falling back to the default for anything
/// missing or unrecognized.
pub fn zone_or_default(name: Option<&str>) -> Tz {
    name.and_then(|n| n.parse::<Tz>().ok())
        .unwrap_or(DEFAULT_TIME_ZONE)
}

/// "Today" as seen from the given zone. This is the single source of truth
/// for deriving a business date from the wall clock, used both as the
/// extraction reference date and for the current-month total readback.
pub fn reference_date(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// The `YYYY-MM` bucket a date belongs to.
pub fn month_key_of(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

fn first_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        ExpenseTrackerError::DateError(format!("no such month: {:04}-{:02}", year, month))
    })
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn parse_month_key(key: &str) -> Option<(i32, u32)> {
    if !month_pattern().is_match(key) {
        return None;
    }
    let (year_str, month_str) = key.split_once('-')?;
    let year: i32 = year_str.parse().ok()?;
    let month: u32 = month_str.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

/// A half-open date interval: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Whether a date falls inside the interval.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// The inclusive sequence of `YYYY-MM` keys the interval spans, for
    /// backends that index expenses by month bucket. Empty for a reversed
    /// interval.
    pub fn month_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        let (mut year, mut month) = (self.start.year(), self.start.month());
        loop {
            let first = match first_day_of_month(year, month) {
                Ok(d) => d,
                Err(_) => break,
            };
            if first >= self.end {
                break;
            }
            keys.push(format!("{:04}-{:02}", year, month));
            (year, month) = next_month(year, month);
        }
        keys
    }
}

/// Turns a `(from, to)` pair of `YYYY-MM` strings into a [`DateRange`].
///
/// `from` is mandatory and strictly checked. A missing or malformed `to`
/// collapses to a single-month range. A `to` chronologically before `from`
/// is deliberately not rejected: it resolves to an empty interval and the
/// caller renders an empty report.
pub fn resolve_range(from: &str, to: Option<&str>) -> Result<DateRange> {
    let (start_year, start_month) = parse_month_key(from)
        .ok_or_else(|| ExpenseTrackerError::InvalidMonth(from.to_string()))?;

    let start = first_day_of_month(start_year, start_month)?;

    let end = match to.and_then(parse_month_key) {
        Some((to_year, to_month)) => {
            let (year, month) = next_month(to_year, to_month);
            first_day_of_month(year, month)?
        }
        None => {
            let (year, month) = next_month(start_year, start_month);
            first_day_of_month(year, month)?
        }
    };

    Ok(DateRange { start, end })
}
