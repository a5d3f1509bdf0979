//! Calendar date helpers shared by the value model, the CSV loader and the
//! date functions.
//!
//! Dates are plain [NaiveDate]s restricted to four-digit years. Parsing tries
//! the accepted textual forms in a fixed priority order: ISO (`YYYY-MM-DD`),
//! US (`MM/DD/YYYY`), EU (`DD/MM/YYYY`) and compact (`YYYYMMDD`).

use chrono::{Datelike, Local, Months, NaiveDate};

const MIN_YEAR: i32 = 1000;
const MAX_YEAR: i32 = 9999;

/// The textual layouts a date can be parsed from or formatted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `YYYY-MM-DD`
    Iso,
    /// `MM/DD/YYYY`
    Us,
    /// `DD/MM/YYYY`
    Eu,
    /// `YYYYMMDD`
    Compact,
}

impl DateFormat {
    /// Priority order used by [parse_date].
    pub const ALL: [DateFormat; 4] = [
        DateFormat::Iso,
        DateFormat::Us,
        DateFormat::Eu,
        DateFormat::Compact,
    ];

    /// Resolves a `DATE_FORMAT` style argument. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "ISO" | "YYYY-MM-DD" => Some(DateFormat::Iso),
            "US" | "MM/DD/YYYY" => Some(DateFormat::Us),
            "EU" | "DD/MM/YYYY" => Some(DateFormat::Eu),
            "COMPACT" | "YYYYMMDD" => Some(DateFormat::Compact),
            _ => None,
        }
    }
}

/// Unit argument of `DATE_ADD`, `DATE_SUB` and `DATE_DIFF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    Days,
    Months,
    Years,
}

impl DateUnit {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "DAY" | "DAYS" => Some(DateUnit::Days),
            "MONTH" | "MONTHS" => Some(DateUnit::Months),
            "YEAR" | "YEARS" => Some(DateUnit::Years),
            _ => None,
        }
    }
}

/// Builds a date, rejecting out-of-range years and impossible days
/// (leap years follow the Gregorian rule).
pub fn make_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses `input` trying every [DateFormat] in priority order.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    DateFormat::ALL
        .iter()
        .find_map(|format| parse_date_as(input, *format))
}

/// Parses `input` with one specific layout.
pub fn parse_date_as(input: &str, format: DateFormat) -> Option<NaiveDate> {
    let input = input.trim();
    match format {
        DateFormat::Iso => {
            let [y, m, d] = split_fields(input, '-')?;
            if y.len() != 4 {
                return None;
            }
            make_date(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
        }
        DateFormat::Us => {
            let [m, d, y] = split_fields(input, '/')?;
            if y.len() != 4 {
                return None;
            }
            make_date(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
        }
        DateFormat::Eu => {
            let [d, m, y] = split_fields(input, '/')?;
            if y.len() != 4 {
                return None;
            }
            make_date(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
        }
        DateFormat::Compact => {
            if input.len() != 8 || !input.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            make_date(
                input[0..4].parse().ok()?,
                input[4..6].parse().ok()?,
                input[6..8].parse().ok()?,
            )
        }
    }
}

/// Splits `input` into exactly three non-empty, all-digit fields.
fn split_fields(input: &str, sep: char) -> Option<[&str; 3]> {
    let mut parts = input.split(sep);
    let fields = [parts.next()?, parts.next()?, parts.next()?];
    if parts.next().is_some() {
        return None;
    }
    for field in fields {
        if field.is_empty() || field.len() > 4 || !field.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    Some(fields)
}

pub fn format_date(date: NaiveDate, format: DateFormat) -> String {
    let (y, m, d) = (date.year(), date.month(), date.day());
    match format {
        DateFormat::Iso => format!("{y:04}-{m:02}-{d:02}"),
        DateFormat::Us => format!("{m:02}/{d:02}/{y:04}"),
        DateFormat::Eu => format!("{d:02}/{m:02}/{y:04}"),
        DateFormat::Compact => format!("{y:04}{m:02}{d:02}"),
    }
}

/// Shifts `date` by `amount` units. Month and year arithmetic clamps the day
/// to the end of the target month (Jan 31 + 1 month = Feb 28/29).
pub fn add_interval(date: NaiveDate, amount: i64, unit: DateUnit) -> Option<NaiveDate> {
    let shifted = match unit {
        DateUnit::Days => date.checked_add_signed(chrono::Duration::try_days(amount)?)?,
        DateUnit::Months => shift_months(date, amount)?,
        DateUnit::Years => shift_months(date, amount.checked_mul(12)?)?,
    };
    make_date(shifted.year(), shifted.month(), shifted.day())
}

fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

/// Difference `left - right` in whole units.
///
/// Months and years only look at the calendar fields, so
/// `2025-03-01` minus `2025-02-28` is one month.
pub fn diff(left: NaiveDate, right: NaiveDate, unit: DateUnit) -> i64 {
    match unit {
        DateUnit::Days => (left - right).num_days(),
        DateUnit::Months => {
            i64::from(left.year() - right.year()) * 12
                + (i64::from(left.month()) - i64::from(right.month()))
        }
        DateUnit::Years => i64::from(left.year() - right.year()),
    }
}

/// Day of the week, 0 = Sunday through 6 = Saturday.
pub fn day_of_week(date: NaiveDate) -> i64 {
    i64::from(date.weekday().num_days_from_sunday())
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
