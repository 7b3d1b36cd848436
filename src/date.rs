//! Letter date extraction.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::normalize::normalize;

pub const MONTHS_ID: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

const MONTHS_EN: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

static RE_DAY_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{1,2})\s+([A-Za-z]+)\s+(20\d{2})").unwrap());
static RE_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2})[-/](\d{1,2})[-/](20\d{2})\b").unwrap());
static RE_AFTER_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:Tanggal|Tgl)\b\s*[:.]?\s*(\d{1,2})\s+([A-Za-z]+)\s+(20\d{2})").unwrap()
});
static RE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(20\d{2})\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePrecision {
    Day,
    /// Only a year was found; the date is pinned to January 1st.
    YearOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterDate {
    pub date: NaiveDate,
    pub precision: DatePrecision,
}

impl LetterDate {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// `05 Mei 2024`, or `2024` for a year-only date.
impl fmt::Display for LetterDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.precision {
            DatePrecision::YearOnly => write!(f, "{}", self.date.year()),
            DatePrecision::Day => write!(
                f,
                "{:02} {} {}",
                self.date.day(),
                MONTHS_ID[self.date.month0() as usize],
                self.date.year()
            ),
        }
    }
}

/// Month number (1-12) for an Indonesian month name, any case.
pub fn month_number(name: &str) -> Option<u32> {
    MONTHS_ID
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|idx| idx as u32 + 1)
}

/// Indonesian month name of a formatted letter date (`"05 Mei 2024"` → `Mei`).
///
/// English month names are accepted as well. Year-only dates have no month.
pub fn month_from_tanggal(tanggal: &str) -> Option<&'static str> {
    tanggal.split_whitespace().find_map(|word| {
        let idx = MONTHS_ID
            .iter()
            .position(|m| m.eq_ignore_ascii_case(word))
            .or_else(|| MONTHS_EN.iter().position(|m| m.eq_ignore_ascii_case(word)))?;
        Some(MONTHS_ID[idx])
    })
}

/// Extract the letter date from raw document text.
pub fn extract_date(text: &str) -> Option<LetterDate> {
    date_from_clean(&normalize(text))
}

pub(crate) fn date_from_clean(cleaned: &str) -> Option<LetterDate> {
    // only the first hit of each pattern counts; an invalid one falls through to the next pattern
    let found = first_match(&RE_DAY_MONTH_YEAR, cleaned, named_month)
        .or_else(|| first_match(&RE_NUMERIC, cleaned, numeric_month))
        .or_else(|| first_match(&RE_AFTER_LABEL, cleaned, named_month));
    if let Some(date) = found {
        debug!(date = %date, "tanggal extracted");
        return Some(date);
    }

    let year: i32 = RE_YEAR.captures(cleaned)?[1].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, 1, 1)?;
    debug!(year, "only a year found, pinned to January 1st");
    Some(LetterDate { date, precision: DatePrecision::YearOnly })
}

fn first_match(re: &Regex, text: &str, build: fn(&Captures) -> Option<LetterDate>) -> Option<LetterDate> {
    re.captures(text).and_then(|caps| build(&caps))
}

fn named_month(caps: &Captures) -> Option<LetterDate> {
    let month = month_number(&caps[2])?;
    day_date(&caps[3], month, &caps[1])
}

fn numeric_month(caps: &Captures) -> Option<LetterDate> {
    let month = caps[2].parse().ok()?;
    day_date(&caps[3], month, &caps[1])
}

fn day_date(year: &str, month: u32, day: &str) -> Option<LetterDate> {
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)?;
    Some(LetterDate { date, precision: DatePrecision::Day })
}
