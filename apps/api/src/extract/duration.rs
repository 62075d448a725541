//! Employment duration parsing: "Jan 2020 - Present" -> months.
//!
//! Resolution is one month; every parsed date lands on day 1.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

const DATE: &str = r"(?:\d{1,2}\s+)?[a-z]{3,9}\.?,?\s*(?:\d{1,2},\s*)?\d{4}|\d{1,2}[/-]\d{4}|\d{4}[/-]\d{1,2}|\d{4}";
const OPEN_END: &str = r"present|current(?:ly)?|running|now|ongoing|till\s+date|to\s+date|date";

/// A date range as written on a resume: start, separator, end.
pub static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?P<start>{DATE})\s*(?:-|–|—|\bto\b|\buntil\b|\btill\b)\s*(?P<end>{OPEN_END}|{DATE})\b"
    ))
    .unwrap()
});

static MONTH_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d{1,2}\s+)?([a-z]+)\.?,?\s*(?:\d{1,2},\s*)?(\d{4})$").unwrap()
});
static NUMERIC_MONTH_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[/-](\d{4})$").unwrap());
static YEAR_NUMERIC_MONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[/-](\d{1,2})$").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());

const OPEN_END_WORDS: &[&str] = &[
    "present",
    "current",
    "currently",
    "running",
    "now",
    "ongoing",
    "till date",
    "to date",
    "date",
];

fn month_from_name(word: &str) -> u32 {
    let prefix: String = word.chars().take(3).collect();
    match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        // Unrecognised month words fall back to January.
        _ => 1,
    }
}

/// Parses a single date. Open-ended words ("Present", "till date") resolve
/// to `today`.
pub fn parse_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = text.trim().trim_end_matches('.').to_lowercase();
    let s = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.is_empty() {
        return None;
    }

    if OPEN_END_WORDS.contains(&s.as_str()) {
        return NaiveDate::from_ymd_opt(today.year(), today.month(), 1);
    }

    if let Some(cap) = NUMERIC_MONTH_YEAR_RE.captures(&s) {
        return first_of_month(&cap[2], &cap[1]);
    }
    if let Some(cap) = YEAR_NUMERIC_MONTH_RE.captures(&s) {
        return first_of_month(&cap[1], &cap[2]);
    }
    if YEAR_RE.is_match(&s) {
        return first_of_month(&s, "1");
    }
    if let Some(cap) = MONTH_YEAR_RE.captures(&s) {
        let year: i32 = cap[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month_from_name(&cap[1]), 1);
    }
    None
}

fn first_of_month(year: &str, month: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

/// Splits duration text into start and (optional) end.
///
/// A recognised date range splits on its own separator, which keeps
/// `2019-03 - 2021-05` intact. Anything else splits on the first en dash,
/// then on the first hyphen. With no separator there is no end.
pub fn split_duration(text: &str) -> (String, Option<String>) {
    if let Some(cap) = RANGE_RE.captures(text) {
        return (cap["start"].to_string(), Some(cap["end"].to_string()));
    }
    for sep in ['–', '—', '-'] {
        if let Some((start, end)) = text.split_once(sep) {
            return (start.trim().to_string(), Some(end.trim().to_string()));
        }
    }
    (text.trim().to_string(), None)
}

/// Whole calendar months from `start` to `end`, floored at zero.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let months = (end.year() as i64 - start.year() as i64) * 12
        + (end.month() as i64 - start.month() as i64);
    months.max(0)
}

/// Months covered by a duration string. An unparseable start yields 0; a
/// missing or unparseable end counts up to `today`.
pub fn calculate_duration(text: &str, today: NaiveDate) -> i64 {
    let (start, end) = split_duration(text);
    let Some(start) = parse_date(&start, today) else {
        return 0;
    };
    let end = end
        .and_then(|e| parse_date(&e, today))
        .unwrap_or(today);
    months_between(start, end)
}
