//! Date normalization for listing headers and date fields
//!
//! Every recognized date is rendered as `DD-MM-YYYY`. Relative words are
//! resolved against a caller-supplied reference day so that parsing stays
//! reproducible under test.

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// Output format of every normalized date
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Formats accepted when the text carries an explicit year
const FULL_FORMATS: &[&str] = &["%d %B %Y", "%B %d %Y", "%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];

const MONTHS: &str =
    "january|february|march|april|may|june|july|august|september|october|november|december";

fn ordinal_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("valid regex"))
}

fn month_day() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)\b({})\s+(\d{{1,2}})\b", MONTHS)).expect("valid regex")
    })
}

fn day_month() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)\b(\d{{1,2}})\s+({})\b", MONTHS)).expect("valid regex")
    })
}

/// Normalizes free-form date text to `DD-MM-YYYY`
///
/// Recognition order:
/// 1. `today` / `yesterday` anywhere in the text (relative to `today`)
/// 2. full dates with a year (`17 November 2025`, `November 17, 2025`,
///    `17/11/2025`, `2025-11-17`, `17-11-2025`), ordinal suffixes allowed
/// 3. month and day without a year (`November 17th`, `17th November`); the
///    year is taken from `today`, or the previous year if that date would lie
///    in the future
///
/// Returns None if nothing is recognized.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use sitecrawl::extract::normalize_date;
///
/// let today = NaiveDate::from_ymd_opt(2025, 11, 18).unwrap();
/// assert_eq!(normalize_date("Yesterday November 17th", today), Some("17-11-2025".to_string()));
/// assert_eq!(normalize_date("November 17, 2025", today), Some("17-11-2025".to_string()));
/// ```
pub fn normalize_date(text: &str, today: NaiveDate) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let lower = text.to_lowercase();
    if lower.contains("yesterday") {
        return Some(format_date(today - Duration::days(1)));
    }
    if lower.contains("today") {
        return Some(format_date(today));
    }

    let commaless = text.replace(',', " ");
    let cleaned = ordinal_suffix().replace_all(&commaless, "$1");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    for format in FULL_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return Some(format_date(date));
        }
    }

    month_and_day(&cleaned, today).map(format_date)
}

fn month_and_day(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let (month, day) = if let Some(caps) = month_day().captures(text) {
        (month_number(&caps[1])?, caps[2].parse::<u32>().ok()?)
    } else {
        let caps = day_month().captures(text)?;
        (month_number(&caps[2])?, caps[1].parse::<u32>().ok()?)
    };

    let date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if date > today {
        NaiveDate::from_ymd_opt(today.year() - 1, month, day)
    } else {
        Some(date)
    }
}

fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    MONTHS
        .split('|')
        .position(|m| m == name)
        .map(|index| index as u32 + 1)
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
