// Utility helpers for parsing and formatting.
//
// Spreadsheet exports are loose about date formats, so all the date
// handling lives here and the rest of the code works with `NaiveDate`.
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Formats tried, in order, when no explicit list is configured.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%B %d, %Y",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

pub fn default_date_formats() -> Vec<String> {
    DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect()
}

/// Parse a date cell against each format in turn.
///
/// - Trims whitespace; empty cells are `None`.
/// - Formats carrying a time of day are parsed as date-times and truncated
///   to the date.
/// - Anything left over gets one RFC 3339 attempt (`2024-01-05T08:30:00Z`),
///   keeping the date as written rather than converting the offset.
pub fn parse_date_safe(s: Option<&str>, formats: &[String]) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    formats
        .iter()
        .find_map(|fmt| {
            if fmt.contains("%H") {
                NaiveDateTime::parse_from_str(s, fmt).ok().map(|dt| dt.date())
            } else {
                NaiveDate::parse_from_str(s, fmt).ok()
            }
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// `YYYY-MM` label for the month containing `date`.
pub fn year_month_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

pub fn format_number(n: f64, decimals: usize) -> String {
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Fixed-width text bar, clamped to [0, 100]%.
pub fn progress_bar(pct: f64, width: usize) -> String {
    let ratio = if pct.is_finite() {
        (pct / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (ratio * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}
