//! Time parsing for date, datetime, unix-time and generic range filters

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::data::error::{FilterError, FilterResult};

/// Comparable time value produced by a [`TimeNormalizer`]
pub type TimeValue = NaiveDateTime;

/// Layouts tried, in order, when no explicit format is given
const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%m/%d/%Y", "%d.%m.%Y"];

/// Parses filter text into a [`TimeValue`]
pub trait TimeNormalizer: Send + Sync {
    /// Parse `text`, optionally against a PHP-style `format` (`Y-m-d H:i:s`).
    ///
    /// When `text` has no time component and `time_of_day` is given, it is
    /// appended before parsing (unless `format` has no time fields). Empty
    /// text is `Ok(None)`; unparseable text is [`FilterError::InvalidTime`].
    fn parse(
        &self,
        text: &str,
        format: Option<&str>,
        time_of_day: Option<&str>,
    ) -> FilterResult<Option<TimeValue>>;
}

/// [`TimeNormalizer`] backed by chrono
#[derive(Debug, Default, Clone, Copy)]
pub struct ChronoTimeNormalizer;

impl TimeNormalizer for ChronoTimeNormalizer {
    fn parse(
        &self,
        text: &str,
        format: Option<&str>,
        time_of_day: Option<&str>,
    ) -> FilterResult<Option<TimeValue>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let wants_time = format.is_none_or(|f| f.contains(':'));
        let text = match time_of_day {
            Some(suffix) if wants_time && !text.contains(':') => format!("{} {}", text, suffix),
            _ => text.to_string(),
        };

        let parsed = match format {
            Some(format) => parse_with_format(&text, &php_to_chrono(format)),
            None => parse_any(&text),
        };

        match parsed {
            Some(value) => Ok(Some(value)),
            None => {
                tracing::debug!(value = %text, format = ?format, "Unparseable time value");
                Err(FilterError::invalid_time(text, format))
            }
        }
    }
}

fn parse_with_format(text: &str, format: &str) -> Option<TimeValue> {
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_any(text: &str) -> Option<TimeValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        .or_else(|| {
            DATE_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(text, layout).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Translate a PHP `date()` format string into a chrono format string
pub fn php_to_chrono(format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        let mapped = match c {
            'Y' => "%Y",
            'y' => "%y",
            'm' | 'n' => "%m",
            'd' | 'j' => "%d",
            'H' | 'G' => "%H",
            'h' | 'g' => "%I",
            'i' => "%M",
            's' => "%S",
            'A' | 'a' => "%p",
            'D' => "%a",
            'l' => "%A",
            'M' => "%b",
            'F' => "%B",
            'U' => "%s",
            '%' => "%%",
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
                continue;
            }
            other => {
                out.push(other);
                continue;
            }
        };
        out.push_str(mapped);
    }
    out
}

/// Seconds since the Unix epoch, interpreting the value as UTC
pub fn to_unix_seconds(value: &TimeValue) -> i64 {
    value.and_utc().timestamp()
}
