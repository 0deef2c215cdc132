//! Range splitting and the date, datetime, unix-time, generic and raw range filters
//!
//! Every range family takes the same loosely shaped payload (`{from, to}`,
//! `[from, to]` or `"from - to"`), turns it into [`Bounds`] once through
//! [`RangeValue`], and then applies its own parsing and its own rule for a
//! missing side:
//!
//! | family   | both    | only from        | only to          |
//! |----------|---------|------------------|------------------|
//! | date     | BETWEEN | date equality    | dropped          |
//! | datetime | BETWEEN | BETWEEN (to=from)| BETWEEN (from=to)|
//! | unix     | BETWEEN | BETWEEN (to=from)| BETWEEN (from=to)|
//! | range    | BETWEEN | equality         | dropped          |
//! | between  | BETWEEN | equality         | dropped          |
//!
//! A datetime range given only its end covers that whole day instead of
//! leaving the start unbounded.

use serde_json::Value;

use crate::data::error::FilterResult;
use crate::data::query::{Operator, QueryBuilder, SqlValue};
use crate::utils::string::{is_blank, is_empty_value, is_numeric, scalar_text};
use crate::utils::time::{TimeNormalizer, TimeValue, to_unix_seconds};

use super::column::resolve_column;
use super::config::FilterConfig;

const RANGE_SEPARATOR: &str = " - ";
const DATE_FORMAT: &str = "Y-m-d";
const DATETIME_FORMAT: &str = "Y-m-d H:i:s";
const START_OF_DAY: &str = "00:00:00";
const END_OF_DAY: &str = "23:59:59";

/// A range payload before splitting
#[derive(Debug, Clone, PartialEq)]
pub enum RangeValue {
    /// Single value, possibly a `"from - to"` string
    Scalar(Value),
    /// Already structured pair
    Range {
        from: Option<Value>,
        to: Option<Value>,
    },
}

impl RangeValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) if map.contains_key("from") || map.contains_key("to") => {
                RangeValue::Range {
                    from: map.get("from").cloned(),
                    to: map.get("to").cloned(),
                }
            }
            Value::Array(items) if items.len() >= 2 => RangeValue::Range {
                from: items.first().cloned(),
                to: items.get(1).cloned(),
            },
            Value::Array(items) => RangeValue::Scalar(items.first().cloned().unwrap_or_default()),
            other => RangeValue::Scalar(other.clone()),
        }
    }

    /// Split into bounds. Structured pairs are returned unchanged; strings
    /// are split on `" - "` with both halves trimmed.
    pub fn split(self) -> Bounds {
        match self {
            RangeValue::Range { from, to } => Bounds { from, to },
            RangeValue::Scalar(Value::String(text)) => {
                let mut parts = text.split(RANGE_SEPARATOR);
                let from = parts.next().map(|s| Value::String(s.trim().to_string()));
                let to = parts.next().map(|s| Value::String(s.trim().to_string()));
                Bounds { from, to }
            }
            RangeValue::Scalar(other) => Bounds {
                from: Some(other),
                to: None,
            },
        }
    }
}

/// Split range bounds; blank sides count as absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bounds {
    pub from: Option<Value>,
    pub to: Option<Value>,
}

impl Bounds {
    pub fn from_value(&self) -> Option<&Value> {
        self.from.as_ref().filter(|v| !is_blank(v))
    }

    pub fn to_value(&self) -> Option<&Value> {
        self.to.as_ref().filter(|v| !is_blank(v))
    }

    pub fn from_text(&self) -> Option<String> {
        self.from_value().and_then(scalar_text)
    }

    pub fn to_text(&self) -> Option<String> {
        self.to_value().and_then(scalar_text)
    }
}

/// Shared inputs of the range filters
pub struct RangeFilter<'a> {
    pub config: &'a FilterConfig,
    pub time: &'a dyn TimeNormalizer,
}

impl RangeFilter<'_> {
    fn bounds(value: &Value) -> Option<Bounds> {
        if is_empty_value(value) {
            return None;
        }
        Some(RangeValue::from_json(value).split())
    }

    fn parse(
        &self,
        text: Option<String>,
        format: Option<&str>,
        time_of_day: Option<&str>,
    ) -> FilterResult<Option<TimeValue>> {
        match text {
            Some(text) => self.time.parse(&text, format, time_of_day),
            None => Ok(None),
        }
    }

    /// Calendar-day range
    pub fn date(&self, builder: &mut dyn QueryBuilder, column: &str, value: &Value) -> FilterResult<()> {
        let Some(bounds) = Self::bounds(value) else {
            return Ok(());
        };
        let from = self.parse(bounds.from_text(), Some(DATE_FORMAT), None)?;
        let to = self.parse(bounds.to_text(), Some(DATE_FORMAT), None)?;
        let col = resolve_column(&*builder, self.config, column);

        match (from, to) {
            (Some(from), Some(to)) => builder.where_date_between(
                col,
                SqlValue::Date(from.date()),
                SqlValue::Date(to.date()),
            ),
            (Some(from), None) => builder.where_date(col, Operator::Eq, SqlValue::Date(from.date())),
            _ => tracing::trace!(column, "Date range without start, skipped"),
        }
        Ok(())
    }

    /// Full timestamp range, whole days when no time is given
    pub fn datetime(
        &self,
        builder: &mut dyn QueryBuilder,
        column: &str,
        value: &Value,
    ) -> FilterResult<()> {
        let Some(bounds) = Self::bounds(value) else {
            return Ok(());
        };
        let (from, to) = fill_missing(bounds.from_text(), bounds.to_text());
        let from = self.parse(from, Some(DATETIME_FORMAT), Some(START_OF_DAY))?;
        let to = self.parse(to, Some(DATETIME_FORMAT), Some(END_OF_DAY))?;

        if let (Some(from), Some(to)) = (from, to) {
            let col = resolve_column(&*builder, self.config, column);
            builder.where_between(col, SqlValue::DateTime(from), SqlValue::DateTime(to));
        } else {
            tracing::trace!(column, "Datetime range without bounds, skipped");
        }
        Ok(())
    }

    /// Epoch-second range
    pub fn unix(&self, builder: &mut dyn QueryBuilder, column: &str, value: &Value) -> FilterResult<()> {
        let Some(bounds) = Self::bounds(value) else {
            return Ok(());
        };
        let (from, to) = fill_missing(bounds.from_text(), bounds.to_text());
        let from = self.epoch(from, START_OF_DAY)?;
        let to = self.epoch(to, END_OF_DAY)?;

        if let (Some(from), Some(to)) = (from, to) {
            let col = resolve_column(&*builder, self.config, column);
            builder.where_between(col, from, to);
        } else {
            tracing::trace!(column, "Unix range without bounds, skipped");
        }
        Ok(())
    }

    fn epoch(&self, text: Option<String>, time_of_day: &str) -> FilterResult<Option<SqlValue>> {
        let Some(text) = text else {
            return Ok(None);
        };
        let trimmed = text.trim();
        if is_numeric(trimmed) {
            let value = match trimmed.parse::<i64>() {
                Ok(seconds) => SqlValue::Integer(seconds),
                Err(_) => SqlValue::Float(trimmed.parse::<f64>().unwrap_or_default()),
            };
            return Ok(Some(value));
        }
        let parsed = self.time.parse(trimmed, None, Some(time_of_day))?;
        Ok(parsed.map(|t| SqlValue::Integer(to_unix_seconds(&t))))
    }

    /// Ordered pair parsed as times without a fixed format
    pub fn range(&self, builder: &mut dyn QueryBuilder, column: &str, value: &Value) -> FilterResult<()> {
        let Some(bounds) = Self::bounds(value) else {
            return Ok(());
        };
        let from = self.parse(bounds.from_text(), None, None)?;
        let to = self.parse(bounds.to_text(), None, None)?;
        let col = resolve_column(&*builder, self.config, column);

        match (from, to) {
            (Some(from), Some(to)) => {
                builder.where_between(col, SqlValue::DateTime(from), SqlValue::DateTime(to))
            }
            (Some(from), None) => builder.where_(col, Operator::Eq, SqlValue::DateTime(from)),
            _ => tracing::trace!(column, "Range without start, skipped"),
        }
        Ok(())
    }

    /// Ordered pair used as-is
    pub fn between(&self, builder: &mut dyn QueryBuilder, column: &str, value: &Value) -> FilterResult<()> {
        let Some(bounds) = Self::bounds(value) else {
            return Ok(());
        };
        let col = resolve_column(&*builder, self.config, column);

        match (bounds.from_value(), bounds.to_value()) {
            (Some(from), Some(to)) => {
                builder.where_between(col, SqlValue::from_json(from), SqlValue::from_json(to))
            }
            (Some(from), None) => builder.where_(col, Operator::Eq, SqlValue::from_json(from)),
            _ => tracing::trace!(column, "Between without start, skipped"),
        }
        Ok(())
    }
}

/// Each missing side takes the value of the other
fn fill_missing(from: Option<String>, to: Option<String>) -> (Option<String>, Option<String>) {
    let to = to.or_else(|| from.clone());
    let from = from.or_else(|| to.clone());
    (from, to)
}
