//! Filter request, directive and column-type definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::data::error::{FilterError, FilterResult};
use crate::utils::string::is_empty_value;

/// Recognised top-level keys of a filter request
///
/// Directives are applied in the order of [`Directive::ALL`]; each one adds
/// AND-ed constraints to the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// Per-column filter, type resolved from the column type map
    Filter,
    /// Sequence of boolean-expression strings
    Parse,
    /// Request-key lookup filters
    DFilter,
    /// Forced substring match
    LFilter,
    /// Recognised but inert
    RFilter,
    /// Forced prefix match
    EFilter,
    Date,
    Datetime,
    Unix,
    Range,
    Between,
    Scope,
}

impl Directive {
    pub const ALL: [Directive; 12] = [
        Directive::Filter,
        Directive::Parse,
        Directive::DFilter,
        Directive::LFilter,
        Directive::RFilter,
        Directive::EFilter,
        Directive::Date,
        Directive::Datetime,
        Directive::Unix,
        Directive::Range,
        Directive::Between,
        Directive::Scope,
    ];

    /// Request keys for this directive; the first non-empty one wins
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Directive::Filter => &["filter"],
            Directive::Parse => &["parse"],
            Directive::DFilter => &["dfilter"],
            Directive::LFilter => &["lfilter"],
            Directive::RFilter => &["rfilter"],
            Directive::EFilter => &["efilter"],
            Directive::Date => &["date"],
            Directive::Datetime => &["datetime", "timestamp"],
            Directive::Unix => &["unix", "unixtime"],
            Directive::Range => &["range"],
            Directive::Between => &["between"],
            Directive::Scope => &["scope"],
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.keys().contains(&key))
    }

    pub fn name(&self) -> &'static str {
        self.keys()[0]
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared filter type of a column, used by the `filter` directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum FilterType {
    /// Plain equality (also the fallback for unknown tags)
    #[default]
    Exact,
    /// `%value%`
    Like,
    /// `value%`
    Left,
    /// `%value`
    Right,
    Between,
    Range,
    Unix,
    Datetime,
    Date,
    Parser,
    Scope,
}

impl FilterType {
    /// Resolve a type tag. Unknown tags are `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let ty = match tag.trim().to_ascii_lowercase().as_str() {
            "exact" => FilterType::Exact,
            "like" => FilterType::Like,
            "left" => FilterType::Left,
            "right" => FilterType::Right,
            "between" => FilterType::Between,
            "range" => FilterType::Range,
            "unix" | "unixtime" => FilterType::Unix,
            "datetime" | "timestamp" => FilterType::Datetime,
            "date" => FilterType::Date,
            "parser" => FilterType::Parser,
            "scope" => FilterType::Scope,
            _ => return None,
        };
        Some(ty)
    }
}

impl From<String> for FilterType {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag).unwrap_or_else(|| {
            tracing::warn!(tag = %tag, "Unknown filter type tag, falling back to exact match");
            FilterType::Exact
        })
    }
}

/// Loosely structured filter request (form or query-string shaped)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterRequest(Map<String, Value>);

impl FilterRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; anything but an object is an empty request
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Parse a JSON request document; anything but an object is rejected
    pub fn from_json_str(text: &str) -> FilterResult<Self> {
        match serde_json::from_str(text)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(FilterError::Config(
                "Filter request must be a JSON object".to_string(),
            )),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Structured payload for a directive
    ///
    /// Aliased keys are tried in order and the first non-empty one is used.
    /// Scalar payloads are ignored.
    pub fn payload(&self, directive: Directive) -> Option<&Value> {
        directive
            .keys()
            .iter()
            .filter_map(|key| self.0.get(*key))
            .find(|value| !is_empty_value(value))
            .filter(|value| value.is_object() || value.is_array())
    }
}

impl From<Map<String, Value>> for FilterRequest {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_directive_keys_and_lookup() {
        assert_eq!(Directive::from_key("timestamp"), Some(Directive::Datetime));
        assert_eq!(Directive::from_key("unixtime"), Some(Directive::Unix));
        assert_eq!(Directive::from_key("filter"), Some(Directive::Filter));
        assert_eq!(Directive::from_key("order"), None);
        assert_eq!(Directive::Unix.to_string(), "unix");
    }

    #[test]
    fn test_request_from_json_str() {
        let request = FilterRequest::from_json_str(r#"{"filter": {"a": 1}}"#).unwrap();
        assert_eq!(request.get("filter"), Some(&json!({"a": 1})));

        assert!(matches!(
            FilterRequest::from_json_str("[1]"),
            Err(FilterError::Config(_))
        ));
        assert!(matches!(
            FilterRequest::from_json_str("{"),
            Err(FilterError::Json(_))
        ));
    }

    #[test]
    fn test_filter_type_tags() {
        assert_eq!(FilterType::from_tag("timestamp"), Some(FilterType::Datetime));
        assert_eq!(FilterType::from_tag("UNIXTIME"), Some(FilterType::Unix));
        assert_eq!(FilterType::from_tag("fuzzy"), None);
    }

    #[test]
    fn test_filter_type_deserialize_unknown_falls_back() {
        let ty: FilterType = serde_json::from_str(r#""fuzzy""#).unwrap();
        assert_eq!(ty, FilterType::Exact);
        let ty: FilterType = serde_json::from_str(r#""date""#).unwrap();
        assert_eq!(ty, FilterType::Date);
    }

    #[test]
    fn test_payload_ignores_scalars() {
        let request = FilterRequest::from_value(json!({
            "filter": "status",
            "date": { "created_at": "2024-01-01" }
        }));
        assert!(request.payload(Directive::Filter).is_none());
        assert!(request.payload(Directive::Date).is_some());
    }

    #[test]
    fn test_payload_alias_fallback() {
        let request = FilterRequest::from_value(json!({
            "datetime": {},
            "timestamp": { "created_at": "2024-01-01" }
        }));
        let payload = request.payload(Directive::Datetime).unwrap();
        assert!(payload.get("created_at").is_some());

        let request = FilterRequest::from_value(json!({
            "unix": { "a": "1" },
            "unixtime": { "b": "2" }
        }));
        let payload = request.payload(Directive::Unix).unwrap();
        assert!(payload.get("a").is_some());
        assert!(payload.get("b").is_none());
    }

    #[test]
    fn test_from_value_non_object() {
        assert_eq!(FilterRequest::from_value(json!([1, 2])), FilterRequest::new());
    }
}
