//! Unified error type for the filter engine
//!
//! Malformed filter *input* never produces an error: empty or unrecognised
//! shapes simply add no constraint. Errors come from collaborators (time
//! parsing, expression parsing, relation lookup, named scopes) and from
//! configuration loading, and are propagated unchanged out of `apply`.

use thiserror::Error;

/// Unified error type for filter compilation
#[derive(Error, Debug)]
pub enum FilterError {
    /// A time value could not be parsed
    #[error("Invalid time value '{value}'{}", format_suffix(.format))]
    InvalidTime {
        value: String,
        format: Option<String>,
    },

    /// A boolean filter expression could not be parsed
    #[error("Invalid filter expression at offset {offset}: {reason}")]
    InvalidExpression { offset: usize, reason: String },

    /// A relation segment does not exist on the entity it was resolved against
    #[error("Relation '{relation}' is not defined on entity '{entity}'")]
    UnknownRelation { entity: String, relation: String },

    /// A named scope was requested but never registered
    #[error("Scope '{0}' is not registered")]
    UnknownScope(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_suffix(format: &Option<String>) -> String {
    match format {
        Some(f) => format!(" (expected format '{}')", f),
        None => String::new(),
    }
}

impl FilterError {
    /// Create an invalid time error
    pub fn invalid_time(value: impl Into<String>, format: Option<&str>) -> Self {
        Self::InvalidTime {
            value: value.into(),
            format: format.map(str::to_string),
        }
    }

    /// Create an invalid expression error
    pub fn invalid_expression(offset: usize, reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            offset,
            reason: reason.into(),
        }
    }

    /// Create an unknown relation error
    pub fn unknown_relation(entity: impl Into<String>, relation: impl Into<String>) -> Self {
        Self::UnknownRelation {
            entity: entity.into(),
            relation: relation.into(),
        }
    }

    /// Whether the error was caused by the submitted filter values rather
    /// than by configuration
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTime { .. } | Self::InvalidExpression { .. }
        )
    }
}

pub type FilterResult<T> = Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_time_display_with_format() {
        let err = FilterError::invalid_time("2024-13-45", Some("Y-m-d"));
        assert_eq!(
            err.to_string(),
            "Invalid time value '2024-13-45' (expected format 'Y-m-d')"
        );
    }

    #[test]
    fn test_invalid_time_display_without_format() {
        let err = FilterError::invalid_time("yesterday-ish", None);
        assert_eq!(err.to_string(), "Invalid time value 'yesterday-ish'");
    }

    #[test]
    fn test_unknown_relation_display() {
        let err = FilterError::unknown_relation("post", "editor");
        assert_eq!(
            err.to_string(),
            "Relation 'editor' is not defined on entity 'post'"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let err: FilterError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, FilterError::Json(_)));
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_is_input_error() {
        assert!(FilterError::invalid_time("x", None).is_input_error());
        assert!(FilterError::invalid_expression(3, "unexpected token").is_input_error());
        assert!(!FilterError::UnknownScope("active".to_string()).is_input_error());
        assert!(!FilterError::Config("bad".to_string()).is_input_error());
    }
}
