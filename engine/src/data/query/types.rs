//! Condition types recorded by query builders

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// How a clause joins the clauses before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl Boolean {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Boolean::And => "AND",
            Boolean::Or => "OR",
        }
    }
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
}

impl Operator {
    /// Parse an operator token (case-insensitive for word operators)
    pub fn parse(token: &str) -> Option<Self> {
        let op = match token.trim().to_ascii_lowercase().as_str() {
            "=" | "==" => Operator::Eq,
            "!=" | "<>" => Operator::NotEq,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "like" => Operator::Like,
            "not like" => Operator::NotLike,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A column reference handed to a builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    /// Already escaped SQL, used verbatim
    Raw(String),
    /// Plain (possibly dotted) name, quoted by the builder at render time
    Name(String),
}

impl Column {
    pub fn name(name: impl Into<String>) -> Self {
        Column::Name(name.into())
    }
}

/// A scalar value bound into a condition
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl SqlValue {
    /// Convert a JSON scalar. Nested arrays/objects are bound as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => SqlValue::Null,
            serde_json::Value::Bool(b) => SqlValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Integer(i),
                None => SqlValue::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => SqlValue::Text(s.clone()),
            other => SqlValue::Text(other.to_string()),
        }
    }

    /// Text form used as a bound parameter
    pub fn to_param(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(b) => b.to_string(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => s.clone(),
            SqlValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            SqlValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

/// A single comparison contributed to a builder
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: Column,
    pub operator: Operator,
    pub value: SqlValue,
    pub boolean: Boolean,
}

impl Predicate {
    pub fn new(column: Column, operator: Operator, value: SqlValue, boolean: Boolean) -> Self {
        Self {
            column,
            operator,
            value,
            boolean,
        }
    }
}

/// A recorded WHERE condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: Column,
        operator: Operator,
        value: SqlValue,
    },
    In {
        column: Column,
        values: Vec<SqlValue>,
    },
    Between {
        column: Column,
        from: SqlValue,
        to: SqlValue,
    },
    DateCompare {
        column: Column,
        operator: Operator,
        value: SqlValue,
    },
    DateBetween {
        column: Column,
        from: SqlValue,
        to: SqlValue,
    },
    /// Parenthesised group of clauses
    Group(Vec<Clause>),
    /// Existence of at least one related row satisfying the nested clauses
    Exists {
        table: String,
        related_key: Column,
        parent_key: Column,
        clauses: Vec<Clause>,
    },
}

/// A condition together with its combinator
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub boolean: Boolean,
    pub condition: Condition,
}

impl Clause {
    pub fn new(boolean: Boolean, condition: Condition) -> Self {
        Self { boolean, condition }
    }
}

/// Collects SQL parameters during query building (maintains insertion order)
#[derive(Debug, Default)]
pub struct SqlParams {
    pub values: Vec<String>,
}

impl SqlParams {
    /// Bind a value and return its 1-based index
    pub fn push(&mut self, value: &SqlValue) -> usize {
        self.values.push(value.to_param());
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_parse() {
        assert_eq!(Operator::parse("="), Some(Operator::Eq));
        assert_eq!(Operator::parse("<>"), Some(Operator::NotEq));
        assert_eq!(Operator::parse("!="), Some(Operator::NotEq));
        assert_eq!(Operator::parse("LIKE"), Some(Operator::Like));
        assert_eq!(Operator::parse("=~"), None);
    }

    #[test]
    fn test_sql_value_from_json() {
        assert_eq!(SqlValue::from_json(&json!(null)), SqlValue::Null);
        assert_eq!(SqlValue::from_json(&json!(42)), SqlValue::Integer(42));
        assert_eq!(SqlValue::from_json(&json!(1.5)), SqlValue::Float(1.5));
        assert_eq!(SqlValue::from_json(&json!("a")), SqlValue::Text("a".into()));
        assert_eq!(SqlValue::from_json(&json!(true)), SqlValue::Bool(true));
    }

    #[test]
    fn test_sql_value_to_param_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(SqlValue::Date(date).to_param(), "2024-01-31");
        let dt = date.and_hms_opt(23, 59, 59).unwrap();
        assert_eq!(SqlValue::DateTime(dt).to_param(), "2024-01-31 23:59:59");
    }

    #[test]
    fn test_sql_params_indices() {
        let mut params = SqlParams::default();
        assert_eq!(params.push(&SqlValue::Integer(1)), 1);
        assert_eq!(params.push(&"x".into()), 2);
        assert_eq!(params.values, vec!["1", "x"]);
    }
}
