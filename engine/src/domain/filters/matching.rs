//! Equality and pattern-match filters on plain or relation-qualified columns

use serde_json::{Map, Value};

use crate::data::error::FilterResult;
use crate::data::query::{Boolean, Column, Operator, Predicate, QueryBuilder, SqlValue};
use crate::domain::schema::EntityIntrospector;
use crate::utils::string::{is_blank, scalar_text};

use super::column::resolve_column;
use super::config::FilterConfig;
use super::relation::RelationPathResolver;

/// Where the wildcard goes in a LIKE pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// `%value%`
    Contains,
    /// `value%`
    Prefix,
    /// `%value`
    Suffix,
}

impl MatchMode {
    pub fn pattern(&self, text: &str) -> String {
        match self {
            MatchMode::Contains => format!("%{}%", text),
            MatchMode::Prefix => format!("{}%", text),
            MatchMode::Suffix => format!("%{}", text),
        }
    }
}

/// Compare a column with a value; sequences become membership tests
pub(crate) fn compare(
    builder: &mut dyn QueryBuilder,
    boolean: Boolean,
    column: Column,
    operator: Operator,
    value: &Value,
) {
    match value {
        Value::Array(items) => {
            let values = items.iter().map(SqlValue::from_json).collect();
            builder.where_in(boolean, column, values);
        }
        other => builder.push_where(Predicate::new(
            column,
            operator,
            SqlValue::from_json(other),
            boolean,
        )),
    }
}

/// Single-element sequences stand for their element
pub(crate) fn unwrap_single(value: &Value) -> &Value {
    match value {
        Value::Array(items) if items.len() == 1 => &items[0],
        other => other,
    }
}

/// Column-level filter sink shared by the directives
pub struct ColumnMatcher<'a> {
    pub config: &'a FilterConfig,
    pub introspector: Option<&'a dyn EntityIntrospector>,
}

impl ColumnMatcher<'_> {
    /// Constrain one column
    ///
    /// Colon paths on an entity-bound builder go through the relation
    /// resolver. Pipe-delimited columns become an OR group. Anything else is
    /// a single comparison on the resolved column.
    pub fn add_where(
        &self,
        builder: &mut dyn QueryBuilder,
        column: &str,
        value: &Value,
        operator: Operator,
    ) -> FilterResult<()> {
        if column.contains(':') && builder.entity().is_some() {
            if let Some(introspector) = self.introspector {
                return RelationPathResolver::new(introspector, operator).resolve(builder, value, column);
            }
        }

        if column.contains('|') {
            let config = self.config;
            return builder.where_group(Boolean::And, &mut |q| {
                for alternative in column.split('|') {
                    let col = resolve_column(&*q, config, alternative);
                    compare(q, Boolean::Or, col, operator, value);
                }
                Ok(())
            });
        }

        let col = resolve_column(&*builder, self.config, column);
        compare(builder, Boolean::And, col, operator, value);
        Ok(())
    }

    /// Pattern match on one column; sequences are matched by membership
    pub fn add_like(
        &self,
        builder: &mut dyn QueryBuilder,
        column: &str,
        value: &Value,
        mode: MatchMode,
    ) -> FilterResult<()> {
        let value = unwrap_single(value);
        if is_blank(value) {
            tracing::trace!(column, "Blank pattern value, skipped");
            return Ok(());
        }
        match value {
            Value::Array(_) => self.add_where(builder, column, value, Operator::Eq),
            other => {
                let text = scalar_text(other).unwrap_or_else(|| other.to_string());
                let pattern = Value::String(mode.pattern(&text));
                self.add_where(builder, column, &pattern, Operator::Like)
            }
        }
    }

    /// Pattern match over a `column → value` payload
    pub fn like_all(
        &self,
        builder: &mut dyn QueryBuilder,
        payload: &Map<String, Value>,
        mode: MatchMode,
    ) -> FilterResult<()> {
        for (column, value) in payload {
            self.add_like(builder, column, value, mode)?;
        }
        Ok(())
    }

    /// Lookup filters: `request_key → column`, value read from the request
    ///
    /// `%column` matches a suffix, `column%` a prefix, a bare column a substring.
    pub fn lookup_all(
        &self,
        builder: &mut dyn QueryBuilder,
        payload: &Map<String, Value>,
        request: &Map<String, Value>,
    ) -> FilterResult<()> {
        for (key, target) in payload {
            let Some(target) = target.as_str() else {
                tracing::trace!(key = %key, "Lookup target is not a column name, skipped");
                continue;
            };
            let Some(value) = request.get(key).filter(|v| !is_blank(v)) else {
                tracing::trace!(key = %key, "Lookup key missing from request, skipped");
                continue;
            };
            let (column, mode) = lookup_mode(target);
            self.add_like(builder, column, value, mode)?;
        }
        Ok(())
    }
}

fn lookup_mode(target: &str) -> (&str, MatchMode) {
    if let Some(column) = target.strip_prefix('%') {
        return (column, MatchMode::Suffix);
    }
    if let Some(column) = target.strip_suffix('%') {
        return (column, MatchMode::Prefix);
    }
    (target, MatchMode::Contains)
}
