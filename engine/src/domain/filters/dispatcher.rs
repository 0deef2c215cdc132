//! Filter request dispatch
//!
//! [`FilterEngine`] holds the read-only configuration and the collaborators
//! (time parsing, expression parsing, named scopes, entity introspection).
//! [`FilterDispatcher`] binds an engine to one query builder and applies
//! requests to it, one directive at a time in [`Directive::ALL`] order.

use std::sync::Arc;

use serde_json::Value;

use crate::data::error::FilterResult;
use crate::data::query::{Operator, QueryBuilder};
use crate::domain::schema::EntityIntrospector;
use crate::utils::string::is_blank;
use crate::utils::time::{ChronoTimeNormalizer, TimeNormalizer};

use super::config::FilterConfig;
use super::expression::{BasicExpressionParser, ExpressionAdapter, ExpressionParser};
use super::matching::{ColumnMatcher, MatchMode, unwrap_single};
use super::range::RangeFilter;
use super::scope::{ScopeInvoker, ScopeRegistry};
use super::types::{Directive, FilterRequest, FilterType};

/// Filter configuration plus collaborators, built once and shared
pub struct FilterEngine {
    config: FilterConfig,
    time: Box<dyn TimeNormalizer>,
    expressions: Box<dyn ExpressionParser>,
    scopes: Box<dyn ScopeInvoker>,
    introspector: Option<Arc<dyn EntityIntrospector>>,
}

impl FilterEngine {
    /// Engine with the bundled collaborators and no relation support
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            time: Box::new(ChronoTimeNormalizer),
            expressions: Box::new(BasicExpressionParser),
            scopes: Box::new(ScopeRegistry::new()),
            introspector: None,
        }
    }

    pub fn with_time_normalizer(mut self, time: impl TimeNormalizer + 'static) -> Self {
        self.time = Box::new(time);
        self
    }

    pub fn with_expression_parser(mut self, parser: impl ExpressionParser + 'static) -> Self {
        self.expressions = Box::new(parser);
        self
    }

    pub fn with_scopes(mut self, scopes: impl ScopeInvoker + 'static) -> Self {
        self.scopes = Box::new(scopes);
        self
    }

    /// Enable relation-qualified columns (`author:name`)
    pub fn with_introspector(mut self, introspector: Arc<dyn EntityIntrospector>) -> Self {
        self.introspector = Some(introspector);
        self
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Bind the engine to a builder
    pub fn dispatcher<'a>(&'a self, builder: &'a mut dyn QueryBuilder) -> FilterDispatcher<'a> {
        FilterDispatcher {
            engine: self,
            builder,
        }
    }

    fn matcher(&self) -> ColumnMatcher<'_> {
        ColumnMatcher {
            config: &self.config,
            introspector: self.introspector.as_deref(),
        }
    }

    fn ranges(&self) -> RangeFilter<'_> {
        RangeFilter {
            config: &self.config,
            time: self.time.as_ref(),
        }
    }

    fn apply_directive(
        &self,
        builder: &mut dyn QueryBuilder,
        directive: Directive,
        payload: &Value,
        request: &FilterRequest,
    ) -> FilterResult<()> {
        let columns = match payload {
            Value::Object(map) => map,
            Value::Array(_) if directive == Directive::Parse => {
                return self.apply_expressions(builder, payload);
            }
            _ => {
                tracing::debug!(directive = %directive, "Directive expects a column map, skipped");
                return Ok(());
            }
        };

        let matcher = self.matcher();
        let ranges = self.ranges();

        match directive {
            Directive::Filter => {
                for (column, value) in columns {
                    self.filter_column(builder, column, value)?;
                }
            }
            Directive::Parse => {
                for value in columns.values() {
                    self.apply_expressions(builder, value)?;
                }
            }
            Directive::DFilter => matcher.lookup_all(builder, columns, request.fields())?,
            Directive::LFilter => matcher.like_all(builder, columns, MatchMode::Contains)?,
            Directive::RFilter => {
                tracing::trace!(columns = columns.len(), "rfilter is inert");
            }
            Directive::EFilter => matcher.like_all(builder, columns, MatchMode::Prefix)?,
            Directive::Date => {
                for (column, value) in columns {
                    ranges.date(builder, column, value)?;
                }
            }
            Directive::Datetime => {
                for (column, value) in columns {
                    ranges.datetime(builder, column, value)?;
                }
            }
            Directive::Unix => {
                for (column, value) in columns {
                    ranges.unix(builder, column, value)?;
                }
            }
            Directive::Range => {
                for (column, value) in columns {
                    ranges.range(builder, column, value)?;
                }
            }
            Directive::Between => {
                for (column, value) in columns {
                    ranges.between(builder, column, value)?;
                }
            }
            Directive::Scope => {
                for (name, args) in columns {
                    if name.trim().is_empty() {
                        continue;
                    }
                    self.scopes.invoke(builder, name, args)?;
                }
            }
        }
        Ok(())
    }

    /// Route one `filter` column by its declared type
    fn filter_column(
        &self,
        builder: &mut dyn QueryBuilder,
        column: &str,
        value: &Value,
    ) -> FilterResult<()> {
        if !is_present(value) {
            tracing::trace!(column, "Filter value absent, skipped");
            return Ok(());
        }
        let value = unwrap_single(value);
        let ty = self.config.column_type(column).unwrap_or_default();
        tracing::trace!(column, filter_type = ?ty, "Routing filter column");

        let matcher = self.matcher();
        let ranges = self.ranges();

        match ty {
            FilterType::Exact => matcher.add_where(builder, column, value, Operator::Eq),
            FilterType::Like => matcher.add_like(builder, column, value, MatchMode::Contains),
            FilterType::Left => matcher.add_like(builder, column, value, MatchMode::Prefix),
            FilterType::Right => matcher.add_like(builder, column, value, MatchMode::Suffix),
            FilterType::Between => ranges.between(builder, column, value),
            FilterType::Range => ranges.range(builder, column, value),
            FilterType::Unix => ranges.unix(builder, column, value),
            FilterType::Datetime => ranges.datetime(builder, column, value),
            FilterType::Date => ranges.date(builder, column, value),
            FilterType::Parser => self.apply_expressions(builder, value),
            FilterType::Scope => self.scopes.invoke(builder, column, value),
        }
    }

    /// Replay each expression string of a payload
    fn apply_expressions(&self, builder: &mut dyn QueryBuilder, payload: &Value) -> FilterResult<()> {
        let adapter = ExpressionAdapter::new(self.expressions.as_ref());
        match payload {
            Value::String(text) => adapter.apply(builder, text),
            Value::Array(items) => {
                for text in items.iter().filter_map(Value::as_str) {
                    adapter.apply(builder, text)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// A [`FilterEngine`] bound to one query builder
pub struct FilterDispatcher<'a> {
    engine: &'a FilterEngine,
    builder: &'a mut dyn QueryBuilder,
}

impl FilterDispatcher<'_> {
    /// Apply every recognised directive of `request` to the builder
    ///
    /// Each directive adds AND-ed constraints. Empty or malformed values add
    /// nothing; collaborator failures (unparseable times or expressions,
    /// unknown relations or scopes) are returned as-is.
    pub fn apply(&mut self, request: &FilterRequest) -> FilterResult<&mut Self> {
        for key in request.fields().keys() {
            if Directive::from_key(key).is_none() {
                tracing::trace!(key = %key, "Request key is not a directive");
            }
        }
        for directive in Directive::ALL {
            let Some(payload) = request.payload(directive) else {
                continue;
            };
            tracing::debug!(directive = %directive, "Applying filter directive");
            self.engine
                .apply_directive(&mut *self.builder, directive, payload, request)?;
        }
        Ok(self)
    }
}

/// A value is present when its first component is neither null, false nor ""
fn is_present(value: &Value) -> bool {
    let first = match value {
        Value::Array(items) => items.first(),
        Value::Object(map) => map.values().next(),
        other => Some(other),
    };
    match first {
        None | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(other) => !is_blank(other),
    }
}
