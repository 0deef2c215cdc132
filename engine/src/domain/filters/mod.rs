//! Filter compilation
//!
//! Turns a loosely structured request map (`filter`, `parse`, `date`, ...)
//! into constraints on a [`QueryBuilder`](crate::data::query::QueryBuilder).
//! Start with [`FilterEngine::dispatcher`].

mod column;
mod config;
mod dispatcher;
mod expression;
mod matching;
mod range;
mod relation;
mod scope;
mod types;

pub use column::resolve_column;
pub use config::FilterConfig;
pub use dispatcher::{FilterDispatcher, FilterEngine};
pub use expression::{
    BasicExpressionParser, ExprOperator, ExpressionAdapter, ExpressionParser, ParsedPredicate,
};
pub use matching::{ColumnMatcher, MatchMode};
pub use range::{Bounds, RangeFilter, RangeValue};
pub use relation::{RelationPathResolver, ResolvedPaths};
pub use scope::{ScopeInvoker, ScopeRegistry};
pub use types::{Directive, FilterRequest, FilterType};
