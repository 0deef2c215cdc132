//! Query builder abstraction
//!
//! Filters never produce SQL text directly. They call [`QueryBuilder`]
//! verbs; [`SqlBuilder`] is the bundled implementation that turns those calls
//! into a parameterised WHERE fragment.

mod builder;
mod types;

pub use builder::{NestedFn, QueryBuilder, SqlBuilder};
pub use types::{Boolean, Clause, Column, Condition, Operator, Predicate, SqlParams, SqlValue};
