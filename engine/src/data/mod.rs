//! Data layer: errors, SQL dialects and the query builder boundary

pub mod error;
pub mod query;
pub mod sql;

pub use error::{FilterError, FilterResult};
