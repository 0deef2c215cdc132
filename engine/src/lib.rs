//! Filter compilation engine
//!
//! Compiles loosely structured filter requests (as submitted by list/search
//! forms) into constraints on a relational query builder. The bundled
//! [`SqlBuilder`](data::query::SqlBuilder) renders those constraints as a
//! parameterised SQL WHERE fragment for PostgreSQL, SQLite, DuckDB or
//! ClickHouse.
//!
//! ```no_run
//! use filter_engine::data::query::{SqlBuilder, SqlParams};
//! use filter_engine::data::sql::Backend;
//! use filter_engine::domain::filters::{FilterConfig, FilterEngine, FilterRequest, FilterType};
//!
//! let engine = FilterEngine::new(FilterConfig::new().with_filter("title", FilterType::Like));
//! let request = FilterRequest::from_value(serde_json::json!({
//!     "filter": { "title": ["rust"] },
//!     "date": { "published_at": "2024-01-01 - 2024-01-31" }
//! }));
//!
//! let mut builder = SqlBuilder::new(Backend::Postgres.dialect());
//! engine.dispatcher(&mut builder).apply(&request)?;
//!
//! let mut params = SqlParams::default();
//! let sql = builder.to_sql(&mut params);
//! println!("{sql} {:?}", params.values);
//! # Ok::<(), filter_engine::FilterError>(())
//! ```

pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;

pub use data::{FilterError, FilterResult};
