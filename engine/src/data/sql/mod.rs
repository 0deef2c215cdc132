//! SQL abstraction layer for multi-database support
//!
//! Filters compile to a parameterised WHERE fragment. The pieces of that
//! fragment that differ between databases (identifier quoting, parameter
//! placeholders, calendar-date casts, boolean literals) live behind
//! [`SqlDialect`].

mod clickhouse_dialect;
mod dialect;
mod duckdb_dialect;
mod postgres_dialect;
mod sqlite_dialect;

use serde::{Deserialize, Serialize};

pub use clickhouse_dialect::ClickhouseDialect;
pub use dialect::SqlDialect;
pub use duckdb_dialect::DuckdbDialect;
pub use postgres_dialect::PostgresDialect;
pub use sqlite_dialect::SqliteDialect;

/// Database backend identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    #[default]
    Postgres,
    Duckdb,
    Clickhouse,
}

impl Backend {
    /// Get the SQL dialect for this backend
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Backend::Sqlite => &SqliteDialect,
            Backend::Postgres => &PostgresDialect,
            Backend::Duckdb => &DuckdbDialect,
            Backend::Clickhouse => &ClickhouseDialect,
        }
    }

    /// Get the backend name
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Postgres => "postgres",
            Backend::Duckdb => "duckdb",
            Backend::Clickhouse => "clickhouse",
        }
    }

    /// Parse a backend name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Some(Backend::Sqlite),
            "postgres" | "postgresql" | "pgsql" => Some(Backend::Postgres),
            "duckdb" => Some(Backend::Duckdb),
            "clickhouse" => Some(Backend::Clickhouse),
            _ => None,
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_dialect_names_match() {
        for backend in [
            Backend::Sqlite,
            Backend::Postgres,
            Backend::Duckdb,
            Backend::Clickhouse,
        ] {
            assert_eq!(backend.dialect().name(), backend.name());
        }
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(Backend::parse("PostgreSQL"), Some(Backend::Postgres));
        assert_eq!(Backend::parse(" sqlite "), Some(Backend::Sqlite));
        assert_eq!(Backend::parse("mysql"), None);
    }

    #[test]
    fn test_backend_serde() {
        let backend: Backend = serde_json::from_str(r#""duckdb""#).unwrap();
        assert_eq!(backend, Backend::Duckdb);
        assert_eq!(Backend::default(), Backend::Postgres);
    }
}
