//! SQL dialect trait for multi-database support

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - Identifier quoting ("col" vs `col`)
/// - Extracting the calendar date from a timestamp column
/// - Boolean literals
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite/DuckDB/ClickHouse: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// Quote a single identifier segment (no dots)
    ///
    /// `*` is never quoted.
    fn quote_identifier(&self, ident: &str) -> String {
        if ident == "*" {
            return ident.to_string();
        }
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Extract the calendar date from a column
    ///
    /// - SQLite: `date(col)`
    /// - PostgreSQL: `col::DATE`
    /// - DuckDB: `CAST(col AS DATE)`
    /// - ClickHouse: `toDate(col)`
    fn date_of(&self, col: &str) -> String;

    /// Inline boolean literal
    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "TRUE" } else { "FALSE" }
    }
}
