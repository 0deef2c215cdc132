//! SQLite SQL dialect implementation

use super::SqlDialect;

/// SQLite SQL dialect
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn date_of(&self, col: &str) -> String {
        format!("date({})", col)
    }

    // SQLite has no boolean storage class
    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "1" } else { "0" }
    }
}
