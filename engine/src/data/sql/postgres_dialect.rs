//! PostgreSQL SQL dialect implementation

use super::SqlDialect;

/// PostgreSQL SQL dialect
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn date_of(&self, col: &str) -> String {
        format!("{}::DATE", col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.placeholder(1), "$1");
        assert_eq!(dialect.placeholder(5), "$5");
    }

    #[test]
    fn test_quote_identifier() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.quote_identifier("created_at"), "\"created_at\"");
        assert_eq!(dialect.quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(dialect.quote_identifier("*"), "*");
    }

    #[test]
    fn test_date_of() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.date_of("\"created_at\""), "\"created_at\"::DATE");
    }

    #[test]
    fn test_bool_literal() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.bool_literal(true), "TRUE");
        assert_eq!(dialect.bool_literal(false), "FALSE");
    }
}
