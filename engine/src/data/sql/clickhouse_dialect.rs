//! ClickHouse SQL dialect implementation

use super::SqlDialect;

/// ClickHouse SQL dialect
pub struct ClickhouseDialect;

impl SqlDialect for ClickhouseDialect {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        if ident == "*" {
            return ident.to_string();
        }
        format!("`{}`", ident.replace('`', "``"))
    }

    fn date_of(&self, col: &str) -> String {
        format!("toDate({})", col)
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "true" } else { "false" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        let dialect = ClickhouseDialect;
        assert_eq!(dialect.quote_identifier("span_name"), "`span_name`");
        assert_eq!(dialect.quote_identifier("a`b"), "`a``b`");
    }

    #[test]
    fn test_date_of() {
        let dialect = ClickhouseDialect;
        assert_eq!(dialect.date_of("`timestamp`"), "toDate(`timestamp`)");
    }

    #[test]
    fn test_bool_literal() {
        let dialect = ClickhouseDialect;
        assert_eq!(dialect.bool_literal(true), "true");
    }
}
