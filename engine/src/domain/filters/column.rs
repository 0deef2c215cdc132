//! Column reference resolution for non-relational filters

use crate::data::query::{Column, QueryBuilder};

use super::config::FilterConfig;

/// Resolve a filter column into an escaped builder column
///
/// `qualifier.column` is split once; the column part goes through the alias
/// map and both parts are quoted by the builder. A bare name is quoted as a
/// whole.
pub fn resolve_column(builder: &dyn QueryBuilder, config: &FilterConfig, column: &str) -> Column {
    let column = column.trim();
    match column.split_once('.') {
        Some((qualifier, name)) => {
            let name = config.resolve_alias(name);
            builder.raw(format!("{}.{}", builder.wrap(qualifier), builder.wrap(name)))
        }
        None => builder.raw(builder.wrap(column)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::query::SqlBuilder;
    use crate::data::sql::{ClickhouseDialect, PostgresDialect};

    #[test]
    fn test_bare_column_is_quoted() {
        let builder = SqlBuilder::new(&PostgresDialect);
        let config = FilterConfig::new();
        assert_eq!(
            resolve_column(&builder, &config, "status"),
            Column::Raw(r#""status""#.to_string())
        );
    }

    #[test]
    fn test_dotted_column_uses_alias() {
        let builder = SqlBuilder::new(&PostgresDialect);
        let config = FilterConfig::new().with_alias("created", "created_at");
        assert_eq!(
            resolve_column(&builder, &config, "p.created"),
            Column::Raw(r#""p"."created_at""#.to_string())
        );
    }

    #[test]
    fn test_qualifier_is_quoted() {
        let builder = SqlBuilder::new(&PostgresDialect);
        let config = FilterConfig::new();
        assert_eq!(
            resolve_column(&builder, &config, "1=1 OR x.y"),
            Column::Raw(r#""1=1 OR x"."y""#.to_string())
        );
        assert_eq!(
            resolve_column(&builder, &config, r#"a"b.c"#),
            Column::Raw(r#""a""b"."c""#.to_string())
        );
    }

    #[test]
    fn test_alias_ignored_without_qualifier() {
        let builder = SqlBuilder::new(&ClickhouseDialect);
        let config = FilterConfig::new().with_alias("created", "created_at");
        assert_eq!(
            resolve_column(&builder, &config, "created"),
            Column::Raw("`created`".to_string())
        );
    }
}
