//! Boolean filter expressions (`status = "active" AND score >= 10`)
//!
//! [`ExpressionParser`] turns an expression string into an ordered list of
//! `(combinator, predicate)` pairs; [`ExpressionAdapter`] replays that list
//! onto a query builder inside one group, so an `OR` in an expression never
//! leaks into the surrounding AND chain.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Number, Value};

use crate::data::error::{FilterError, FilterResult};
use crate::data::query::{Boolean, Column, Operator, Predicate, QueryBuilder, SqlValue};

/// Operator as written in an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprOperator {
    Compare(Operator),
    /// `=~`, replayed as a substring match
    Approximate,
}

impl ExprOperator {
    pub fn parse(token: &str) -> Option<Self> {
        if token == "=~" {
            return Some(ExprOperator::Approximate);
        }
        Operator::parse(token).map(ExprOperator::Compare)
    }

    /// Builder operator this expression operator replays as
    pub fn to_operator(self) -> Operator {
        match self {
            ExprOperator::Compare(op) => op,
            ExprOperator::Approximate => Operator::Like,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPredicate {
    pub left: String,
    pub operator: ExprOperator,
    pub right: Value,
}

/// Parses an expression string into combinator/predicate pairs
pub trait ExpressionParser: Send + Sync {
    fn parse(&self, text: &str) -> FilterResult<Vec<(Boolean, ParsedPredicate)>>;
}

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\s*(?:(?P<str>"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')|(?P<op>=~|>=|<=|!=|<>|==|=|>|<)|(?P<word>[^\s=<>!~"']+))"#,
    )
    .expect("Invalid regex")
});

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.:|]*$").expect("Invalid regex"));

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Quoted(String),
    Op(String),
    Word(String),
}

/// Tokenising parser for `left OP right (AND|OR left OP right)*`
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicExpressionParser;

impl BasicExpressionParser {
    fn tokenize(text: &str) -> FilterResult<Vec<(usize, Token)>> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            if rest.trim().is_empty() {
                break;
            }
            let caps = TOKEN_RE
                .captures(rest)
                .ok_or_else(|| FilterError::invalid_expression(pos, "unexpected character"))?;
            let whole = caps.get(0).map(|m| m.end()).unwrap_or_default();
            let start = pos + (rest.len() - rest.trim_start().len());
            let token = if let Some(m) = caps.name("str") {
                Token::Quoted(unquote(m.as_str()))
            } else if let Some(m) = caps.name("op") {
                Token::Op(m.as_str().to_string())
            } else if let Some(m) = caps.name("word") {
                Token::Word(m.as_str().to_string())
            } else {
                return Err(FilterError::invalid_expression(pos, "unexpected character"));
            };
            tokens.push((start, token));
            pos += whole;
        }
        Ok(tokens)
    }
}

impl ExpressionParser for BasicExpressionParser {
    fn parse(&self, text: &str) -> FilterResult<Vec<(Boolean, ParsedPredicate)>> {
        let tokens = Self::tokenize(text)?;
        let mut iter = tokens.into_iter().peekable();
        let mut predicates = Vec::new();
        let mut boolean = Boolean::And;

        while let Some((offset, token)) = iter.next() {
            let left = match token {
                Token::Word(word) if IDENT_RE.is_match(&word) => word,
                _ => return Err(FilterError::invalid_expression(offset, "expected a column name")),
            };

            let operator = match iter.next() {
                Some((offset, Token::Op(op))) => ExprOperator::parse(&op)
                    .ok_or_else(|| FilterError::invalid_expression(offset, "unknown operator"))?,
                Some((offset, _)) => {
                    return Err(FilterError::invalid_expression(offset, "expected an operator"));
                }
                None => return Err(FilterError::invalid_expression(text.len(), "missing operator")),
            };

            let right = match iter.next() {
                Some((_, Token::Quoted(s))) => Value::String(s),
                Some((_, Token::Word(word))) => literal(&word),
                Some((offset, Token::Op(_))) => {
                    return Err(FilterError::invalid_expression(offset, "expected a value"));
                }
                None => return Err(FilterError::invalid_expression(text.len(), "missing value")),
            };

            predicates.push((
                boolean,
                ParsedPredicate {
                    left,
                    operator,
                    right,
                },
            ));

            match iter.next() {
                None => break,
                Some((offset, Token::Word(word))) => {
                    boolean = match word.to_ascii_uppercase().as_str() {
                        "AND" | "&&" => Boolean::And,
                        "OR" | "||" => Boolean::Or,
                        _ => {
                            return Err(FilterError::invalid_expression(offset, "expected AND or OR"));
                        }
                    };
                    if iter.peek().is_none() {
                        return Err(FilterError::invalid_expression(
                            text.len(),
                            "dangling combinator",
                        ));
                    }
                }
                Some((offset, _)) => {
                    return Err(FilterError::invalid_expression(offset, "expected AND or OR"));
                }
            }
        }

        Ok(predicates)
    }
}

fn unquote(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn literal(word: &str) -> Value {
    match word.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Ok(i) = word.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Some(n) = word.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(word.to_string())
}

/// Replays parsed expressions onto a query builder
pub struct ExpressionAdapter<'a> {
    parser: &'a dyn ExpressionParser,
}

impl<'a> ExpressionAdapter<'a> {
    pub fn new(parser: &'a dyn ExpressionParser) -> Self {
        Self { parser }
    }

    /// Parse `text` and add its predicates as one AND-ed group
    pub fn apply(&self, builder: &mut dyn QueryBuilder, text: &str) -> FilterResult<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let predicates = self.parser.parse(text)?;
        tracing::trace!(expression = text, count = predicates.len(), "Replaying expression");

        builder.where_group(Boolean::And, &mut |q| {
            for (i, (boolean, predicate)) in predicates.iter().enumerate() {
                let boolean = if i == 0 { Boolean::And } else { *boolean };
                q.push_where(Predicate::new(
                    Column::Name(predicate.left.clone()),
                    predicate.operator.to_operator(),
                    SqlValue::from_json(&predicate.right),
                    boolean,
                ));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::query::{SqlBuilder, SqlParams};
    use crate::data::sql::PostgresDialect;
    use serde_json::json;

    #[test]
    fn test_parse_single_predicate() {
        let parsed = BasicExpressionParser.parse(r#"status = "active""#).unwrap();
        assert_eq!(
            parsed,
            vec![(
                Boolean::And,
                ParsedPredicate {
                    left: "status".to_string(),
                    operator: ExprOperator::Compare(Operator::Eq),
                    right: json!("active"),
                }
            )]
        );
    }

    #[test]
    fn test_parse_combinators_and_literals() {
        let parsed = BasicExpressionParser
            .parse("score >= 10 or ratio < 0.5 AND published = true AND name =~ al")
            .unwrap();
        let booleans: Vec<Boolean> = parsed.iter().map(|(b, _)| *b).collect();
        assert_eq!(
            booleans,
            vec![Boolean::And, Boolean::Or, Boolean::And, Boolean::And]
        );
        assert_eq!(parsed[0].1.right, json!(10));
        assert_eq!(parsed[1].1.right, json!(0.5));
        assert_eq!(parsed[2].1.right, json!(true));
        assert_eq!(parsed[3].1.operator, ExprOperator::Approximate);
        assert_eq!(parsed[3].1.right, json!("al"));
    }

    #[test]
    fn test_parse_quoted_escapes_and_compact_operators() {
        let parsed = BasicExpressionParser
            .parse(r#"title!='it\'s' OR p.code<>"A B""#)
            .unwrap();
        assert_eq!(parsed[0].1.operator, ExprOperator::Compare(Operator::NotEq));
        assert_eq!(parsed[0].1.right, json!("it's"));
        assert_eq!(parsed[1].1.left, "p.code");
        assert_eq!(parsed[1].1.right, json!("A B"));
    }

    #[test]
    fn test_parse_errors() {
        for text in [
            "status",
            "status =",
            "= 1",
            "a = 1 AND",
            "a = 1 b = 2",
            r#"a = "unterminated"#,
            "a = = 1",
        ] {
            assert!(
                matches!(
                    BasicExpressionParser.parse(text),
                    Err(FilterError::InvalidExpression { .. })
                ),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_adapter_groups_and_maps_approximate() {
        let mut builder = SqlBuilder::new(&PostgresDialect);
        builder.where_(Column::name("active"), Operator::Eq, SqlValue::Bool(true));
        let adapter = ExpressionAdapter::new(&BasicExpressionParser);
        adapter
            .apply(&mut builder, "name =~ '%al%' OR nickname = al")
            .unwrap();

        let mut params = SqlParams::default();
        assert_eq!(
            builder.to_sql(&mut params),
            r#""active" = TRUE AND ("name" LIKE $1 OR "nickname" = $2)"#
        );
        assert_eq!(params.values, vec!["%al%", "al"]);
    }

    #[test]
    fn test_adapter_ignores_leading_combinator() {
        struct LeadingOr;
        impl ExpressionParser for LeadingOr {
            fn parse(&self, _text: &str) -> FilterResult<Vec<(Boolean, ParsedPredicate)>> {
                Ok(vec![(
                    Boolean::Or,
                    ParsedPredicate {
                        left: "a".to_string(),
                        operator: ExprOperator::Compare(Operator::Gt),
                        right: json!(1),
                    },
                )])
            }
        }

        let mut builder = SqlBuilder::new(&PostgresDialect);
        builder.where_(Column::name("b"), Operator::Eq, SqlValue::Integer(2));
        ExpressionAdapter::new(&LeadingOr)
            .apply(&mut builder, "anything")
            .unwrap();

        let clauses = builder.clauses();
        assert_eq!(clauses[1].boolean, Boolean::And);
        let mut params = SqlParams::default();
        assert_eq!(builder.to_sql(&mut params), r#""b" = $1 AND "a" > $2"#);
    }

    #[test]
    fn test_adapter_error_adds_nothing() {
        let mut builder = SqlBuilder::new(&PostgresDialect);
        let adapter = ExpressionAdapter::new(&BasicExpressionParser);
        assert!(adapter.apply(&mut builder, "broken =").is_err());
        assert!(builder.is_empty());
    }
}
