//! Query builder boundary and SQL WHERE rendering
//!
//! [`QueryBuilder`] is the only surface the filter engine writes to. It
//! mirrors the usual relational builder verbs (`where`, `orWhere`, `whereIn`,
//! `whereBetween`, `whereDate`, nested groups, `whereHas`) plus the column
//! helpers filters need (`qualify_column`, `wrap`, `raw`).
//!
//! [`SqlBuilder`] records the calls as a [`Condition`] tree and renders it to
//! a parameterised WHERE fragment for a given [`SqlDialect`].

use crate::data::error::{FilterError, FilterResult};
use crate::data::sql::SqlDialect;
use crate::domain::schema::{RelationKind, Schema};

use super::types::{Boolean, Clause, Column, Condition, Operator, Predicate, SqlParams, SqlValue};

/// Callback receiving a nested builder (grouped where, existence constraint)
pub type NestedFn<'f> = dyn FnMut(&mut dyn QueryBuilder) -> FilterResult<()> + 'f;

/// Relational query builder consumed by the filter engine
pub trait QueryBuilder {
    /// Entity the builder queries, if it is bound to one
    fn entity(&self) -> Option<&str>;

    /// Add a single comparison
    fn push_where(&mut self, predicate: Predicate);

    /// Add a set-membership constraint
    fn where_in(&mut self, boolean: Boolean, column: Column, values: Vec<SqlValue>);

    /// Add an inclusive range constraint
    fn where_between(&mut self, column: Column, from: SqlValue, to: SqlValue);

    /// Compare the calendar date of a column
    fn where_date(&mut self, column: Column, operator: Operator, value: SqlValue);

    /// Inclusive range on the calendar date of a column
    fn where_date_between(&mut self, column: Column, from: SqlValue, to: SqlValue);

    /// Add a parenthesised group built by `f`. Empty groups are dropped.
    fn where_group(&mut self, boolean: Boolean, f: &mut NestedFn<'_>) -> FilterResult<()>;

    /// Constrain on the existence of related rows along a dotted relation
    /// path; `f` receives a builder bound to the innermost related entity.
    fn where_has(&mut self, relation: &str, f: &mut NestedFn<'_>) -> FilterResult<()>;

    /// Prefix a bare column with the builder's table
    fn qualify_column(&self, column: &str) -> String;

    /// Quote a (possibly dotted) identifier
    fn wrap(&self, identifier: &str) -> String;

    /// Mark already-escaped SQL as a column reference
    fn raw(&self, sql: String) -> Column {
        Column::Raw(sql)
    }

    fn where_(&mut self, column: Column, operator: Operator, value: SqlValue) {
        self.push_where(Predicate::new(column, operator, value, Boolean::And));
    }

    fn or_where(&mut self, column: Column, operator: Operator, value: SqlValue) {
        self.push_where(Predicate::new(column, operator, value, Boolean::Or));
    }
}

/// [`QueryBuilder`] that renders SQL through a dialect
pub struct SqlBuilder<'s> {
    dialect: &'static dyn SqlDialect,
    schema: Option<&'s Schema>,
    entity: Option<String>,
    table: Option<String>,
    clauses: Vec<Clause>,
}

impl<'s> SqlBuilder<'s> {
    /// Builder that is not bound to any entity (no relation support)
    pub fn new(dialect: &'static dyn SqlDialect) -> Self {
        Self {
            dialect,
            schema: None,
            entity: None,
            table: None,
            clauses: Vec::new(),
        }
    }

    /// Builder bound to an entity of `schema`
    pub fn for_entity(
        dialect: &'static dyn SqlDialect,
        schema: &'s Schema,
        entity: &str,
    ) -> FilterResult<Self> {
        let def = schema.entity(entity).ok_or_else(|| {
            FilterError::Config(format!("Entity '{}' is not defined in the schema", entity))
        })?;
        Ok(Self {
            dialect,
            schema: Some(schema),
            entity: Some(entity.to_string()),
            table: Some(def.table.clone()),
            clauses: Vec::new(),
        })
    }

    fn child(&self, entity: Option<String>, table: Option<String>) -> Self {
        Self {
            dialect: self.dialect,
            schema: self.schema,
            entity,
            table,
            clauses: Vec::new(),
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    fn push(&mut self, boolean: Boolean, condition: Condition) {
        self.clauses.push(Clause::new(boolean, condition));
    }

    /// Render the recorded clauses as a WHERE fragment (without `WHERE`)
    ///
    /// Returns an empty string when nothing was recorded.
    pub fn to_sql(&self, params: &mut SqlParams) -> String {
        self.render_clauses(&self.clauses, params)
    }

    fn render_clauses(&self, clauses: &[Clause], params: &mut SqlParams) -> String {
        let mut sql = String::new();
        for (i, clause) in clauses.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(clause.boolean.as_sql());
                sql.push(' ');
            }
            sql.push_str(&self.render_condition(&clause.condition, params));
        }
        sql
    }

    fn render_column(&self, column: &Column) -> String {
        match column {
            Column::Raw(sql) => sql.clone(),
            Column::Name(name) => self.wrap(name),
        }
    }

    fn render_value(&self, value: &SqlValue, params: &mut SqlParams) -> String {
        match value {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(b) => self.dialect.bool_literal(*b).to_string(),
            other => {
                let index = params.push(other);
                self.dialect.placeholder(index)
            }
        }
    }

    fn render_compare(
        &self,
        col: String,
        operator: &Operator,
        value: &SqlValue,
        params: &mut SqlParams,
    ) -> String {
        match (operator, value) {
            (Operator::Eq, SqlValue::Null) => format!("{} IS NULL", col),
            (Operator::NotEq, SqlValue::Null) => format!("{} IS NOT NULL", col),
            _ => {
                let rendered = self.render_value(value, params);
                format!("{} {} {}", col, operator.as_sql(), rendered)
            }
        }
    }

    fn render_condition(&self, condition: &Condition, params: &mut SqlParams) -> String {
        match condition {
            Condition::Compare {
                column,
                operator,
                value,
            } => self.render_compare(self.render_column(column), operator, value, params),
            Condition::In { column, values } => {
                if values.is_empty() {
                    return "1=0".to_string();
                }
                let col = self.render_column(column);
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| self.render_value(v, params))
                    .collect();
                format!("{} IN ({})", col, placeholders.join(", "))
            }
            Condition::Between { column, from, to } => {
                let col = self.render_column(column);
                let from = self.render_value(from, params);
                let to = self.render_value(to, params);
                format!("{} BETWEEN {} AND {}", col, from, to)
            }
            Condition::DateCompare {
                column,
                operator,
                value,
            } => {
                let col = self.dialect.date_of(&self.render_column(column));
                self.render_compare(col, operator, value, params)
            }
            Condition::DateBetween { column, from, to } => {
                let col = self.dialect.date_of(&self.render_column(column));
                let from = self.render_value(from, params);
                let to = self.render_value(to, params);
                format!("{} BETWEEN {} AND {}", col, from, to)
            }
            Condition::Group(clauses) => {
                let inner = self.render_clauses(clauses, params);
                if clauses.len() == 1 {
                    inner
                } else {
                    format!("({})", inner)
                }
            }
            Condition::Exists {
                table,
                related_key,
                parent_key,
                clauses,
            } => {
                let mut sql = format!(
                    "EXISTS (SELECT 1 FROM {} WHERE {} = {}",
                    self.wrap(table),
                    self.render_column(related_key),
                    self.render_column(parent_key)
                );
                if !clauses.is_empty() {
                    sql.push_str(" AND (");
                    sql.push_str(&self.render_clauses(clauses, params));
                    sql.push(')');
                }
                sql.push(')');
                sql
            }
        }
    }
}

impl QueryBuilder for SqlBuilder<'_> {
    fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    fn push_where(&mut self, predicate: Predicate) {
        self.push(
            predicate.boolean,
            Condition::Compare {
                column: predicate.column,
                operator: predicate.operator,
                value: predicate.value,
            },
        );
    }

    fn where_in(&mut self, boolean: Boolean, column: Column, values: Vec<SqlValue>) {
        self.push(boolean, Condition::In { column, values });
    }

    fn where_between(&mut self, column: Column, from: SqlValue, to: SqlValue) {
        self.push(Boolean::And, Condition::Between { column, from, to });
    }

    fn where_date(&mut self, column: Column, operator: Operator, value: SqlValue) {
        self.push(
            Boolean::And,
            Condition::DateCompare {
                column,
                operator,
                value,
            },
        );
    }

    fn where_date_between(&mut self, column: Column, from: SqlValue, to: SqlValue) {
        self.push(Boolean::And, Condition::DateBetween { column, from, to });
    }

    fn where_group(&mut self, boolean: Boolean, f: &mut NestedFn<'_>) -> FilterResult<()> {
        let mut group = self.child(self.entity.clone(), self.table.clone());
        f(&mut group)?;
        if !group.clauses.is_empty() {
            self.push(boolean, Condition::Group(group.clauses));
        }
        Ok(())
    }

    fn where_has(&mut self, relation: &str, f: &mut NestedFn<'_>) -> FilterResult<()> {
        let (name, rest) = match relation.split_once('.') {
            Some((name, rest)) => (name, Some(rest)),
            None => (relation, None),
        };

        let schema = self.schema.ok_or_else(|| {
            FilterError::Config(format!(
                "Existence constraint on '{}' requires a builder bound to a schema entity",
                relation
            ))
        })?;
        let parent_name = self.entity.as_deref().unwrap_or_default();
        let parent = schema.entity(parent_name).ok_or_else(|| {
            FilterError::Config(format!("Entity '{}' is not defined in the schema", parent_name))
        })?;
        let def = parent
            .relations
            .get(name)
            .ok_or_else(|| FilterError::unknown_relation(parent_name, name))?;
        let related = schema.entity(&def.entity).ok_or_else(|| {
            FilterError::Config(format!(
                "Relation '{}.{}' points at unknown entity '{}'",
                parent_name, name, def.entity
            ))
        })?;

        let (related_key, parent_key) = match def.kind {
            RelationKind::BelongsTo => (
                def.owner_key.as_deref().unwrap_or(&related.primary_key),
                def.foreign_key.as_str(),
            ),
            RelationKind::HasOne | RelationKind::HasMany => (
                def.foreign_key.as_str(),
                def.local_key.as_deref().unwrap_or(&parent.primary_key),
            ),
        };
        let related_key = Column::Name(format!("{}.{}", related.table, related_key));
        let parent_key = Column::Name(format!("{}.{}", parent.table, parent_key));

        tracing::trace!(relation = name, entity = %def.entity, "Opening existence constraint");

        let mut nested = self.child(Some(def.entity.clone()), Some(related.table.clone()));
        match rest {
            Some(rest) => nested.where_has(rest, f)?,
            None => f(&mut nested)?,
        }

        self.push(
            Boolean::And,
            Condition::Exists {
                table: related.table.clone(),
                related_key,
                parent_key,
                clauses: nested.clauses,
            },
        );
        Ok(())
    }

    fn qualify_column(&self, column: &str) -> String {
        match &self.table {
            Some(table) if !column.contains('.') => format!("{}.{}", table, column),
            _ => column.to_string(),
        }
    }

    fn wrap(&self, identifier: &str) -> String {
        identifier
            .split('.')
            .map(|segment| self.dialect.quote_identifier(segment.trim()))
            .collect::<Vec<_>>()
            .join(".")
    }
}
