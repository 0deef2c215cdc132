//! Relation-qualified column filters (`author:profile:country`)
//!
//! A colon path whose first segment is a relation on the builder's entity
//! becomes an existence constraint along the relation chain. Inside that
//! constraint the leaf column is qualified with the related table and
//! resolved again. The set of already-qualified paths travels with the
//! recursion so a qualified leaf is never descended twice.

use std::collections::HashSet;

use serde_json::Value;

use crate::data::error::FilterResult;
use crate::data::query::{Boolean, Column, Operator, QueryBuilder};
use crate::domain::schema::{EntityIntrospector, MethodKind};
use crate::utils::string::to_method_name;

use super::matching::compare;

/// Paths already qualified inside an existence constraint
pub type ResolvedPaths = HashSet<String>;

pub struct RelationPathResolver<'a> {
    introspector: &'a dyn EntityIntrospector,
    operator: Operator,
}

impl<'a> RelationPathResolver<'a> {
    pub fn new(introspector: &'a dyn EntityIntrospector, operator: Operator) -> Self {
        Self {
            introspector,
            operator,
        }
    }

    /// Constrain `builder` on `property` with a fresh resolution chain
    pub fn resolve(
        &self,
        builder: &mut dyn QueryBuilder,
        value: &Value,
        property: &str,
    ) -> FilterResult<()> {
        let mut resolved = ResolvedPaths::new();
        self.resolve_with(builder, value, property, &mut resolved)
    }

    /// Constrain `builder` on `property`, treating paths in `resolved` as literal columns
    pub fn resolve_with(
        &self,
        builder: &mut dyn QueryBuilder,
        value: &Value,
        property: &str,
        resolved: &mut ResolvedPaths,
    ) -> FilterResult<()> {
        if self.is_relation_path(&*builder, property, resolved) {
            return self.constrain_relation(builder, value, property, resolved);
        }

        if property.contains('|') {
            let operator = self.operator;
            return builder.where_group(Boolean::And, &mut |q| {
                for column in property.split('|') {
                    let qualified = Column::Name(q.qualify_column(column.trim()));
                    compare(q, Boolean::Or, qualified, operator, value);
                }
                Ok(())
            });
        }

        let qualified = Column::Name(builder.qualify_column(property));
        compare(builder, Boolean::And, qualified, self.operator, value);
        Ok(())
    }

    fn is_relation_path(
        &self,
        builder: &dyn QueryBuilder,
        property: &str,
        resolved: &ResolvedPaths,
    ) -> bool {
        if !property.contains(':') || resolved.contains(property) {
            return false;
        }
        let Some(entity) = builder.entity() else {
            return false;
        };
        let first = property.split(':').next().unwrap_or_default();
        matches!(
            self.introspector.describe(entity, &to_method_name(first)),
            MethodKind::Relation(_)
        )
    }

    fn constrain_relation(
        &self,
        builder: &mut dyn QueryBuilder,
        value: &Value,
        property: &str,
        resolved: &mut ResolvedPaths,
    ) -> FilterResult<()> {
        let mut segments: Vec<&str> = property.split(':').collect();
        let leaf = segments.pop().unwrap_or_default();
        if leaf.trim().is_empty() {
            tracing::trace!(property, "Relation path without a column, skipped");
            return Ok(());
        }
        let relation = segments
            .iter()
            .map(|s| to_method_name(s))
            .collect::<Vec<_>>()
            .join(".");

        tracing::trace!(relation = %relation, leaf, "Constraining on related rows");

        builder.where_has(&relation, &mut |q| {
            let qualified = qualify_leaf(&*q, leaf);
            resolved.insert(qualified.clone());
            self.resolve_with(q, value, &qualified, resolved)
        })
    }
}

/// Qualify a leaf column, or each of its pipe alternatives
fn qualify_leaf(builder: &dyn QueryBuilder, leaf: &str) -> String {
    leaf.split('|')
        .map(|column| builder.qualify_column(column.trim()))
        .collect::<Vec<_>>()
        .join("|")
}
