//! Entity schema and relation introspection
//!
//! Relation-qualified filters (`author:profile:country`) need to know which
//! names on an entity are relations and how related tables join back to their
//! parent. [`EntityIntrospector`] is that narrow interface; [`Schema`] is the
//! JSON-configurable implementation used by [`SqlBuilder`](crate::data::query::SqlBuilder).

use std::collections::HashMap;

use serde::Deserialize;

/// What a name resolves to on an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind<'a> {
    /// The entity has no such name
    Missing,
    /// A plain attribute (column)
    Attribute,
    /// A relation to another entity
    Relation(&'a RelationDef),
}

/// Reports whether a name on an entity exists and whether it is a relation
pub trait EntityIntrospector: Send + Sync {
    fn describe(&self, entity: &str, method: &str) -> MethodKind<'_>;
}

/// Relation cardinality and key direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Parent row holds `foreign_key` pointing at the related row
    BelongsTo,
    /// Related rows hold `foreign_key` pointing at the parent row
    HasOne,
    HasMany,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelationDef {
    /// Name of the related entity
    pub entity: String,
    pub kind: RelationKind,
    pub foreign_key: String,
    /// Key on the related entity referenced by a `belongs_to` foreign key
    #[serde(default)]
    pub owner_key: Option<String>,
    /// Key on the parent entity referenced by a `has_*` foreign key
    #[serde(default)]
    pub local_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityDef {
    pub table: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub relations: HashMap<String, RelationDef>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl EntityDef {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: default_primary_key(),
            attributes: Vec::new(),
            relations: HashMap::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    pub fn belongs_to(
        self,
        name: impl Into<String>,
        entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relation(name, RelationKind::BelongsTo, entity, foreign_key)
    }

    pub fn has_one(
        self,
        name: impl Into<String>,
        entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relation(name, RelationKind::HasOne, entity, foreign_key)
    }

    pub fn has_many(
        self,
        name: impl Into<String>,
        entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relation(name, RelationKind::HasMany, entity, foreign_key)
    }

    fn relation(
        mut self,
        name: impl Into<String>,
        kind: RelationKind,
        entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relations.insert(
            name.into(),
            RelationDef {
                entity: entity.into(),
                kind,
                foreign_key: foreign_key.into(),
                owner_key: None,
                local_key: None,
            },
        );
        self
    }
}

/// Entity definitions keyed by entity name
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub entities: HashMap<String, EntityDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, name: impl Into<String>, entity: EntityDef) -> Self {
        self.entities.insert(name.into(), entity);
        self
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    pub fn relation(&self, entity: &str, name: &str) -> Option<&RelationDef> {
        self.entity(entity)?.relations.get(name)
    }

    /// Check that every relation points at a defined entity
    pub fn validate(&self) -> Result<(), String> {
        for (entity_name, entity) in &self.entities {
            for (relation_name, relation) in &entity.relations {
                if !self.entities.contains_key(&relation.entity) {
                    return Err(format!(
                        "Relation '{}.{}' points at unknown entity '{}'",
                        entity_name, relation_name, relation.entity
                    ));
                }
            }
        }
        Ok(())
    }
}

impl EntityIntrospector for Schema {
    fn describe(&self, entity: &str, method: &str) -> MethodKind<'_> {
        let Some(def) = self.entity(entity) else {
            return MethodKind::Missing;
        };
        if let Some(relation) = def.relations.get(method) {
            return MethodKind::Relation(relation);
        }
        if def.attributes.iter().any(|a| a == method) {
            return MethodKind::Attribute;
        }
        MethodKind::Missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog_schema() -> Schema {
        Schema::new()
            .with_entity(
                "post",
                EntityDef::new("posts")
                    .attribute("title")
                    .belongs_to("author", "user", "author_id"),
            )
            .with_entity(
                "user",
                EntityDef::new("users")
                    .attribute("name")
                    .has_one("profile", "profile", "user_id"),
            )
            .with_entity("profile", EntityDef::new("profiles").attribute("country"))
    }

    #[test]
    fn test_describe_relation_attribute_missing() {
        let schema = blog_schema();
        assert!(matches!(
            schema.describe("post", "author"),
            MethodKind::Relation(r) if r.entity == "user"
        ));
        assert_eq!(schema.describe("post", "title"), MethodKind::Attribute);
        assert_eq!(schema.describe("post", "nope"), MethodKind::Missing);
        assert_eq!(schema.describe("ghost", "author"), MethodKind::Missing);
    }

    #[test]
    fn test_relation_wins_over_attribute() {
        let schema = Schema::new()
            .with_entity(
                "post",
                EntityDef::new("posts")
                    .attribute("author")
                    .belongs_to("author", "user", "author_id"),
            )
            .with_entity("user", EntityDef::new("users"));
        assert!(matches!(
            schema.describe("post", "author"),
            MethodKind::Relation(_)
        ));
    }

    #[test]
    fn test_schema_from_json() {
        let json = r#"{
            "entities": {
                "post": {
                    "table": "posts",
                    "attributes": ["title"],
                    "relations": {
                        "author": { "entity": "user", "kind": "belongs_to", "foreign_key": "author_id" }
                    }
                },
                "user": { "table": "users", "primary_key": "uid" }
            }
        }"#;
        let schema: Schema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.entity("post").unwrap().primary_key, "id");
        assert_eq!(schema.entity("user").unwrap().primary_key, "uid");
        assert_eq!(
            schema.relation("post", "author").unwrap().kind,
            RelationKind::BelongsTo
        );
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_validate_dangling_relation() {
        let schema = Schema::new().with_entity(
            "post",
            EntityDef::new("posts").belongs_to("author", "user", "author_id"),
        );
        let err = schema.validate().unwrap_err();
        assert!(err.contains("unknown entity 'user'"));
    }
}
