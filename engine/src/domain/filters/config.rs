//! Column type and alias maps, configured once per builder

use std::collections::HashMap;

use serde::Deserialize;

use super::types::FilterType;

/// Read-only filter configuration
///
/// `filters` maps a column to its declared [`FilterType`] (consulted only by
/// the `filter` directive). `aliases` maps an alias to its canonical column
/// name (consulted when resolving dotted column references).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub filters: HashMap<String, FilterType>,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw tag strings; unknown tags resolve to [`FilterType::Exact`]
    pub fn from_tags<I, K, V>(tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let filters = tags
            .into_iter()
            .map(|(column, tag)| (column.into(), FilterType::from(tag.into())))
            .collect();
        Self {
            filters,
            aliases: HashMap::new(),
        }
    }

    pub fn with_filter(mut self, column: impl Into<String>, ty: FilterType) -> Self {
        self.filters.insert(column.into(), ty);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>, column: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), column.into());
        self
    }

    pub fn column_type(&self, column: &str) -> Option<FilterType> {
        self.filters.get(column).copied()
    }

    /// Canonical name for an aliased column, or the name itself
    pub fn resolve_alias<'a>(&'a self, column: &'a str) -> &'a str {
        self.aliases.get(column).map(String::as_str).unwrap_or(column)
    }
}
