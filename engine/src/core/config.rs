use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::sql::Backend;
use crate::domain::filters::{FilterConfig, FilterType};
use crate::domain::schema::Schema;
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME};

/// File-based configuration (JSON)
///
/// ```json
/// {
///   "dialect": "postgres",
///   "entity": "post",
///   "filters": { "created_at": "datetime", "title": "like" },
///   "aliases": { "created": "created_at" },
///   "schema": { "entities": { "post": { "table": "posts" } } }
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub dialect: Option<Backend>,
    pub entity: Option<String>,
    /// Column → filter type tag
    pub filters: Option<HashMap<String, String>>,
    /// Alias → canonical column
    pub aliases: Option<HashMap<String, String>>,
    pub schema: Option<Schema>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    ///
    /// Scalars and the schema are replaced; the filter and alias maps are
    /// merged key by key.
    fn merge(&mut self, other: FileConfig) {
        if other.dialect.is_some() {
            tracing::trace!(dialect = ?other.dialect, "Merging dialect");
            self.dialect = other.dialect;
        }
        if other.entity.is_some() {
            tracing::trace!(entity = ?other.entity, "Merging entity");
            self.entity = other.entity;
        }
        if let Some(filters) = other.filters {
            tracing::trace!(count = filters.len(), "Merging filters");
            self.filters.get_or_insert_with(HashMap::new).extend(filters);
        }
        if let Some(aliases) = other.aliases {
            tracing::trace!(count = aliases.len(), "Merging aliases");
            self.aliases.get_or_insert_with(HashMap::new).extend(aliases);
        }
        if other.schema.is_some() {
            tracing::trace!("Merging schema");
            self.schema = other.schema;
        }
    }
}

/// Resolved settings for one compilation
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: Backend,
    pub entity: Option<String>,
    pub filters: FilterConfig,
    pub schema: Option<Schema>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.filterc/filterc.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_layered(cli, get_profile_config_path())
    }

    fn load_layered(cli: &CliConfig, profile_path: Option<PathBuf>) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Profile dir, skipped if absent
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Layer: defaults -> file config -> CLI/env overrides
        let backend = cli.dialect.or(file_config.dialect).unwrap_or_default();
        let entity = cli.entity.clone().or(file_config.entity);

        // Type tags resolve once here; unknown tags become exact matches
        let mut filters = FilterConfig::from_tags(file_config.filters.unwrap_or_default());
        filters.aliases = file_config.aliases.unwrap_or_default();

        let config = Self {
            backend,
            entity,
            filters,
            schema: file_config.schema,
        };
        config.validate()?;

        tracing::debug!(
            dialect = %config.backend,
            entity = ?config.entity,
            filters = config.filters.filters.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Validate the configuration for consistency
    fn validate(&self) -> Result<()> {
        if let Some(schema) = &self.schema {
            schema
                .validate()
                .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
        }

        if let Some(entity) = &self.entity {
            let Some(schema) = &self.schema else {
                anyhow::bail!(
                    "Configuration error: entity '{}' requires a schema",
                    entity
                );
            };
            if schema.entity(entity).is_none() {
                anyhow::bail!(
                    "Configuration error: entity '{}' is not defined in the schema",
                    entity
                );
            }
        }

        Ok(())
    }

    /// Number of columns with a non-default filter type
    pub fn typed_columns(&self) -> usize {
        self.filters
            .filters
            .values()
            .filter(|ty| **ty != FilterType::Exact)
            .count()
    }
}

/// Get the profile config path (~/.filterc/filterc.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    fn cli_with(path: &Path) -> CliConfig {
        CliConfig {
            config: Some(path.to_path_buf()),
            ..CliConfig::default()
        }
    }

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "dialect": "sqlite",
            "entity": "post",
            "filters": { "created_at": "datetime" },
            "aliases": { "created": "created_at" },
            "schema": { "entities": { "post": { "table": "posts" } } }
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.dialect, Some(Backend::Sqlite));
        assert_eq!(config.entity.as_deref(), Some("post"));
        assert_eq!(config.filters.unwrap()["created_at"], "datetime");
        assert_eq!(config.aliases.unwrap()["created"], "created_at");
        assert!(config.schema.unwrap().entity("post").is_some());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "dialect": "duckdb", "dialekt": "oops" }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.dialect, Some(Backend::Duckdb));
        assert_eq!(config.extra.get("dialekt").unwrap(), "oops");
    }

    #[test]
    fn test_file_config_merge() {
        let mut base: FileConfig = serde_json::from_str(
            r#"{
                "dialect": "sqlite",
                "entity": "post",
                "filters": { "a": "date", "b": "like" }
            }"#,
        )
        .unwrap();
        let overlay: FileConfig = serde_json::from_str(
            r#"{
                "dialect": "clickhouse",
                "filters": { "b": "left", "c": "unix" },
                "aliases": { "x": "y" }
            }"#,
        )
        .unwrap();
        base.merge(overlay);

        assert_eq!(base.dialect, Some(Backend::Clickhouse));
        assert_eq!(base.entity.as_deref(), Some("post"));
        let filters = base.filters.unwrap();
        assert_eq!(filters["a"], "date");
        assert_eq!(filters["b"], "left");
        assert_eq!(filters["c"], "unix");
        assert_eq!(base.aliases.unwrap()["x"], "y");
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::load_layered(&CliConfig::default(), None).unwrap();
        assert_eq!(config.backend, Backend::Postgres);
        assert!(config.entity.is_none());
        assert!(config.schema.is_none());
    }

    #[test]
    fn test_app_config_from_file_resolves_tags() {
        let file = write_config(
            r#"{ "dialect": "duckdb", "filters": { "created_at": "timestamp", "body": "???" } }"#,
        );
        let config = AppConfig::load_layered(&cli_with(file.path()), None).unwrap();

        assert_eq!(config.backend, Backend::Duckdb);
        assert_eq!(
            config.filters.column_type("created_at"),
            Some(FilterType::Datetime)
        );
        assert_eq!(config.filters.column_type("body"), Some(FilterType::Exact));
        assert_eq!(config.typed_columns(), 1);
    }

    #[test]
    fn test_app_config_profile_then_overlay_then_cli() {
        let profile = write_config(r#"{ "dialect": "sqlite", "filters": { "a": "date" } }"#);
        let overlay = write_config(r#"{ "filters": { "b": "like" } }"#);
        let mut cli = cli_with(overlay.path());

        let config =
            AppConfig::load_layered(&cli, Some(profile.path().to_path_buf())).unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.filters.column_type("a"), Some(FilterType::Date));
        assert_eq!(config.filters.column_type("b"), Some(FilterType::Like));

        cli.dialect = Some(Backend::Clickhouse);
        let config =
            AppConfig::load_layered(&cli, Some(profile.path().to_path_buf())).unwrap();
        assert_eq!(config.backend, Backend::Clickhouse);
    }

    #[test]
    fn test_app_config_missing_file() {
        let cli = cli_with(Path::new("/definitely/not/here/filterc.json"));
        let err = AppConfig::load_layered(&cli, None).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_app_config_invalid_json() {
        let file = write_config("{ not json");
        let err = AppConfig::load_layered(&cli_with(file.path()), None).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_app_config_validation_entity_requires_schema() {
        let cli = CliConfig {
            entity: Some("post".to_string()),
            ..CliConfig::default()
        };
        let err = AppConfig::load_layered(&cli, None).unwrap_err();
        assert!(err.to_string().contains("requires a schema"));
    }

    #[test]
    fn test_app_config_validation_unknown_entity() {
        let file = write_config(
            r#"{ "entity": "comment", "schema": { "entities": { "post": { "table": "posts" } } } }"#,
        );
        let err = AppConfig::load_layered(&cli_with(file.path()), None).unwrap_err();
        assert!(err.to_string().contains("not defined in the schema"));
    }

    #[test]
    fn test_app_config_validation_dangling_relation() {
        let file = write_config(
            r#"{ "schema": { "entities": { "post": {
                "table": "posts",
                "relations": { "author": { "entity": "user", "kind": "belongs_to", "foreign_key": "author_id" } }
            } } } }"#,
        );
        let err = AppConfig::load_layered(&cli_with(file.path()), None).unwrap_err();
        assert!(err.to_string().contains("unknown entity 'user'"));
    }
}
