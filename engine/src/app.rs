//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, CRATE_TARGET, ENV_LOG};
use crate::data::query::{QueryBuilder, SqlBuilder, SqlParams};
use crate::domain::filters::{FilterEngine, FilterRequest};
use crate::domain::schema::Schema;
use crate::utils::file::read_input;

/// A compiled WHERE fragment with its ordered parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledFilter {
    pub sql: String,
    pub params: Vec<String>,
}

pub struct CoreApp;

impl CoreApp {
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let config = AppConfig::load(&cli_config)?;

        match command.unwrap_or(Commands::Compile) {
            Commands::Check => {
                Self::print_summary(&config);
                Ok(())
            }
            Commands::Compile => Self::compile_and_print(&config, &cli_config),
        }
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", CRATE_TARGET);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    fn compile_and_print(config: &AppConfig, cli: &CliConfig) -> Result<()> {
        let input = read_input(&cli.request)?;
        let compiled = Self::compile(config, &input)?;

        if cli.json {
            let json = serde_json::to_string_pretty(&compiled)
                .context("Failed to serialize compiled filter")?;
            println!("{}", json);
        } else {
            println!("{}", compiled.sql);
            for (i, param) in compiled.params.iter().enumerate() {
                println!("-- ${} = {}", i + 1, param);
            }
        }
        Ok(())
    }

    /// Compile a JSON filter request against the configured dialect and entity
    pub fn compile(config: &AppConfig, request_json: &str) -> Result<CompiledFilter> {
        let request =
            FilterRequest::from_json_str(request_json).context("Failed to parse filter request")?;

        let schema: Option<Arc<Schema>> = config.schema.clone().map(Arc::new);
        let dialect = config.backend.dialect();
        let mut builder = match (&config.entity, &schema) {
            (Some(entity), Some(schema)) => SqlBuilder::for_entity(dialect, schema, entity)?,
            _ => SqlBuilder::new(dialect),
        };

        let mut engine = FilterEngine::new(config.filters.clone());
        if let Some(schema) = &schema {
            engine = engine.with_introspector(schema.clone());
        }

        if let Err(e) = engine.dispatcher(&mut builder).apply(&request) {
            if e.is_input_error() {
                return Err(anyhow::Error::new(e).context("Invalid filter request"));
            }
            return Err(e.into());
        }

        let mut params = SqlParams::default();
        let sql = builder.to_sql(&mut params);
        tracing::debug!(
            dialect = %config.backend,
            entity = ?builder.entity(),
            params = params.values.len(),
            "Compiled filter request"
        );

        Ok(CompiledFilter {
            sql,
            params: params.values,
        })
    }

    fn print_summary(config: &AppConfig) {
        let entities = config.schema.as_ref().map_or(0, |s| s.entities.len());
        println!("{} configuration", APP_NAME);
        println!("  dialect:  {}", config.backend);
        println!(
            "  entity:   {}",
            config.entity.as_deref().unwrap_or("(none)")
        );
        println!(
            "  filters:  {} ({} typed)",
            config.filters.filters.len(),
            config.typed_columns()
        );
        println!("  aliases:  {}", config.filters.aliases.len());
        println!("  entities: {}", entities);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sql::Backend;
    use crate::domain::filters::{FilterConfig, FilterType};
    use crate::domain::schema::EntityDef;

    fn config(backend: Backend) -> AppConfig {
        AppConfig {
            backend,
            entity: None,
            filters: FilterConfig::new().with_filter("title", FilterType::Like),
            schema: None,
        }
    }

    #[test]
    fn test_compile_plain_request() {
        let compiled = CoreApp::compile(
            &config(Backend::Sqlite),
            r#"{"filter": {"title": ["rust"], "status": "draft"}}"#,
        )
        .unwrap();
        assert_eq!(compiled.sql, r#""title" LIKE ? AND "status" = ?"#);
        assert_eq!(compiled.params, vec!["%rust%", "draft"]);
    }

    #[test]
    fn test_compile_with_entity_schema() {
        let mut config = config(Backend::Postgres);
        config.entity = Some("post".to_string());
        config.schema = Some(
            Schema::new()
                .with_entity(
                    "post",
                    EntityDef::new("posts").belongs_to("author", "user", "author_id"),
                )
                .with_entity("user", EntityDef::new("users").attribute("name")),
        );

        let compiled =
            CoreApp::compile(&config, r#"{"filter": {"author:name": "al"}}"#).unwrap();
        assert_eq!(
            compiled.sql,
            r#"EXISTS (SELECT 1 FROM "users" WHERE "users"."id" = "posts"."author_id" AND ("users"."name" = $1))"#
        );
        assert_eq!(compiled.params, vec!["al"]);
    }

    #[test]
    fn test_compile_rejects_non_object() {
        let err = CoreApp::compile(&config(Backend::Postgres), "[1, 2]").unwrap_err();
        assert!(format!("{:#}", err).contains("must be a JSON object"));

        let err = CoreApp::compile(&config(Backend::Postgres), "{").unwrap_err();
        assert!(err.to_string().contains("Failed to parse filter request"));
    }

    #[test]
    fn test_compile_propagates_filter_errors() {
        let err = CoreApp::compile(
            &config(Backend::Postgres),
            r#"{"date": {"created_at": "not a date"}}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid filter request");
        assert!(format!("{:#}", err).contains("Invalid time value"));

        let err = CoreApp::compile(
            &config(Backend::Postgres),
            r#"{"scope": {"ghost": true}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_compiled_filter_json_shape() {
        let compiled = CompiledFilter {
            sql: "\"a\" = $1".to_string(),
            params: vec!["1".to_string()],
        };
        let json = serde_json::to_value(&compiled).unwrap();
        assert_eq!(json["sql"], "\"a\" = $1");
        assert_eq!(json["params"][0], "1");
    }
}
