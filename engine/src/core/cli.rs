use clap::{Parser, Subcommand};

use std::path::PathBuf;

use crate::data::sql::Backend;

use super::constants::{
    DEFAULT_REQUEST_SOURCE, ENV_CONFIG, ENV_DIALECT, ENV_ENTITY, ENV_REQUEST,
};

#[derive(Parser)]
#[command(name = "filterc")]
#[command(version, about = "Compile filter requests into SQL WHERE clauses", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// SQL dialect (postgres, sqlite, duckdb or clickhouse)
    #[arg(long, short = 'd', global = true, env = ENV_DIALECT, value_parser = parse_backend)]
    pub dialect: Option<Backend>,

    /// Entity the request filters (enables relation paths)
    #[arg(long, short = 'e', global = true, env = ENV_ENTITY)]
    pub entity: Option<String>,

    /// Request JSON file, or `-` for stdin
    #[arg(long, short = 'r', global = true, env = ENV_REQUEST, default_value = DEFAULT_REQUEST_SOURCE)]
    pub request: String,

    /// Print the result as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Parse SQL dialect from CLI/env string
fn parse_backend(s: &str) -> Result<Backend, String> {
    Backend::parse(s).ok_or_else(|| {
        format!(
            "Invalid dialect '{}'. Valid options: postgres, sqlite, duckdb, clickhouse",
            s
        )
    })
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Compile a filter request (default command)
    Compile,
    /// Load and validate the configuration, then print a summary
    Check,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub dialect: Option<Backend>,
    pub entity: Option<String>,
    pub request: String,
    pub json: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            config: None,
            dialect: None,
            entity: None,
            request: DEFAULT_REQUEST_SOURCE.to_string(),
            json: false,
        }
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        dialect: cli.dialect,
        entity: cli.entity,
        request: cli.request,
        json: cli.json,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!(parse_backend("pgsql"), Ok(Backend::Postgres));
        assert_eq!(parse_backend("DuckDB"), Ok(Backend::Duckdb));
        assert!(parse_backend("oracle").unwrap_err().contains("Invalid dialect"));
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "filterc",
            "--dialect",
            "sqlite",
            "-e",
            "post",
            "--request",
            "req.json",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.dialect, Some(Backend::Sqlite));
        assert_eq!(cli.entity.as_deref(), Some("post"));
        assert_eq!(cli.request, "req.json");
        assert!(cli.json);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_subcommand_with_global_flag() {
        let cli = Cli::try_parse_from(["filterc", "check", "--config", "custom.json"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Check));
        assert_eq!(cli.config, Some(PathBuf::from("custom.json")));
    }
}
