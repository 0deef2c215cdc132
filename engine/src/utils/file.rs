//! File and input helpers for the command-line front end

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Input source name meaning standard input
pub const STDIN_SOURCE: &str = "-";

/// Expand `~`, `~/path` and relative paths into an absolute path
///
/// ```text
/// expand_path("~/.filterc/filterc.json") // -> /home/user/.filterc/filterc.json
/// expand_path("request.json")            // -> /current/dir/request.json
/// expand_path("/etc/filterc.json")       // -> /etc/filterc.json
/// ```
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();
    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = match path.strip_prefix('~') {
        Some("") => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => dirs::home_dir()
            .map(|home| home.join(&rest[1..]))
            .unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

/// Read a whole input, from standard input when `source` is `-`
pub fn read_input(source: &str) -> Result<String> {
    if source.trim() == STDIN_SOURCE {
        tracing::debug!("Reading input from stdin");
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read from stdin")?;
        return Ok(content);
    }

    let path = expand_path(source);
    tracing::debug!(path = %path.display(), "Reading input file");
    fs::read_to_string(&path).with_context(|| format!("Failed to read file: {}", path.display()))
}
