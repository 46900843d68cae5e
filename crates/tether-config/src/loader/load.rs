//! Core schema loading: read from path or platform default.

use std::path::Path;

use tether_common::ConfigError;
use tracing::info;

use crate::schema::{SchemaConfig, SchemaFormat};
use crate::validation;

use super::paths::{create_default_schema, default_schema_path};

/// Parse a declaration from text in the given format and validate it.
pub fn parse_str(content: &str, format: SchemaFormat) -> Result<SchemaConfig, ConfigError> {
    let config: SchemaConfig = match format {
        SchemaFormat::Toml => toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?,
        SchemaFormat::Json => serde_json::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("failed to parse JSON: {e}")))?,
    };

    validation::validate(&config)?;
    Ok(config)
}

/// Load a declaration from a file path.
///
/// The format follows the extension (`.json` is JSON, anything else TOML).
/// An invalid declaration is an error: a bridge built from a partial
/// schema would expose a surface that silently lacks channels.
pub fn load_from_path(path: &Path) -> Result<SchemaConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config = parse_str(&content, SchemaFormat::from_path(path))?;

    info!(
        calls = config.calls.len(),
        events = config.events.len(),
        "loaded schema from {}",
        path.display()
    );
    Ok(config)
}

/// Load the declaration from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/tether/schema.toml`
/// On Linux: `~/.config/tether/schema.toml`
///
/// If the file does not exist, a starter schema is written and loaded.
pub fn load_default() -> Result<SchemaConfig, ConfigError> {
    let path = default_schema_path()?;

    if !path.exists() {
        info!("no schema found at {}, creating default", path.display());
        create_default_schema(&path)?;
    }

    load_from_path(&path)
}
