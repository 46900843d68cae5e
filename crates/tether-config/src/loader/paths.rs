//! Schema path resolution and default file creation.

use std::path::{Path, PathBuf};

use tether_common::ConfigError;
use tracing::info;

use super::template::default_schema_toml;

/// Get the platform-specific default schema file path.
pub fn default_schema_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("tether").join("schema.toml"))
}

/// Create a starter schema file with documentation comments.
pub fn create_default_schema(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create schema directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    std::fs::write(path, default_schema_toml()).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write default schema to {}: {e}",
            path.display()
        ))
    })?;

    info!("created default schema at {}", path.display());
    Ok(())
}
