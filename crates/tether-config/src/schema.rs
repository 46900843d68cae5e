//! Schema declaration types.
//!
//! All fields use `serde(default)` so a declaration only needs the maps it
//! actually uses.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Bridge key used when a declaration does not name one.
pub const DEFAULT_BRIDGE_KEY: &str = "api";

/// On-disk schema declaration.
///
/// Type descriptors are opaque strings: they document a channel's argument
/// and result shapes and are never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Name under which the client surface is installed.
    pub bridge_key: String,
    /// Reject registrations and sends on undeclared channels.
    pub strict: bool,
    /// Request/response channels.
    pub calls: BTreeMap<String, String>,
    /// Host-to-client event channels.
    pub events: BTreeMap<String, String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            bridge_key: DEFAULT_BRIDGE_KEY.into(),
            strict: true,
            calls: BTreeMap::new(),
            events: BTreeMap::new(),
        }
    }
}

impl SchemaConfig {
    pub fn new(bridge_key: impl Into<String>) -> Self {
        Self {
            bridge_key: bridge_key.into(),
            ..Default::default()
        }
    }

    pub fn with_call(mut self, channel: impl Into<String>, descriptor: impl Into<String>) -> Self {
        self.calls.insert(channel.into(), descriptor.into());
        self
    }

    pub fn with_event(mut self, channel: impl Into<String>, descriptor: impl Into<String>) -> Self {
        self.events.insert(channel.into(), descriptor.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.events.is_empty()
    }
}

/// File format of a declaration, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Toml,
    Json,
}

impl SchemaFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_strict_and_empty() {
        let config = SchemaConfig::default();
        assert_eq!(config.bridge_key, "api");
        assert!(config.strict);
        assert!(config.is_empty());
    }

    #[test]
    fn builder_helpers_fill_maps() {
        let config = SchemaConfig::new("bridge")
            .with_call("get-user", "(id) -> User")
            .with_event("user.updated", "(User)");
        assert_eq!(config.bridge_key, "bridge");
        assert_eq!(config.calls.get("get-user").map(String::as_str), Some("(id) -> User"));
        assert!(config.events.contains_key("user.updated"));
        assert!(!config.is_empty());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: SchemaConfig = toml::from_str(
            r#"
[calls]
ping = ""
"#,
        )
        .unwrap();
        assert_eq!(config.bridge_key, "api");
        assert!(config.strict);
        assert_eq!(config.calls.len(), 1);
        assert!(config.events.is_empty());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(SchemaFormat::from_path(Path::new("a/schema.json")), SchemaFormat::Json);
        assert_eq!(SchemaFormat::from_path(Path::new("a/schema.JSON")), SchemaFormat::Json);
        assert_eq!(SchemaFormat::from_path(Path::new("a/schema.toml")), SchemaFormat::Toml);
        assert_eq!(SchemaFormat::from_path(Path::new("a/schema")), SchemaFormat::Toml);
    }
}
