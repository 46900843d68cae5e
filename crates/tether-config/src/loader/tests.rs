//! Tests for schema loading, creation, and path resolution.

use super::*;
use crate::schema::SchemaFormat;
use std::path::Path;
use tether_common::ConfigError;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let path = Path::new("/tmp/nonexistent_tether_schema.toml");
    let err = load_from_path(path).unwrap_err();
    assert_eq!(err, ConfigError::FileNotFound(path.to_path_buf()));
}

#[test]
fn load_valid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.toml");
    std::fs::write(
        &path,
        r#"
bridge_key = "bridge"

[calls]
"get-user" = "(id: string) -> User"
"user.get-data" = "() -> Data"

[events]
"user.updated" = "(user: User)"
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.bridge_key, "bridge");
    assert!(config.strict);
    assert_eq!(config.calls.len(), 2);
    assert_eq!(
        config.events.get("user.updated").map(String::as_str),
        Some("(user: User)")
    );
}

#[test]
fn load_valid_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.json");
    std::fs::write(
        &path,
        r#"{"bridge_key": "api", "strict": false, "calls": {"ping": ""}}"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert!(!config.strict);
    assert!(config.calls.contains_key("ping"));
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn load_empty_schema_is_no_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.toml");
    std::fs::write(&path, "bridge_key = \"api\"\n").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert_eq!(err, ConfigError::NoChannels);
}

#[test]
fn parse_str_rejects_bad_bridge_key() {
    let err = parse_str("bridge_key = \"a b\"\n[calls]\nping = \"\"\n", SchemaFormat::Toml)
        .unwrap_err();
    assert_eq!(err, ConfigError::InvalidBridgeKey("a b".into()));
}

#[test]
fn default_template_parses_and_validates() {
    let config = parse_str(template::default_schema_toml(), SchemaFormat::Toml).unwrap();
    assert_eq!(config.bridge_key, "api");
    assert!(config.calls.contains_key("ping"));
}

#[test]
fn create_default_schema_writes_loadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("schema.toml");

    create_default_schema(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert!(config.calls.contains_key("ping"));
}

#[test]
fn default_schema_path_ends_with_tether() {
    if let Ok(path) = default_schema_path() {
        assert!(path.ends_with("tether/schema.toml"));
    }
}
