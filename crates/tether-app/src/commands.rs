//! Schema file commands: `check` and `script`.

use std::fmt::Write;
use std::path::Path;

use tether_bridge::{client_init_script, Schema};
use tether_common::{BridgeError, ConfigError};
use tether_config::SchemaConfig;

pub fn check(path: Option<&Path>) -> Result<(), BridgeError> {
    let schema = load_schema(path)?;
    print!("{}", render_tables(&schema));
    Ok(())
}

pub fn script(path: Option<&Path>) -> Result<(), BridgeError> {
    let schema = load_schema(path)?;
    print!("{}", client_init_script(&schema));
    Ok(())
}

fn load_schema(path: Option<&Path>) -> Result<Schema, ConfigError> {
    let config: SchemaConfig = match path {
        Some(path) => tether_config::load_from_path(path)?,
        None => tether_config::load_default()?,
    };
    Schema::from_config(config)
}

/// Human-readable listing of both name tables.
pub fn render_tables(schema: &Schema) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "bridge key: {} ({})",
        schema.bridge_key(),
        if schema.is_strict() { "strict" } else { "loose" }
    );

    let _ = writeln!(out, "calls:");
    for spec in schema.calls().iter() {
        let _ = writeln!(out, "  {:<28} {:<24} {}", spec.channel, spec.callable, spec.descriptor);
    }

    let _ = writeln!(out, "events:");
    for (name, spec) in schema.subscribe_names() {
        let _ = writeln!(out, "  {:<28} {:<24} {}", spec.channel, name, spec.descriptor);
    }
    out
}
