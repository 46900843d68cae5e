//! Structural validation of a schema declaration.
//!
//! Checks the bridge key shape and every channel name, collecting all
//! problems into a single `ConfigError`. Callable-name collisions are
//! checked when the runtime schema is built, since they depend on the
//! name transform.


use crate::schema::SchemaConfig;
use tether_common::ConfigError;

/// Run all validations on a declaration.
///
/// An empty declaration fails with [`ConfigError::NoChannels`] before any
/// other check runs.
pub fn validate(config: &SchemaConfig) -> Result<(), ConfigError> {
    if config.is_empty() {
        return Err(ConfigError::NoChannels);
    }

    if !is_valid_bridge_key(&config.bridge_key) {
        return Err(ConfigError::InvalidBridgeKey(config.bridge_key.clone()));
    }

    let mut errors: Vec<String> = Vec::new();
    validate_channels(&mut errors, "calls", config.calls.keys());
    validate_channels(&mut errors, "events", config.events.keys());

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

/// A bridge key must be usable as a property name on the client global.
pub fn is_valid_bridge_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn validate_channels<'a>(
    errors: &mut Vec<String>,
    section: &str,
    names: impl Iterator<Item = &'a String>,
) {
    for name in names {
        if name.trim().is_empty() {
            errors.push(format!("{section}: channel name must not be blank"));
        } else if name.trim() != name {
            errors.push(format!(
                "{section}.\"{name}\": channel name has surrounding whitespace"
            ));
        } else if !name.chars().any(|c| c.is_alphanumeric()) {
            errors.push(format!(
                "{section}.\"{name}\": channel name needs at least one letter or digit"
            ));
        }
    }
}
