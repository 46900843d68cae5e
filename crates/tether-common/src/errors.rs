use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ConfigError {
    #[error("no channels declared: a schema needs at least one call or event channel")]
    NoChannels,

    #[error("bridge '{0}' is not installed in this process")]
    BridgeNotInstalled(String),

    #[error("invalid bridge key '{0}'")]
    InvalidBridgeKey(String),

    #[error("channel '{0}' has no alphanumeric characters to build a callable name from")]
    EmptyCallableName(String),

    #[error("{namespace} channels '{first}' and '{second}' both map to callable '{callable}'")]
    NameCollision {
        namespace: String,
        callable: String,
        first: String,
        second: String,
    },

    #[error("schema file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("schema parse error: {0}")]
    ParseError(String),

    #[error("schema validation error: {0}")]
    ValidationError(String),
}

/// Failure raised by a host-side implementation.
///
/// Travels back to the caller exactly as the handler produced it.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ImplementationError {
    pub message: String,
    /// Absent on the wire when `None`; an explicit `null` stays `Some(Null)`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub data: Option<serde_json::Value>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl ImplementationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    /// Attach a structured payload alongside the message.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("no handler registered for channel '{0}'")]
    NotRegistered(String),

    #[error(transparent)]
    Implementation(#[from] ImplementationError),

    #[error("dispatcher attachment error: {0}")]
    DispatcherAttachment(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl BridgeError {
    /// Whether the error originated inside a host implementation.
    pub fn is_implementation(&self) -> bool {
        matches!(self, BridgeError::Implementation(_))
    }
}
