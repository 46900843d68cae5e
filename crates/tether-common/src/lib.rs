pub mod errors;
pub mod id;

pub use errors::{BridgeError, ConfigError, ImplementationError};
pub use id::{new_correlation_id, Generation, GenerationCounter, ListenerId};

pub type Result<T> = std::result::Result<T, BridgeError>;
