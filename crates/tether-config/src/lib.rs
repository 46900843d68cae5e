//! Tether schema declaration files.
//!
//! A schema declares a bridge key plus two independent maps of channel
//! name to type descriptor: request/response `calls` and fire-and-forget
//! `events`. Declarations are written in TOML (or JSON), e.g.
//!
//! ```toml
//! bridge_key = "api"
//!
//! [calls]
//! "get-user" = "(id: string) -> User"
//!
//! [events]
//! "user.updated" = "(user: User)"
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tether_config::load_from_path;
//!
//! let schema = load_from_path(std::path::Path::new("schema.toml")).expect("bad schema");
//! println!("{} call channels", schema.calls.len());
//! ```

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{create_default_schema, default_schema_path, load_default, load_from_path};
pub use schema::{SchemaConfig, SchemaFormat, DEFAULT_BRIDGE_KEY};
pub use validation::validate;
