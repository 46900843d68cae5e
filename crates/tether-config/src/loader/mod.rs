//! Schema declaration file loading and creation.

mod load;
mod paths;
mod template;

#[cfg(test)]
mod tests;

pub use load::{load_default, load_from_path, parse_str};
pub use paths::{create_default_schema, default_schema_path};
