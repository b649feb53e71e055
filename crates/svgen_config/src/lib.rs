//! Parsing of the `svgen.toml` emission switches.
//!
//! Only the `[emit]` table is read; everything else in the file belongs to
//! other tools and is ignored.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::EmitConfig;
