//! Configuration file loading.

use crate::error::ConfigError;
use crate::types::{ConfigFile, EmitConfig};
use std::path::Path;

/// File name looked up inside a project directory.
pub const CONFIG_FILE_NAME: &str = "svgen.toml";

/// Loads `<project_dir>/svgen.toml`.
pub fn load_config(project_dir: &Path) -> Result<EmitConfig, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join(CONFIG_FILE_NAME))?;
    load_config_from_str(&content)
}

/// Parses the emission switches from TOML text.
pub fn load_config_from_str(content: &str) -> Result<EmitConfig, ConfigError> {
    let file: ConfigFile =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    Ok(file.emit)
}
