//! Error types for configuration loading.

/// Errors that can occur when loading `svgen.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed or had unknown keys.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("expected a boolean".to_string());
        assert_eq!(
            err.to_string(),
            "failed to parse configuration: expected a boolean"
        );
    }

    #[test]
    fn display_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(ConfigError::IoError(io)
            .to_string()
            .starts_with("failed to read configuration:"));
    }
}
