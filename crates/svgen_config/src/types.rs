//! Configuration types deserialized from `svgen.toml`.

use serde::{Deserialize, Serialize};

/// The switches that change what the emitter prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmitConfig {
    /// Drop declarations of non-array constants whose every use was
    /// replaced with the literal value.
    #[serde(default = "default_true")]
    pub remove_const_decl: bool,
    /// Emit clocked threads as an `always_comb` next-state function plus an
    /// `always_ff` register update instead of a single edge-sensitive block.
    #[serde(default = "default_true")]
    pub split_threads: bool,
    /// Keep every signal, variable, and assignment regardless of liveness.
    #[serde(default)]
    pub keep_all: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            remove_const_decl: true,
            split_threads: true,
            keep_all: false,
        }
    }
}

/// Top-level file shape; other tables are tolerated and ignored.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConfigFile {
    #[serde(default)]
    pub(crate) emit: EmitConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = EmitConfig::default();
        assert!(c.remove_const_decl);
        assert!(c.split_threads);
        assert!(!c.keep_all);
    }

    #[test]
    fn serde_json_roundtrip() {
        let c = EmitConfig {
            remove_const_decl: false,
            split_threads: false,
            keep_all: true,
        };
        let json = serde_json::to_string(&c).unwrap();
        let back: EmitConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
