// config.rs: Server configuration.
//
// ServerConfig is built once at startup and handed to FileServer by value.
// It is assembled from up to four layers, highest precedence first:
// command-line flags, environment variables, an optional TOML file, and
// built-in defaults. Each layer is a ConfigLayer with every field optional;
// `ConfigLayer::or` stacks them and `finish` produces the final config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::GatewayError;

/// Environment variable naming the served root directory.
pub const ROOT_ENV: &str = "FILES_DIR";

/// Environment variable enabling the mutating tools (`true` or `1`).
pub const WRITES_ENV: &str = "ALLOW_EDITING";

/// Final configuration for the file server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Directory every tool call is confined to.
    pub root: PathBuf,

    /// Whether write_file, create_directory and move_file are exposed.
    #[serde(default)]
    pub allow_writes: bool,
}

impl ServerConfig {
    /// Read-only config for `root`.
    pub fn for_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            allow_writes: false,
        }
    }

    /// Set the write-enable flag.
    pub fn with_writes(mut self, allow_writes: bool) -> Self {
        self.allow_writes = allow_writes;
        self
    }
}

/// One configuration source with every setting optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigLayer {
    pub root: Option<PathBuf>,
    pub allow_writes: Option<bool>,
}

impl ConfigLayer {
    /// Read the layer from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the environment layer from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            root: lookup(ROOT_ENV)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            allow_writes: lookup(WRITES_ENV).and_then(|v| parse_write_flag(&v)),
        }
    }

    /// Parse a TOML config file.
    pub fn from_toml_str(source: &str, origin: &Path) -> Result<Self, GatewayError> {
        toml::from_str(source).map_err(|source| GatewayError::Config {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load a TOML config file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GatewayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Fill unset fields from a lower-precedence layer.
    pub fn or(self, lower: ConfigLayer) -> Self {
        Self {
            root: self.root.or(lower.root),
            allow_writes: self.allow_writes.or(lower.allow_writes),
        }
    }

    /// Produce the final config. A root is mandatory; writes default to off.
    pub fn finish(self) -> Result<ServerConfig, GatewayError> {
        let root = self.root.ok_or(GatewayError::MissingRoot)?;
        Ok(ServerConfig::for_root(root).with_writes(self.allow_writes.unwrap_or(false)))
    }
}

/// Interpret the write-enable variable.
///
/// Only `true` and `1` enable writes and only `false` and `0` disable them.
/// Anything else leaves the setting to lower layers.
pub fn parse_write_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        other => {
            warn!(variable = WRITES_ENV, value = other, "ignoring unrecognised value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> ConfigLayer {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigLayer::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn write_flag_accepts_only_true_and_one() {
        assert_eq!(parse_write_flag("true"), Some(true));
        assert_eq!(parse_write_flag(" 1 "), Some(true));
        assert_eq!(parse_write_flag("false"), Some(false));
        assert_eq!(parse_write_flag("0"), Some(false));
        assert_eq!(parse_write_flag("yes"), None);
        assert_eq!(parse_write_flag("TRUE"), None);
        assert_eq!(parse_write_flag(""), None);
    }

    #[test]
    fn unrecognised_write_flag_defers_to_config_file() {
        let file = ConfigLayer {
            root: Some(PathBuf::from("/file")),
            allow_writes: Some(true),
        };
        let config = env(&[(WRITES_ENV, "yes")]).or(file.clone()).finish().unwrap();
        assert!(config.allow_writes);

        let config = env(&[(WRITES_ENV, "0")]).or(file).finish().unwrap();
        assert!(!config.allow_writes);
    }

    #[test]
    fn env_layer_reads_both_variables() {
        let layer = env(&[(ROOT_ENV, "/srv/docs"), (WRITES_ENV, "1")]);
        assert_eq!(layer.root, Some(PathBuf::from("/srv/docs")));
        assert_eq!(layer.allow_writes, Some(true));
    }

    #[test]
    fn empty_root_variable_is_ignored() {
        let layer = env(&[(ROOT_ENV, "  ")]);
        assert_eq!(layer.root, None);
    }

    #[test]
    fn writes_default_to_disabled() {
        let config = env(&[(ROOT_ENV, "/srv/docs")]).finish().unwrap();
        assert!(!config.allow_writes);
    }

    #[test]
    fn missing_root_is_an_error() {
        let result = ConfigLayer::default().finish();
        assert!(matches!(result, Err(GatewayError::MissingRoot)));
    }

    #[test]
    fn higher_layer_wins() {
        let cli = ConfigLayer {
            root: Some(PathBuf::from("/cli")),
            allow_writes: None,
        };
        let file = ConfigLayer {
            root: Some(PathBuf::from("/file")),
            allow_writes: Some(true),
        };
        let config = cli.or(env(&[])).or(file).finish().unwrap();
        assert_eq!(config.root, PathBuf::from("/cli"));
        assert!(config.allow_writes);
    }

    #[test]
    fn toml_layer_parses() {
        let layer = ConfigLayer::from_toml_str(
            "root = \"/srv/docs\"\nallow_writes = true\n",
            Path::new("fsmcp.toml"),
        )
        .unwrap();
        assert_eq!(layer.root, Some(PathBuf::from("/srv/docs")));
        assert_eq!(layer.allow_writes, Some(true));
    }

    #[test]
    fn toml_layer_rejects_bad_types() {
        let result = ConfigLayer::from_toml_str("allow_writes = \"maybe\"", Path::new("x.toml"));
        assert!(matches!(result, Err(GatewayError::Config { .. })));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLayer::load(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(GatewayError::Io { .. })));
    }
}
