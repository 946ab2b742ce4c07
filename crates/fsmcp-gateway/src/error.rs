// error.rs: Error types for configuring and starting the gateway.
//
// Tool-call failures never surface as GatewayError: they are StoreErrors
// rendered into short messages by `render::user_message`. GatewayError only
// covers what can go wrong before the server is up.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No root directory was configured by any source.
    #[error("no root directory configured (use --root, FILES_DIR, or `root` in the config file)")]
    MissingRoot,

    /// The file store could not be opened on the configured root.
    #[error("store error: {0}")]
    Store(#[from] fsmcp_store::StoreError),

    /// The configuration file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for ServerConfig.
    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
}
