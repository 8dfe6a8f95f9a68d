use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while loading and validating roomwatch configuration.
#[derive(Error, Debug)]
pub enum WatchError {
    /// The configuration file could not be opened or read from disk.
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML or has the wrong shape.
    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A sticky or ignore pattern failed to compile.
    #[error("Invalid {kind} pattern for room {room} in account {account}: {source}")]
    InvalidPattern {
        account: String,
        room: String,
        kind: &'static str,
        #[source]
        source: regex::Error,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the roomwatch crates.
pub type Result<T> = std::result::Result<T, WatchError>;
