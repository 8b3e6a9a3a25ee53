//! Error types for config resolution and validation.

use crate::ConfigSource;
use crate::validation::ValidationErrors;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while resolving config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The user home directory could not be determined.
    #[error("unable to determine the user home directory")]
    HomeDirUnavailable,
    /// Reading a config file failed.
    #[error("failed to read config {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Parsing a config file failed.
    #[error("failed to parse config {}: {source}", path.display())]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    /// A config file parsed but does not have the expected shape.
    #[error("invalid config {}: {message}", path.display())]
    InvalidFile { path: PathBuf, message: String },
    /// A merged value could not be decoded into its option type.
    #[error("invalid value for {key} from {origin}: {message}")]
    InvalidValue {
        key: String,
        origin: ConfigSource,
        message: String,
    },
    /// Converting options to or from JSON values failed.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// One or more options failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}
