//! Layered configuration resolution for `mb-apiserver`.
//!
//! This crate owns the server option schema, the default/file/environment/flag
//! layer merge, aggregate validation and the translation into the immutable
//! [`ServerConfig`] used by server construction.

mod error;
pub mod flags;
mod loader;
mod model;
mod validation;

/// Public error type returned by resolution APIs.
pub use error::ConfigError;
/// Command-line flag binding.
pub use flags::FlagOverrides;
/// Layered loader types and entry points.
pub use loader::{
    ConfigLayer, ConfigSource, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, ENV_PREFIX,
    FileLoadPolicy, LayeredConfigOptions, LayeredOptions, default_config_path, env_key, resolve,
};
/// Option schema and resolved configuration.
pub use model::{
    EXPIRATION_KEY, JWT_KEY_KEY, OPTION_KEYS, SERVER_MODE_KEY, ServerConfig, ServerMode,
    ServerOptions, UnknownServerMode, format_duration, parse_duration,
};
/// Aggregate validation results.
pub use validation::{FieldViolation, MIN_JWT_KEY_LEN, ValidatedOptions, ValidationErrors};
