//! Layered option resolution.
//!
//! Collects the default, file, environment and flag layers, merges them with
//! fixed precedence and decodes the result into [`ServerOptions`].

mod env;
mod layer_io;


pub use env::env_key;
pub use layer_io::default_config_path;

use crate::flags::FlagOverrides;
use crate::model::OPTION_KEYS;
use crate::validation::{ValidatedOptions, ValidationErrors};
use crate::{ConfigError, ServerConfig, ServerOptions};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Prefix shared by every recognized environment variable.
pub const ENV_PREFIX: &str = "MINIBLOG";
/// Config file name looked up in the search directories.
pub const DEFAULT_CONFIG_FILE: &str = "mb-apiserver.yaml";
/// Directory under the user home holding the config file.
pub const DEFAULT_CONFIG_DIR: &str = ".miniblog";

/// Origin of a config layer, ordered from lowest to highest precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigSource {
    /// Built-in defaults.
    Default,
    /// The active YAML config file.
    File,
    /// `MINIBLOG_*` environment variables.
    Environment,
    /// Command-line flags (highest precedence).
    Flag,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigSource::Default => "defaults",
            ConfigSource::File => "config file",
            ConfigSource::Environment => "environment",
            ConfigSource::Flag => "command line",
        };
        f.write_str(name)
    }
}

/// What to do when the active config file cannot be loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileLoadPolicy {
    /// Log the failure and continue with the remaining layers.
    #[default]
    Lenient,
    /// Abort resolution with the load error.
    Strict,
}

/// Metadata about a layer considered during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    /// Layer origin.
    pub source: ConfigSource,
    /// Location on disk for file layers.
    pub path: Option<PathBuf>,
    /// Option keys this layer defined.
    pub keys: Vec<String>,
    /// Reason the layer was skipped, if it was.
    pub disabled_reason: Option<String>,
}

impl ConfigLayer {
    fn loaded(source: ConfigSource, path: Option<PathBuf>, values: &Map<String, Value>) -> Self {
        Self {
            source,
            path,
            keys: values.keys().cloned().collect(),
            disabled_reason: None,
        }
    }
}

/// Inputs for one resolution run.
///
/// Everything the loader reads from the outside world is captured here, so a
/// run with the same options always yields the same result.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Explicit config file; disables the directory search when set.
    pub config_path: Option<PathBuf>,
    /// User home directory; `None` when it could not be determined.
    pub home_dir: Option<PathBuf>,
    /// Working directory searched after the home config directory.
    pub cwd: PathBuf,
    /// Environment snapshot consulted for `MINIBLOG_*` overrides.
    pub env: BTreeMap<String, String>,
    /// Option values supplied on the command line.
    pub flags: Map<String, Value>,
    /// Handling of unreadable or malformed config files.
    pub file_policy: FileLoadPolicy,
}

impl LayeredConfigOptions {
    /// Options for `cwd` using the real home directory and process environment.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            config_path: None,
            home_dir: layer_io::user_home_dir(),
            cwd: cwd.as_ref().to_path_buf(),
            env: env::snapshot(std::env::vars_os()),
            flags: Map::new(),
            file_policy: FileLoadPolicy::default(),
        }
    }

    /// Read the config from `path` instead of searching for it.
    pub fn with_config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Override the home directory used for the config search.
    pub fn with_home_dir(mut self, home_dir: Option<PathBuf>) -> Self {
        self.home_dir = home_dir;
        self
    }

    /// Replace the environment snapshot.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self
    }

    /// Apply parsed command-line flags, including `--config`.
    pub fn with_flags(mut self, flags: FlagOverrides) -> Self {
        let (config_path, values) = flags.into_parts();
        if let Some(path) = config_path {
            self.config_path = Some(path);
        }
        self.flags = values;
        self
    }

    pub fn with_file_policy(mut self, policy: FileLoadPolicy) -> Self {
        self.file_policy = policy;
        self
    }

    /// Directories searched for [`DEFAULT_CONFIG_FILE`], in order.
    pub fn search_dirs(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let home_dir = self
            .home_dir
            .as_ref()
            .ok_or(ConfigError::HomeDirUnavailable)?;
        Ok(vec![home_dir.join(DEFAULT_CONFIG_DIR), self.cwd.clone()])
    }
}

/// Merged options plus metadata about where each value came from.
#[derive(Debug, Clone)]
pub struct LayeredOptions {
    /// The merged, not yet validated options.
    pub options: ServerOptions,
    /// Every layer considered, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
    /// The active config file, if one was selected.
    pub config_file: Option<PathBuf>,
    origins: BTreeMap<String, ConfigSource>,
}

impl LayeredOptions {
    /// Source that supplied the winning value for `key`.
    pub fn origin(&self, key: &str) -> Option<ConfigSource> {
        self.origins.get(key).copied()
    }

    /// Validate the merged options.
    pub fn validate(self) -> Result<ValidatedOptions, ValidationErrors> {
        self.options.validate()
    }
}

impl ServerOptions {
    /// Resolve options for `cwd` from the default layer locations and the
    /// process environment.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredOptions, ConfigError> {
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Resolve options from explicit layer inputs.
    ///
    /// Precedence (low -> high): defaults, config file, environment, flags.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredOptions, ConfigError> {
        let mut layers = Vec::new();
        let mut merge_layers = Vec::new();

        let defaults = default_layer()?;
        layers.push(ConfigLayer::loaded(ConfigSource::Default, None, &defaults));
        merge_layers.push((ConfigSource::Default, defaults.clone()));

        let config_file = layer_io::locate_config_file(&options)?;
        match config_file.as_deref() {
            Some(path) => {
                info!("using config file: {}", path.display());
                if let Some(values) = load_file_layer(path, options.file_policy, &mut layers)? {
                    layers.push(ConfigLayer::loaded(
                        ConfigSource::File,
                        Some(path.to_path_buf()),
                        &values,
                    ));
                    merge_layers.push((ConfigSource::File, values));
                }
            }
            None => info!("no config file found; using defaults, environment and flags"),
        }

        let env_values = env::env_layer(&options.env);
        if !env_values.is_empty() {
            debug!("loaded environment layer (keys={})", env_values.len());
            layers.push(ConfigLayer::loaded(ConfigSource::Environment, None, &env_values));
            merge_layers.push((ConfigSource::Environment, env_values));
        }

        let flag_values = known_keys(options.flags);
        if !flag_values.is_empty() {
            debug!("loaded flag layer (keys={})", flag_values.len());
            layers.push(ConfigLayer::loaded(ConfigSource::Flag, None, &flag_values));
            merge_layers.push((ConfigSource::Flag, flag_values));
        }

        // Layers are flat key maps, so a later layer simply replaces keys.
        let mut merged = Map::new();
        let mut origins = BTreeMap::new();
        for (source, values) in merge_layers {
            for (key, value) in values {
                origins.insert(key.clone(), source);
                merged.insert(key, value);
            }
        }

        let options = decode_options(merged, &defaults, &origins)?;
        debug!("merged options (layers={})", layers.len());
        Ok(LayeredOptions {
            options,
            layers,
            config_file,
            origins,
        })
    }
}

/// Run the whole pipeline: merge, validate and translate.
pub fn resolve(options: LayeredConfigOptions) -> Result<ServerConfig, ConfigError> {
    let layered = ServerOptions::load_layered_with_options(options)?;
    let config = layered.validate()?.into_config();
    info!(
        "configuration resolved (server_mode={}, expiration={})",
        config.server_mode,
        crate::format_duration(config.expiration)
    );
    Ok(config)
}

fn load_file_layer(
    path: &Path,
    policy: FileLoadPolicy,
    layers: &mut Vec<ConfigLayer>,
) -> Result<Option<Map<String, Value>>, ConfigError> {
    match layer_io::read_file_layer(path) {
        Ok(values) => Ok(Some(values)),
        Err(err) if policy == FileLoadPolicy::Lenient => {
            warn!("failed to load config file, continuing without it: {err}");
            layers.push(ConfigLayer {
                source: ConfigSource::File,
                path: Some(path.to_path_buf()),
                keys: Vec::new(),
                disabled_reason: Some(err.to_string()),
            });
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn known_keys(values: Map<String, Value>) -> Map<String, Value> {
    values
        .into_iter()
        .filter(|(key, _)| OPTION_KEYS.contains(&key.as_str()))
        .collect()
}

fn default_layer() -> Result<Map<String, Value>, ConfigError> {
    match serde_json::to_value(ServerOptions::default())? {
        Value::Object(map) => Ok(map),
        other => Err(ConfigError::DecodeFailed(serde::ser::Error::custom(format!(
            "default options must encode as a map, got {other}"
        )))),
    }
}

/// Decode merged values into [`ServerOptions`].
///
/// On failure each merged key is decoded again on top of the defaults, so the
/// error names the first offending option and the layer that supplied it.
fn decode_options(
    merged: Map<String, Value>,
    defaults: &Map<String, Value>,
    origins: &BTreeMap<String, ConfigSource>,
) -> Result<ServerOptions, ConfigError> {
    let err = match serde_json::from_value(Value::Object(merged.clone())) {
        Ok(options) => return Ok(options),
        Err(err) => err,
    };

    for (key, value) in merged {
        let mut single = defaults.clone();
        single.insert(key.clone(), value);
        if let Err(key_err) = serde_json::from_value::<ServerOptions>(Value::Object(single)) {
            return Err(invalid_value(&key, origins, key_err.to_string()));
        }
    }
    Err(ConfigError::DecodeFailed(err))
}

fn invalid_value(
    key: &str,
    origins: &BTreeMap<String, ConfigSource>,
    message: String,
) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        origin: origins.get(key).copied().unwrap_or(ConfigSource::Default),
        message,
    }
}
