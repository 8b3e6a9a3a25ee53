//! Config file discovery and YAML layer reading.

use super::{DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, LayeredConfigOptions};
use crate::ConfigError;
use crate::model::OPTION_KEYS;
use directories::UserDirs;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Home directory of the current user, if it can be determined.
pub(super) fn user_home_dir() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Canonical user config location, `~/.miniblog/mb-apiserver.yaml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home_dir = user_home_dir().ok_or(ConfigError::HomeDirUnavailable)?;
    Ok(home_dir.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE))
}

/// Pick the active config file: the explicit path, else the first match in
/// the search directories.
pub(super) fn locate_config_file(
    options: &LayeredConfigOptions,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = options.config_path.as_ref() {
        debug!("config file set explicitly: {}", path.display());
        return Ok(Some(path.clone()));
    }

    for dir in options.search_dirs()? {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            return Ok(Some(candidate));
        }
        debug!("config file not found at {}", candidate.display());
    }
    Ok(None)
}

/// Read a YAML config file into a flat map of option values.
pub(super) fn read_file_layer(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(Map::new());
    }

    let value: Value =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })?;
    let map = match value {
        Value::Null => return Ok(Map::new()),
        Value::Object(map) => map,
        _ => {
            return Err(ConfigError::InvalidFile {
                path: path.to_path_buf(),
                message: "expected a mapping of option keys to values".to_string(),
            });
        }
    };

    let mut values = Map::new();
    for (key, value) in map {
        if !OPTION_KEYS.contains(&key.as_str()) {
            warn!("ignoring unknown key '{key}' in {}", path.display());
            continue;
        }
        let text = match value {
            Value::Null => continue,
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(ConfigError::InvalidFile {
                    path: path.to_path_buf(),
                    message: format!("option '{key}' must be a scalar value"),
                });
            }
        };
        values.insert(key, Value::String(text));
    }
    Ok(values)
}
