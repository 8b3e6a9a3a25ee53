//! Environment variable binding for option keys.

use super::ENV_PREFIX;
use crate::model::OPTION_KEYS;
use log::debug;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::ffi::OsString;

/// Environment variable name for an option key.
///
/// `.` and `-` become `_`, the result is upper-cased and prefixed, so
/// `jwt-key` maps to `MINIBLOG_JWT_KEY`.
pub fn env_key(option_key: &str) -> String {
    let translated = option_key.replace(['.', '-'], "_").to_uppercase();
    format!("{ENV_PREFIX}_{translated}")
}

/// Snapshot of environment variables, skipping names or values that are not UTF-8.
pub(super) fn snapshot<I>(vars: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Collect the options set in the environment snapshot. Empty values count as unset.
pub(super) fn env_layer(env: &BTreeMap<String, String>) -> Map<String, Value> {
    let mut values = Map::new();
    for key in OPTION_KEYS {
        let var = env_key(key);
        match env.get(&var) {
            Some(value) if !value.is_empty() => {
                debug!("environment override (option={key}, var={var})");
                values.insert((*key).to_string(), Value::String(value.clone()));
            }
            _ => {}
        }
    }
    values
}
