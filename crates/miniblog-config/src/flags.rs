//! Command-line flags mirroring every option.
//!
//! Flags are declared on a clap [`Command`] seeded with the current defaults,
//! so `--help` shows the effective baseline. Only values the user actually
//! typed become overrides; a default-seeded flag never shadows the
//! environment or the config file.

use crate::loader::{DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE};
use crate::model::{EXPIRATION_KEY, JWT_KEY_KEY, SERVER_MODE_KEY};
use crate::{ServerMode, ServerOptions, format_duration, parse_duration};
use clap::parser::ValueSource;
use clap::{Arg, ArgMatches, Command, value_parser};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Flag selecting an explicit config file.
pub const CONFIG_FLAG: &str = "config";

/// Declare `--config` and one flag per option on `command`.
pub fn register(command: Command, defaults: &ServerOptions) -> Command {
    command
        .arg(
            Arg::new(CONFIG_FLAG)
                .long(CONFIG_FLAG)
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help(format!(
                    "Path to the configuration file. Defaults to ~/{DEFAULT_CONFIG_DIR}/{DEFAULT_CONFIG_FILE}, then ./{DEFAULT_CONFIG_FILE}"
                )),
        )
        .arg(
            Arg::new(SERVER_MODE_KEY)
                .long(SERVER_MODE_KEY)
                .value_name("MODE")
                .default_value(defaults.server_mode.clone())
                .help(format!(
                    "Server mode, available options: {}",
                    ServerMode::available()
                )),
        )
        .arg(
            Arg::new(JWT_KEY_KEY)
                .long(JWT_KEY_KEY)
                .value_name("KEY")
                .default_value(defaults.jwt_key.clone())
                .hide_default_value(true)
                .help("JWT signing key. Must be at least 6 characters long"),
        )
        .arg(
            Arg::new(EXPIRATION_KEY)
                .long(EXPIRATION_KEY)
                .value_name("DURATION")
                .default_value(format_duration(defaults.expiration))
                .value_parser(parse_duration)
                .help("The expiration duration of JWT tokens, e.g. 30m or 2h"),
        )
}

/// Values taken from parsed command-line flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagOverrides {
    config_path: Option<PathBuf>,
    values: Map<String, Value>,
}

impl FlagOverrides {
    /// Extract the flags that were given on the command line.
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let config_path = matches
            .try_get_one::<PathBuf>(CONFIG_FLAG)
            .ok()
            .flatten()
            .cloned();

        let mut values = Map::new();
        for key in [SERVER_MODE_KEY, JWT_KEY_KEY] {
            if let Some(value) = command_line_value::<String>(matches, key) {
                values.insert(key.to_string(), Value::String(value));
            }
        }
        if let Some(expiration) = command_line_value::<Duration>(matches, EXPIRATION_KEY) {
            values.insert(
                EXPIRATION_KEY.to_string(),
                Value::String(format_duration(expiration)),
            );
        }

        Self {
            config_path,
            values,
        }
    }

    /// Path passed with `--config`.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Command-line value for an option key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Option<PathBuf>, Map<String, Value>) {
        (self.config_path, self.values)
    }
}

fn command_line_value<T>(matches: &ArgMatches, id: &str) -> Option<T>
where
    T: Clone + Send + Sync + 'static,
{
    if matches.value_source(id) != Some(ValueSource::CommandLine) {
        return None;
    }
    matches.try_get_one::<T>(id).ok().flatten().cloned()
}
