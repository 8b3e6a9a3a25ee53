//! Startup surface for the `mb-apiserver` binary.
//!
//! Builds the command line, initializes logging and runs configuration
//! resolution once before any server component is constructed.

/// Re-export for convenience.
pub use miniblog_config as config;

use anyhow::Context;
use clap::{ArgMatches, Command};
use log::info;
use miniblog_config::{FlagOverrides, LayeredConfigOptions, ServerConfig, ServerOptions, flags};

/// Name of the API server binary.
pub const APP_NAME: &str = "mb-apiserver";

/// The `mb-apiserver` command with every option flag declared.
pub fn command() -> Command {
    let command = Command::new(APP_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("miniblog API server")
        .long_about(
            "miniblog API server.\n\n\
             Options are read from built-in defaults, the mb-apiserver.yaml config file, \
             MINIBLOG_* environment variables and command-line flags, in increasing precedence.",
        );
    flags::register(command, &ServerOptions::default())
}

/// Initialize `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

/// Resolve the server configuration for parsed command-line `matches`.
pub fn load_config(matches: &ArgMatches) -> anyhow::Result<ServerConfig> {
    let cwd = std::env::current_dir().context("failed to determine working directory")?;
    let options =
        LayeredConfigOptions::new(&cwd).with_flags(FlagOverrides::from_matches(matches));
    let config = miniblog_config::resolve(options).context("invalid server configuration")?;
    info!("resolved configuration: {config:?}");
    Ok(config)
}
