//! End-to-end resolution tests: flags, environment, file and defaults together.

use clap::Command;
use miniblog_config::{
    ConfigError, ConfigSource, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, FlagOverrides,
    LayeredConfigOptions, SERVER_MODE_KEY, ServerMode, ServerOptions, env_key, flags, resolve,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Temp home and working directories for one test.
struct Fixture {
    temp: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().expect("tmp");
        fs::create_dir_all(temp.path().join("home")).expect("home");
        fs::create_dir_all(temp.path().join("work")).expect("work");
        Self { temp }
    }

    fn home(&self) -> PathBuf {
        self.temp.path().join("home")
    }

    fn cwd(&self) -> PathBuf {
        self.temp.path().join("work")
    }

    fn home_config(&self) -> PathBuf {
        self.home().join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE)
    }

    fn write(&self, path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("dir");
        }
        fs::write(path, contents).expect("write");
    }

    /// Loader options for the given command line and environment.
    fn options(&self, args: &[&str], env: &[(&str, &str)]) -> LayeredConfigOptions {
        let command = flags::register(Command::new("mb-apiserver"), &ServerOptions::default());
        let matches = command
            .try_get_matches_from(std::iter::once("mb-apiserver").chain(args.iter().copied()))
            .expect("parse flags");
        LayeredConfigOptions::new(self.cwd())
            .with_home_dir(Some(self.home()))
            .with_env(env.iter().map(|(key, value)| (*key, *value)))
            .with_flags(FlagOverrides::from_matches(&matches))
    }
}

/// Walk a key down from flag to environment, file and default.
#[test]
fn precedence_falls_through_each_layer() {
    let fixture = Fixture::new();
    fixture.write(&fixture.home_config(), "server-mode: grpc\n");
    let env = [("MINIBLOG_SERVER_MODE", "gin")];

    let layered = ServerOptions::load_layered_with_options(
        fixture.options(&["--server-mode", "grpc-gateway"], &env),
    )
    .expect("flag");
    assert_eq!(layered.options.server_mode, "grpc-gateway");
    assert_eq!(layered.origin(SERVER_MODE_KEY), Some(ConfigSource::Flag));

    let layered =
        ServerOptions::load_layered_with_options(fixture.options(&[], &env)).expect("env");
    assert_eq!(layered.options.server_mode, "gin");
    assert_eq!(layered.origin(SERVER_MODE_KEY), Some(ConfigSource::Environment));

    let layered =
        ServerOptions::load_layered_with_options(fixture.options(&[], &[])).expect("file");
    assert_eq!(layered.options.server_mode, "grpc");
    assert_eq!(layered.origin(SERVER_MODE_KEY), Some(ConfigSource::File));

    fs::remove_file(fixture.home_config()).expect("remove");
    let layered =
        ServerOptions::load_layered_with_options(fixture.options(&[], &[])).expect("default");
    assert_eq!(layered.options.server_mode, "grpc-gateway");
    assert_eq!(layered.origin(SERVER_MODE_KEY), Some(ConfigSource::Default));
}

/// List a bad mode and a short key together.
#[test]
fn validation_lists_both_violations() {
    let fixture = Fixture::new();
    let err = resolve(fixture.options(&["--server-mode", "bogus", "--jwt-key", "ab"], &[]))
        .unwrap_err();
    let ConfigError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    let reasons: Vec<&str> = errors
        .violations()
        .iter()
        .map(|violation| violation.reason.as_str())
        .collect();
    assert_eq!(
        reasons,
        vec![
            "invalid server mode: must be one of [grpc, grpc-gateway, gin]",
            "jwt-key must be at least 6 characters long",
        ]
    );
}

/// Translate valid flag values into the server config unchanged.
#[test]
fn valid_options_translate_exactly() {
    let fixture = Fixture::new();
    let config = resolve(fixture.options(
        &["--server-mode", "gin", "--jwt-key", "abcdef", "--expiration", "1h"],
        &[],
    ))
    .expect("resolve");
    assert_eq!(config.server_mode, ServerMode::Gin);
    assert_eq!(config.jwt_key, "abcdef");
    assert_eq!(config.expiration, Duration::from_secs(3600));
}

/// Prefer the home directory file over the working directory file.
#[test]
fn home_directory_file_wins_search() {
    let fixture = Fixture::new();
    fixture.write(&fixture.home_config(), "jwt-key: from-home\n");
    fixture.write(&fixture.cwd().join(DEFAULT_CONFIG_FILE), "jwt-key: from-cwd\n");

    let layered =
        ServerOptions::load_layered_with_options(fixture.options(&[], &[])).expect("load");
    assert_eq!(layered.options.jwt_key, "from-home");
    assert_eq!(layered.config_file, Some(fixture.home_config()));
}

/// Load the file named by `--config` instead of searching.
#[test]
fn config_flag_selects_file() {
    let fixture = Fixture::new();
    fixture.write(&fixture.home_config(), "jwt-key: from-home\n");
    let explicit = fixture.temp.path().join("explicit.yaml");
    fixture.write(&explicit, "jwt-key: from-flag-file\n");

    let explicit_arg = explicit.to_string_lossy().to_string();
    let layered = ServerOptions::load_layered_with_options(
        fixture.options(&["--config", explicit_arg.as_str()], &[]),
    )
    .expect("load");
    assert_eq!(layered.options.jwt_key, "from-flag-file");
    assert_eq!(layered.config_file, Some(explicit));
}

/// Read `MINIBLOG_JWT_KEY` into the jwt-key option.
#[test]
fn environment_variable_sets_jwt_key() {
    let fixture = Fixture::new();
    assert_eq!(env_key("jwt-key"), "MINIBLOG_JWT_KEY");

    let layered = ServerOptions::load_layered_with_options(
        fixture.options(&[], &[("MINIBLOG_JWT_KEY", "secretvalue123")]),
    )
    .expect("load");
    assert_eq!(layered.options.jwt_key, "secretvalue123");
}

/// Resolve identical inputs to identical configs.
#[test]
fn resolution_is_idempotent() {
    let fixture = Fixture::new();
    fixture.write(&fixture.home_config(), "expiration: 45m\n");
    let env = [("MINIBLOG_SERVER_MODE", "grpc")];

    let first = resolve(fixture.options(&["--jwt-key", "abcdefgh"], &env)).expect("first");
    let second = resolve(fixture.options(&["--jwt-key", "abcdefgh"], &env)).expect("second");
    assert_eq!(first, second);
    assert_eq!(first.expiration, Duration::from_secs(45 * 60));
}
