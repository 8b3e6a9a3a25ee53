//! `mb-apiserver` entry point.

use log::{error, info};
use std::process::ExitCode;

fn main() -> ExitCode {
    miniblog::init_logging();

    let matches = miniblog::command().get_matches();
    match miniblog::load_config(&matches) {
        Ok(config) => {
            info!("starting {} server", config.server_mode);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
