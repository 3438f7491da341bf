use std::process::ExitCode;

use log::info;

mod cmds;
mod config;
mod polly;
mod util;

use config::AppConfig;
use polly::PollyClient;

fn main() -> anyhow::Result<ExitCode> {
    let config = AppConfig::from_env();
    let _logger = match util::logging::init(config.log_dir.as_deref()) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("Failed to initialise file logger, logging to stderr: {err}");
            util::logging::init(None)
                .map_err(|err| eprintln!("Failed to initialise logger: {err}"))
                .ok()
        }
    };
    info!("Starting pdf-speech");

    cmds::pipeline::run(&config, PollyClient::connect)
}
