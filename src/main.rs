//! Parcel relay entrypoint.
//!
//! Parses flags, resolves configuration, initializes logging and serves
//! until the process is terminated.

use clap::Parser;
use parcel_relay::cli::Cli;
use parcel_relay::config::ConfigError;
use parcel_relay::relay::Relay;
use parcel_relay::server::{ServerError, spawn};
use std::io::Write;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let exit_code = exit_code_for_run_result(run(&cli), &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli) -> Result<(), StartupError> {
    let config = Arc::new(cli.resolve_config()?);
    let bind = config.bind.clone();
    let relay = Arc::new(Relay::new(config));
    spawn(&bind, relay)?.wait();
    Ok(())
}

fn exit_code_for_run_result(result: Result<(), StartupError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            if writeln!(stderr, "parcel-relay: {err}").is_err() {
                // Nowhere left to report it.
            }
            1
        }
    }
}
