mod collection;
mod command_line;
mod config;
mod contracts;
mod deploy;
mod error;
mod mint;
#[cfg(test)]
mod mock;
mod utils;

use std::process::ExitCode;

use clap::Parser;
use command_line::CommandLine;

/// A missing `.env` is the normal case; anything else deserves a warning.
fn dotenv_problem<T>(loaded: Result<T, dotenvy::Error>) -> Option<dotenvy::Error> {
    match loaded {
        Err(err) if !err.not_found() => Some(err),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // loaded first so RUST_LOG may come from .env
    let dotenv = dotenvy::dotenv();
    env_logger::init();
    if let Some(err) = dotenv_problem(dotenv) {
        log::warn!("ignoring .env: {err}");
    }
    let cmd = CommandLine::parse();
    let workflow = cmd.workflow();
    match cmd.execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ {workflow} failed: {err}");
            if let Some(hint) = err.hint() {
                eprintln!("💡 {hint}");
            }
            ExitCode::FAILURE
        }
    }
}
