//! spendwise-cli: command-line client for the Spendwise expense tracker.
//! Credentials persist between invocations in the configured credentials file.
#![deny(clippy::all)]

mod error;
mod handlers;
mod io;
mod print;

use std::process::ExitCode;

use spendwise::Client;
use spendwise::config::{self, CliArgs, Command, Settings};
use spendwise::infra::telemetry;

use error::CliError;
use handlers::{auth, budgets, expenses};

#[tokio::main]
async fn main() -> ExitCode {
    let (args, settings) = match config::load_with_cli() {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    if let Err(err) = telemetry::init(&settings.logging) {
        eprintln!("warning: {err}");
    }

    match run(args, &settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            if err.requires_login() {
                eprintln!("Your session has ended. Please log in again with `spendwise-cli auth login`.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs, settings: &Settings) -> Result<(), CliError> {
    let client = Client::new(settings)?;
    client.session().restore();

    match args.command {
        Command::Auth(cmd) => auth::handle(&client, cmd).await,
        Command::Expenses(cmd) => expenses::handle(&client, cmd).await,
        Command::Budgets(cmd) => budgets::handle(&client, cmd).await,
    }
}

#[cfg(test)]
mod tests;
