#![deny(clippy::all)]

use serde_json::json;
use spendwise::Client;
use spendwise::config::{AuthCommand, ThemeArg};
use spendwise::types::{SignupRequest, Theme};

use crate::error::CliError;
use crate::io::read_password;
use crate::print::print_json;

pub async fn handle(client: &Client, cmd: AuthCommand) -> Result<(), CliError> {
    match cmd {
        AuthCommand::Login { email } => {
            let password = read_password()?;
            let identity = client.auth().login(&email, &password).await?;
            print_json(&identity)
        }
        AuthCommand::Signup {
            email,
            first_name,
            last_name,
        } => {
            let password = read_password()?;
            let ack = client
                .auth()
                .signup(&SignupRequest {
                    email,
                    password,
                    first_name,
                    last_name,
                })
                .await?;
            print_json(&ack)
        }
        AuthCommand::VerifyEmail { token } => {
            let ack = client.auth().verify_email(&token).await?;
            print_json(&ack)
        }
        AuthCommand::Logout => {
            client.logout();
            print_json(&json!({ "detail": "signed out" }))
        }
        AuthCommand::Me => {
            let identity = client.auth().me().await?;
            print_json(&identity)
        }
        AuthCommand::Theme { theme } => {
            let identity = match theme {
                ThemeArg::Light => client.auth().set_theme(Theme::Light).await?,
                ThemeArg::Dark => client.auth().set_theme(Theme::Dark).await?,
                ThemeArg::Toggle => client.auth().toggle_theme().await?,
            };
            print_json(&identity)
        }
    }
}
