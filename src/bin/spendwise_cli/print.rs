#![deny(clippy::all)]

use serde::Serialize;

use crate::error::CliError;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value).map_err(|e| CliError::Render(e.to_string()))?;
    println!("{out}");
    Ok(())
}
