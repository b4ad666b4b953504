#![deny(clippy::all)]

use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::error::CliError;

pub const PASSWORD_ENV: &str = "SPENDWISE_PASSWORD";

/// Password from `SPENDWISE_PASSWORD`, else the first line of stdin.
pub fn read_password() -> Result<String, CliError> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return non_empty(password);
    }
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(CliError::Password)?;
    non_empty(line.trim_end_matches(['\r', '\n']).to_string())
}

fn non_empty(password: String) -> Result<String, CliError> {
    if password.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "password required (set {PASSWORD_ENV} or pipe it on stdin)"
        )));
    }
    Ok(password)
}

/// Write `data` to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, data: &[u8]) -> Result<(), CliError> {
    match path {
        Some(path) => fs::write(path, data).map_err(|source| CliError::OutputFile {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(data)
                .and_then(|()| stdout.flush())
                .map_err(|source| CliError::OutputFile {
                    path: "<stdout>".into(),
                    source,
                })
        }
    }
}
