#![deny(clippy::all)]

use std::path::PathBuf;

use spendwise::pipeline::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to read password from stdin: {0}")]
    Password(std::io::Error),
    #[error("failed to write {}: {source}", path.display())]
    OutputFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to render output: {0}")]
    Render(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl CliError {
    pub fn requires_login(&self) -> bool {
        matches!(self, CliError::Api(err) if err.requires_login())
    }
}
