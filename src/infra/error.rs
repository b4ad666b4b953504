use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("credential file `{path}` is unreadable: {message}")]
    CorruptCredentials { path: PathBuf, message: String },
    #[error("no configuration directory available for credential storage")]
    NoConfigDirectory,
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn corrupt_credentials(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorruptCredentials {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
