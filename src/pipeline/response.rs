use bytes::Bytes;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// A successful (2xx) response, body fully received.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Bytes) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(ApiError::decode)
    }
}
