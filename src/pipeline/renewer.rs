use async_trait::async_trait;
use spendwise_api_types::{RefreshRequest, RefreshResponse};
use tracing::debug;
use url::Url;

use crate::session::{RenewalFailure, RenewedCredentials, Renewer};

pub(crate) const REFRESH_PATH: &str = "auth/token/refresh/";

/// Posts the refresh credential to `auth/token/refresh/`.
///
/// Sent outside the pipeline: it never carries a bearer credential and a
/// rejection ends the session instead of triggering another renewal.
#[derive(Debug, Clone)]
pub struct HttpRenewer {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpRenewer {
    pub fn new(http: reqwest::Client, base: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            endpoint: base.join(REFRESH_PATH)?,
        })
    }
}

#[async_trait]
impl Renewer for HttpRenewer {
    async fn renew(&self, refresh_credential: &str) -> Result<RenewedCredentials, RenewalFailure> {
        let body = RefreshRequest {
            refresh: refresh_credential.to_string(),
        };
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|err| RenewalFailure::Transport(err.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), "Renewal response received");
        if !status.is_success() {
            return Err(RenewalFailure::Rejected {
                status: status.as_u16(),
            });
        }

        let renewed: RefreshResponse = response
            .json()
            .await
            .map_err(|err| RenewalFailure::Decode(err.to_string()))?;
        Ok(RenewedCredentials {
            access: renewed.access,
            refresh: renewed.refresh,
        })
    }
}
