//! Request pipeline: attaches the access credential to every outbound call,
//! recovers from authorization failures through the session's single-flight
//! renewal and re-dispatches a faulted request at most once.

use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiSettings;
use crate::infra::telemetry::METRIC_AUTH_RETRY;
use crate::session::{RenewalFailure, SessionStore};

mod error;
mod renewer;
mod request;
mod response;

pub use error::ApiError;
pub use renewer::HttpRenewer;
pub use request::{ApiRequest, Attempt, AuthMode};
pub use response::ApiResponse;

const USER_AGENT: &str = concat!("spendwise/", env!("CARGO_PKG_VERSION"));

pub struct RequestPipeline {
    http: reqwest::Client,
    base: Url,
    session: Arc<SessionStore>,
    renewer: HttpRenewer,
}

impl RequestPipeline {
    pub fn new(api: &ApiSettings, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(api.timeout)
            .build()?;
        let renewer = HttpRenewer::new(http.clone(), &api.base_url)?;
        Ok(Self {
            http,
            base: api.base_url.clone(),
            session,
            renewer,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Send `request`, renewing the session and retrying once on a 401.
    ///
    /// Non-authorization failures are returned unchanged. A second 401 after a
    /// successful renewal is terminal [`ApiError::Unauthenticated`]; a failed
    /// renewal yields [`ApiError::SessionExpired`] after the session cleared
    /// itself. A 401 with no session at all, or one for a session that was
    /// signed out while renewing, is [`ApiError::Unauthenticated`].
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut attempt = Attempt::FIRST;
        let mut credential = match request.auth() {
            AuthMode::Bearer => self.session.current_access_credential(),
            AuthMode::Anonymous => None,
        };

        loop {
            let (status, body) = self.dispatch(request, credential.as_deref(), attempt).await?;
            if status.is_success() {
                return Ok(ApiResponse::new(status, body));
            }

            let recoverable = status == StatusCode::UNAUTHORIZED
                && request.auth() == AuthMode::Bearer
                && attempt.can_retry();
            if !recoverable {
                return Err(ApiError::from_status(status, &body));
            }
            if credential.is_none() && !self.session.can_renew() {
                debug!(
                    method = %request.method(),
                    path = request.path(),
                    "Request rejected without a session; nothing to renew"
                );
                return Err(ApiError::Unauthenticated);
            }

            attempt = attempt.next();
            counter!(METRIC_AUTH_RETRY).increment(1);
            match self
                .session
                .renew(credential.as_deref(), &self.renewer)
                .await
            {
                Ok(renewed) => credential = Some(renewed),
                Err(RenewalFailure::Superseded) => {
                    debug!(
                        method = %request.method(),
                        path = request.path(),
                        "Session ended while renewing"
                    );
                    return Err(ApiError::Unauthenticated);
                }
                Err(failure) => {
                    warn!(
                        method = %request.method(),
                        path = request.path(),
                        reason = %failure,
                        "Request rejected; session expired"
                    );
                    return Err(ApiError::SessionExpired);
                }
            }
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        credential: Option<&str>,
        attempt: Attempt,
    ) -> Result<(StatusCode, Bytes), ApiError> {
        let url = request.url(&self.base)?;
        let mut builder = self.http.request(request.method().clone(), url);
        if let Some(credential) = credential {
            builder = builder.bearer_auth(credential);
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| {
            warn!(
                method = %request.method(),
                path = request.path(),
                attempt = attempt.number(),
                error = %err,
                "Request failed before a response arrived"
            );
            ApiError::from(err)
        })?;
        let status = response.status();
        let body = response.bytes().await?;

        debug!(
            method = %request.method(),
            path = request.path(),
            status = status.as_u16(),
            attempt = attempt.number(),
            authenticated = credential.is_some(),
            "Request completed"
        );
        Ok((status, body))
    }
}
