use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::error::ApiError;

/// Whether a request carries the session's access credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Attach `Authorization: Bearer <access>` and recover from a 401 by renewing.
    Bearer,
    /// Never attach a credential and never renew (login, signup, token refresh).
    Anonymous,
}

/// Immutable description of one API call. Retries re-dispatch the same
/// descriptor; the attempt number travels separately as an [`Attempt`].
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    auth: AuthMode,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            auth: AuthMode::Bearer,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn anonymous(mut self) -> Self {
        self.auth = AuthMode::Anonymous;
        self
    }

    pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body).map_err(ApiError::encode)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn auth(&self) -> AuthMode {
        self.auth
    }

    /// Resolve against `base`, which must end with `/`.
    pub fn url(&self, base: &Url) -> Result<Url, ApiError> {
        let mut url = base.join(self.path.trim_start_matches('/'))?;
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// Dispatch counter passed alongside an [`ApiRequest`]; a request is
/// re-dispatched at most once after an authorization failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attempt(u8);

impl Attempt {
    pub const FIRST: Attempt = Attempt(0);
    const MAX_RETRIES: u8 = 1;

    pub fn can_retry(self) -> bool {
        self.0 < Self::MAX_RETRIES
    }

    pub fn is_retry(self) -> bool {
        self.0 > 0
    }

    pub fn next(self) -> Self {
        Attempt(self.0.saturating_add(1))
    }

    /// One-based number for logs.
    pub fn number(self) -> u8 {
        self.0.saturating_add(1)
    }
}
