use serde_json::Value;
use spendwise_api_types::{
    Acknowledgement, AuthResponse, Identity, LoginRequest, PreferencesPatch, SignupRequest, Theme,
    VerifyEmailRequest,
};
use tracing::{debug, info};

use crate::cache::{CacheSynchronizer, Mutation};
use crate::pipeline::{ApiError, ApiRequest, ApiResponse};
use crate::session::SessionStore;

const LOGIN_PATH: &str = "auth/login/";
const SIGNUP_PATH: &str = "auth/signup/";
const VERIFY_EMAIL_PATH: &str = "auth/verify-email/";
const ME_PATH: &str = "auth/me/";
const PREFERENCES_PATH: &str = "auth/preferences/";

/// Sign-in, registration and profile operations.
pub struct AuthApi<'a> {
    sync: &'a CacheSynchronizer,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(sync: &'a CacheSynchronizer) -> Self {
        Self { sync }
    }

    fn session(&self) -> &SessionStore {
        self.sync.pipeline().session()
    }

    /// Exchange email and password for a session. Results cached for a
    /// previous user are dropped.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .anonymous()
            .with_json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })?;
        let auth: AuthResponse = self.sync.send(&request).await?.json()?;

        self.sync.clear();
        self.session()
            .attach(auth.access, auth.refresh, auth.user.clone());
        info!(user = %auth.user.id, "Signed in");
        Ok(auth.user)
    }

    /// Register an account. The backend answers with a confirmation and sends
    /// a verification mail; no session is created.
    pub async fn signup(&self, signup: &SignupRequest) -> Result<Acknowledgement, ApiError> {
        let request = ApiRequest::post(SIGNUP_PATH)
            .anonymous()
            .with_json(signup)?;
        acknowledgement(self.sync.send(&request).await?)
    }

    pub async fn verify_email(&self, token: &str) -> Result<Acknowledgement, ApiError> {
        let request = ApiRequest::post(VERIFY_EMAIL_PATH)
            .anonymous()
            .with_json(&VerifyEmailRequest {
                token: token.to_string(),
            })?;
        acknowledgement(self.sync.send(&request).await?)
    }

    /// "Who am I" check; a confirmed identity replaces the stored one.
    pub async fn me(&self) -> Result<Identity, ApiError> {
        let identity: Identity = self.sync.send(&ApiRequest::get(ME_PATH)).await?.json()?;
        self.session().update_identity(identity.clone());
        Ok(identity)
    }

    /// Apply a partial profile update.
    ///
    /// A full identity in the response replaces the stored one; a partial
    /// response is merged onto the current identity (theme only). Sending the
    /// same preferences twice leaves identity and theme unchanged.
    pub async fn update_preferences(&self, patch: &PreferencesPatch) -> Result<Identity, ApiError> {
        let request = ApiRequest::patch(PREFERENCES_PATH).with_json(patch)?;
        let response = self
            .sync
            .write(Mutation::UpdatePreferences, &request)
            .await?;
        let body: Value = if response.bytes().is_empty() {
            Value::Null
        } else {
            response.json()?
        };

        let identity = match serde_json::from_value::<Identity>(body.clone()) {
            Ok(identity) => identity,
            Err(_) => {
                debug!("Preferences response is partial; merging onto current identity");
                let mut identity = match self.session().identity() {
                    Some(identity) => identity,
                    None => self.me().await?,
                };
                let theme = body
                    .get("theme_preference")
                    .and_then(|value| serde_json::from_value::<Theme>(value.clone()).ok())
                    .or(patch.theme_preference);
                if let Some(theme) = theme {
                    identity.theme_preference = theme;
                }
                identity
            }
        };

        self.session().update_identity(identity.clone());
        Ok(identity)
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<Identity, ApiError> {
        self.update_preferences(&PreferencesPatch {
            theme_preference: Some(theme),
        })
        .await
    }

    /// Switch to the opposite of the current preference.
    pub async fn toggle_theme(&self) -> Result<Identity, ApiError> {
        let current = match self.session().identity() {
            Some(identity) => identity.theme_preference,
            None => self.me().await?.theme_preference,
        };
        self.set_theme(current.toggled()).await
    }

    /// Forget the session and everything cached under it.
    pub fn logout(&self) {
        self.session().clear();
        self.sync.clear();
        info!("Signed out");
    }
}

fn acknowledgement(response: ApiResponse) -> Result<Acknowledgement, ApiError> {
    if response.bytes().is_empty() {
        return Ok(Acknowledgement::default());
    }
    response.json()
}
