use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use metrics::counter;
use spendwise_api_types::{Identity, Theme};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::infra::storage::{CredentialStorage, StoredCredentials};
use crate::infra::telemetry::{METRIC_RENEWAL, METRIC_RENEWAL_FAILED};
use crate::util::SingleFlight;
use crate::util::lock::{rw_read, rw_write};

use super::events::SessionEvent;

const SOURCE: &str = "session::store";
const EVENT_CAPACITY: usize = 16;

/// Outcome of the renewal call as seen by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewedCredentials {
    pub access: String,
    /// Present when the server rotates the refresh credential.
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenewalFailure {
    #[error("no refresh credential is stored")]
    MissingRefreshCredential,
    #[error("refresh credential rejected with status {status}")]
    Rejected { status: u16 },
    #[error("renewal request failed: {0}")]
    Transport(String),
    #[error("renewal response could not be decoded: {0}")]
    Decode(String),
    #[error("session was replaced while renewing")]
    Superseded,
}

/// Exchanges a refresh credential for a new access credential.
#[async_trait]
pub trait Renewer: Send + Sync {
    async fn renew(&self, refresh_credential: &str) -> Result<RenewedCredentials, RenewalFailure>;
}

#[derive(Debug, Default)]
struct Session {
    access: Option<String>,
    refresh: Option<String>,
    identity: Option<Identity>,
    /// Bumped whenever the credential pair is replaced from outside renewal.
    generation: u64,
}

impl Session {
    fn reset(&mut self) {
        *self = Session {
            generation: self.generation.wrapping_add(1),
            ..Session::default()
        };
    }

    fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none() && self.identity.is_none()
    }

    fn stored(&self) -> StoredCredentials {
        StoredCredentials {
            access_token: self.access.clone(),
            refresh_token: self.refresh.clone(),
        }
    }
}

pub struct SessionStore {
    session: RwLock<Session>,
    storage: Arc<dyn CredentialStorage>,
    renewal: SingleFlight<(), Result<String, RenewalFailure>>,
    theme: watch::Sender<Theme>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn CredentialStorage>) -> Self {
        let (theme, _) = watch::channel(Theme::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            session: RwLock::new(Session::default()),
            storage,
            renewal: SingleFlight::new(),
            theme,
            events,
        }
    }

    /// Load durable credentials into memory. Returns whether an access
    /// credential is now present.
    ///
    /// Unreadable storage is logged and treated as logged out.
    pub fn restore(&self) -> bool {
        let stored = match self.storage.load() {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "Failed to load stored credentials; starting logged out");
                StoredCredentials::default()
            }
        };
        let mut session = rw_write(&self.session, SOURCE, "restore");
        session.generation = session.generation.wrapping_add(1);
        session.access = stored.access_token;
        session.refresh = stored.refresh_token;
        session.identity = None;
        debug!(
            has_access = session.access.is_some(),
            has_refresh = session.refresh.is_some(),
            "Session restored"
        );
        session.access.is_some()
    }

    /// Record a freshly issued credential pair and the identity it belongs to.
    pub fn attach(&self, access: impl Into<String>, refresh: impl Into<String>, identity: Identity) {
        let theme = identity.theme_preference;
        let stored = {
            let mut session = rw_write(&self.session, SOURCE, "attach");
            session.generation = session.generation.wrapping_add(1);
            session.access = Some(access.into());
            session.refresh = Some(refresh.into());
            session.identity = Some(identity);
            session.stored()
        };
        self.persist(&stored);
        self.publish_theme(theme);
        info!(event = SessionEvent::SignedIn.as_str(), "Session attached");
        self.emit(SessionEvent::SignedIn);
    }

    /// Erase credentials and identity from memory and storage; resets the theme.
    pub fn clear(&self) {
        self.wipe();
        info!(event = SessionEvent::SignedOut.as_str(), "Session cleared");
        self.emit(SessionEvent::SignedOut);
    }

    pub fn current_access_credential(&self) -> Option<String> {
        rw_read(&self.session, SOURCE, "current_access_credential")
            .access
            .clone()
    }

    /// Whether a refresh credential is held, i.e. a rejected request can be renewed.
    pub fn can_renew(&self) -> bool {
        rw_read(&self.session, SOURCE, "can_renew").refresh.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        rw_read(&self.session, SOURCE, "is_authenticated")
            .access
            .is_some()
    }

    pub fn identity(&self) -> Option<Identity> {
        rw_read(&self.session, SOURCE, "identity").identity.clone()
    }

    /// Replace the identity after the server confirmed it and re-apply its theme.
    ///
    /// Ignored when no access credential is held, so a response that lands
    /// after logout cannot resurrect an identity.
    pub fn update_identity(&self, identity: Identity) {
        let theme = identity.theme_preference;
        {
            let mut session = rw_write(&self.session, SOURCE, "update_identity");
            if session.access.is_none() {
                debug!("Identity update ignored without an active session");
                return;
            }
            if session.identity.as_ref() != Some(&identity) {
                session.identity = Some(identity);
            }
        }
        self.publish_theme(theme);
    }

    pub fn theme(&self) -> Theme {
        *self.theme.borrow()
    }

    pub fn subscribe_theme(&self) -> watch::Receiver<Theme> {
        self.theme.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Whether a renewal call is currently outstanding.
    pub fn is_renewing(&self) -> bool {
        self.renewal.is_in_flight(&())
    }

    /// Obtain a usable access credential after `stale` was rejected.
    ///
    /// Concurrent callers share one renewal call. When the store already
    /// holds a credential different from `stale`, a renewal settled while the
    /// caller's request was on the wire and that credential is returned
    /// without another call. On failure the session is cleared and
    /// [`SessionEvent::Expired`] is emitted before any waiter is released.
    ///
    /// The outcome only applies to the session the renewal started from. If
    /// it was cleared or replaced by `attach`/`restore` meanwhile, the result
    /// is discarded: callers receive the current access credential, or
    /// [`RenewalFailure::Superseded`] when there is none.
    ///
    /// The identity is kept across a successful renewal. Renewal uses the
    /// refresh credential of the same sign-in, so it cannot change the user.
    pub async fn renew(
        &self,
        stale: Option<&str>,
        renewer: &dyn Renewer,
    ) -> Result<String, RenewalFailure> {
        self.renewal
            .run_unless(
                (),
                || match (self.current_access_credential(), stale) {
                    (Some(current), Some(stale)) if current != stale => Some(Ok(current)),
                    (Some(current), None) => Some(Ok(current)),
                    _ => None,
                },
                || self.renew_now(renewer),
            )
            .await
    }

    async fn renew_now(&self, renewer: &dyn Renewer) -> Result<String, RenewalFailure> {
        let (refresh, generation) = {
            let session = rw_read(&self.session, SOURCE, "renew.refresh");
            (session.refresh.clone(), session.generation)
        };
        let Some(refresh) = refresh else {
            self.expire(generation, &RenewalFailure::MissingRefreshCredential);
            return Err(RenewalFailure::MissingRefreshCredential);
        };

        counter!(METRIC_RENEWAL).increment(1);
        debug!("Renewing access credential");

        match renewer.renew(&refresh).await {
            Ok(renewed) => {
                let installed = {
                    let mut session = rw_write(&self.session, SOURCE, "renew.install");
                    if session.generation == generation {
                        session.access = Some(renewed.access.clone());
                        if let Some(rotated) = renewed.refresh {
                            session.refresh = Some(rotated);
                        }
                        Some(session.stored())
                    } else {
                        None
                    }
                };
                let Some(stored) = installed else {
                    return self.superseded();
                };
                self.persist(&stored);
                info!("Access credential renewed");
                Ok(renewed.access)
            }
            Err(failure) => {
                counter!(METRIC_RENEWAL_FAILED).increment(1);
                if !self.expire(generation, &failure) {
                    return self.superseded();
                }
                Err(failure)
            }
        }
    }

    fn superseded(&self) -> Result<String, RenewalFailure> {
        debug!("Session replaced during renewal; outcome discarded");
        self.current_access_credential()
            .ok_or(RenewalFailure::Superseded)
    }

    /// Wipe the session if it is still the one `generation` names. Returns
    /// false when it was replaced in the meantime.
    fn expire(&self, generation: u64, failure: &RenewalFailure) -> bool {
        let had_session = {
            let mut session = rw_write(&self.session, SOURCE, "expire");
            if session.generation != generation {
                return false;
            }
            let had_session = !session.is_empty();
            session.reset();
            had_session
        };
        self.discard_stored();
        self.publish_theme(Theme::default());
        if had_session {
            warn!(
                event = SessionEvent::Expired.as_str(),
                reason = %failure,
                "Session expired; renewal failed"
            );
            self.emit(SessionEvent::Expired);
        }
        true
    }

    fn wipe(&self) {
        rw_write(&self.session, SOURCE, "wipe").reset();
        self.discard_stored();
        self.publish_theme(Theme::default());
    }

    fn discard_stored(&self) {
        if let Err(err) = self.storage.clear() {
            warn!(error = %err, "Failed to clear stored credentials");
        }
    }

    fn persist(&self, stored: &StoredCredentials) {
        if let Err(err) = self.storage.save(stored) {
            warn!(error = %err, "Failed to persist credentials; keeping them in memory only");
        }
    }

    fn publish_theme(&self, theme: Theme) {
        self.theme.send_if_modified(|current| {
            if *current == theme {
                false
            } else {
                *current = theme;
                true
            }
        });
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}
