use std::num::NonZeroU32;
use std::sync::Arc;

use spendwise_api_types::Identity;
use tracing::{info, warn};

use crate::api::{AuthApi, BudgetsApi, ExpensesApi};
use crate::cache::{CacheConfig, CacheSynchronizer};
use crate::config::{ApiSettings, Settings};
use crate::infra::storage::{CredentialStorage, FileStorage};
use crate::pipeline::{ApiError, RequestPipeline};
use crate::session::SessionStore;

/// Entry point: session store, request pipeline and cache synchronizer wired
/// together. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Client {
    session: Arc<SessionStore>,
    sync: Arc<CacheSynchronizer>,
    page_size: NonZeroU32,
}

impl Client {
    /// Build a client persisting credentials to the configured file.
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let storage = Arc::new(FileStorage::new(&settings.session.credentials_file));
        Self::from_parts(&settings.api, CacheConfig::from(&settings.cache), storage)
    }

    pub fn from_parts(
        api: &ApiSettings,
        cache: CacheConfig,
        storage: Arc<dyn CredentialStorage>,
    ) -> Result<Self, ApiError> {
        let session = Arc::new(SessionStore::new(storage));
        let pipeline = Arc::new(RequestPipeline::new(api, Arc::clone(&session))?);
        let sync = Arc::new(CacheSynchronizer::new(pipeline, &cache));
        Ok(Self {
            session,
            sync,
            page_size: api.page_size,
        })
    }

    /// Startup protocol: restore durable credentials and, when an access
    /// credential exists, confirm it with one identity check.
    ///
    /// A failed check leaves the stored session in place; only a failed
    /// renewal ends it.
    pub async fn init(&self) -> Option<Identity> {
        if !self.session.restore() {
            return None;
        }
        match self.auth().me().await {
            Ok(identity) => {
                info!(user = %identity.id, "Stored session confirmed");
                Some(identity)
            }
            Err(err) => {
                warn!(error = %err, "Identity check failed; keeping stored session");
                None
            }
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn cache(&self) -> &CacheSynchronizer {
        &self.sync
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(&self.sync)
    }

    pub fn expenses(&self) -> ExpensesApi<'_> {
        ExpensesApi::new(&self.sync, self.page_size)
    }

    pub fn budgets(&self) -> BudgetsApi<'_> {
        BudgetsApi::new(&self.sync)
    }

    pub fn logout(&self) {
        self.auth().logout();
    }
}
