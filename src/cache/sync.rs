//! Cache synchronizer: serves reads from the cache, funnels writes through
//! the request pipeline and drops the entries each write made stale.

use std::sync::Arc;

use metrics::counter;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::infra::telemetry::{METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATED, METRIC_CACHE_MISS};
use crate::pipeline::{ApiError, ApiRequest, ApiResponse, RequestPipeline};
use crate::util::SingleFlight;

use super::config::CacheConfig;
use super::keys::{CacheKey, QueryParams, Resource};
use super::planner::Mutation;
use super::store::{CacheStore, CachedValue, Epoch, EntryStatus};

/// What a renderer should show for a query right now.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    /// Nothing cached for the key yet. `placeholder` is the value cached for
    /// the placeholder parameters (typically the previously shown page).
    Loading { placeholder: Option<Value> },
    /// A value is cached for the key; `refreshing` reports a refetch in flight.
    Ready {
        value: Value,
        status: EntryStatus,
        refreshing: bool,
    },
}

impl QueryState {
    /// The value to render, either the key's own or the placeholder.
    pub fn value(&self) -> Option<&Value> {
        match self {
            QueryState::Loading { placeholder } => placeholder.as_ref(),
            QueryState::Ready { value, .. } => Some(value),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading { .. })
    }
}

pub struct CacheSynchronizer {
    pipeline: Arc<RequestPipeline>,
    store: CacheStore,
    flights: SingleFlight<(CacheKey, Epoch), Result<Value, ApiError>>,
    enabled: bool,
}

impl CacheSynchronizer {
    pub fn new(pipeline: Arc<RequestPipeline>, config: &CacheConfig) -> Self {
        Self {
            pipeline,
            store: CacheStore::new(config),
            flights: SingleFlight::new(),
            enabled: config.enabled,
        }
    }

    pub fn pipeline(&self) -> &Arc<RequestPipeline> {
        &self.pipeline
    }

    /// Return the value for `(resource, params)`, from cache when fresh.
    pub async fn read(&self, resource: Resource, params: QueryParams) -> Result<Value, ApiError> {
        self.read_key(CacheKey::new(resource, params)).await
    }

    /// [`read`](Self::read) decoded into `T`.
    pub async fn read_as<T: DeserializeOwned>(
        &self,
        resource: Resource,
        params: QueryParams,
    ) -> Result<T, ApiError> {
        let value = self.read(resource, params).await?;
        serde_json::from_value(value).map_err(ApiError::decode)
    }

    /// Read by key. Concurrent reads of the same key share one fetch; a read
    /// issued after an invalidation never joins a fetch that started before it.
    pub async fn read_key(&self, key: CacheKey) -> Result<Value, ApiError> {
        if !self.enabled {
            return self.fetch_uncached(&key).await;
        }

        let fingerprint = key.fingerprint();
        if let Some(value) = self.store.get_fresh(&key) {
            counter!(METRIC_CACHE_HIT, "resource" => key.resource.as_str()).increment(1);
            debug!(resource = key.resource.as_str(), fingerprint, "Cache hit");
            return Ok(value);
        }
        counter!(METRIC_CACHE_MISS, "resource" => key.resource.as_str()).increment(1);

        let epoch = self.store.epoch(key.resource);
        self.flights
            .run_unless(
                (key.clone(), epoch),
                || self.store.get_fresh(&key).map(Ok),
                || self.fetch(&key, epoch),
            )
            .await
    }

    /// Cached value for `(resource, params)` whatever its age, without a fetch.
    pub fn peek(&self, resource: Resource, params: &QueryParams) -> Option<CachedValue> {
        self.store.peek(&CacheKey::new(resource, params.clone()))
    }

    /// Non-blocking view for a renderer.
    ///
    /// While the key has no value yet, the value cached for `placeholder` is
    /// offered instead so a pager does not blank the table between pages.
    pub fn snapshot(
        &self,
        resource: Resource,
        params: &QueryParams,
        placeholder: Option<&QueryParams>,
    ) -> QueryState {
        let key = CacheKey::new(resource, params.clone());
        match self.store.peek(&key) {
            Some(cached) => QueryState::Ready {
                refreshing: self.is_fetching(&key),
                value: cached.value,
                status: cached.status,
            },
            None => QueryState::Loading {
                placeholder: placeholder
                    .and_then(|params| self.peek(resource, params))
                    .map(|cached| cached.value),
            },
        }
    }

    /// Whether a fetch for `(resource, params)` is in flight.
    pub fn is_refreshing(&self, resource: Resource, params: &QueryParams) -> bool {
        self.is_fetching(&CacheKey::new(resource, params.clone()))
    }

    /// Send a write and, once its success response is fully received, drop
    /// every entry of the families `mutation` affects. Entries are not refetched.
    pub async fn write(
        &self,
        mutation: Mutation,
        request: &ApiRequest,
    ) -> Result<ApiResponse, ApiError> {
        let response = self.send(request).await?;
        let removed: usize = mutation
            .invalidates()
            .iter()
            .map(|resource| self.invalidate(*resource))
            .sum();
        info!(
            mutation = mutation.as_str(),
            removed, "Write applied; affected cache families invalidated"
        );
        Ok(response)
    }

    /// Send a request that is never cached (e.g. a file export).
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let outcome = self.pipeline.send(request).await;
        self.on_outcome(outcome.as_ref().err());
        outcome
    }

    /// Drop every entry of `resource`. Returns the number removed.
    pub fn invalidate(&self, resource: Resource) -> usize {
        let removed = self.store.invalidate(resource);
        counter!(METRIC_CACHE_INVALIDATED, "resource" => resource.as_str())
            .increment(removed as u64);
        debug!(resource = resource.as_str(), removed, "Cache family invalidated");
        removed
    }

    /// Drop everything; used on logout and session expiry.
    pub fn clear(&self) {
        self.store.clear();
        debug!("Cache cleared");
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn is_fetching(&self, key: &CacheKey) -> bool {
        self.flights
            .is_in_flight(&(key.clone(), self.store.epoch(key.resource)))
    }

    async fn fetch(&self, key: &CacheKey, epoch: Epoch) -> Result<Value, ApiError> {
        let value = self.fetch_uncached(key).await?;
        if !self.store.insert_if_current(key.clone(), value.clone(), epoch) {
            debug!(
                resource = key.resource.as_str(),
                fingerprint = key.fingerprint(),
                "Family invalidated during fetch; result not cached"
            );
        }
        Ok(value)
    }

    async fn fetch_uncached(&self, key: &CacheKey) -> Result<Value, ApiError> {
        let response = self.send(&key.request()).await?;
        response.json()
    }

    fn on_outcome(&self, error: Option<&ApiError>) {
        if matches!(error, Some(ApiError::SessionExpired)) {
            self.clear();
        }
    }
}
