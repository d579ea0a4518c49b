//! Domain queries and mutations over the marketplace API.
//!
//! Reads go through the [`QueryCache`] under keys built in [`keys`]; a read without a token is
//! disabled rather than failed. Writes call the API directly and, on success, invalidate every
//! key whose data they could have changed. Nothing is written to the cache optimistically, so
//! a failed write has nothing to roll back.

mod applications;
mod jobs;
pub mod keys;
mod messaging;

use std::future::Future;
use std::sync::Arc;

use crate::api::{ApiError, MarketplaceApi};
use crate::config::SyncConfig;
use crate::query::{KeyFilter, QueryCache, QueryKey, QueryOptions, QueryState, QuerySubscription};

/// Failure of a mutation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    #[error("sign in to continue")]
    Unauthenticated,
    #[error("message is empty")]
    EmptyMessage,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SyncError {
    /// Message for a toast or alert: the backend's `detail` where there is one.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Api(error) => error.user_message(),
            other => other.to_string(),
        }
    }
}

/// Entry point the views hold: API client, query cache, and cadence settings.
#[derive(Clone)]
pub struct MarketplaceSync {
    api: Arc<dyn MarketplaceApi>,
    cache: QueryCache,
    config: SyncConfig,
}

impl MarketplaceSync {
    pub fn new(api: Arc<dyn MarketplaceApi>, cache: QueryCache, config: SyncConfig) -> Self {
        Self { api, cache, config }
    }

    pub fn api(&self) -> &Arc<dyn MarketplaceApi> {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Sign-out: forget everything cached for the previous session.
    pub fn reset(&self) {
        self.cache.clear();
    }

    fn read_options(&self, token: Option<&str>) -> QueryOptions {
        QueryOptions::default()
            .enabled(token.is_some_and(|token| !token.trim().is_empty()))
            .stale_time(self.config.stale_time)
    }

    fn invalidate_all(&self, filters: &[KeyFilter]) {
        for filter in filters {
            self.cache.invalidate(filter);
        }
    }

    /// Cached read of an authenticated resource; `call` only runs when a token is present.
    async fn authed_read<T, F, Fut>(
        &self,
        key: QueryKey,
        token: Option<&str>,
        call: F,
    ) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<dyn MarketplaceApi>, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let options = self.read_options(token);
        let fetcher = self.bind(token, call);
        self.cache.fetch(key, &options, fetcher).await
    }

    /// Polling subscription for an authenticated resource. Without a token the subscription
    /// stays idle and never calls the backend.
    fn authed_watch<T, F, Fut>(
        &self,
        key: QueryKey,
        token: Option<&str>,
        interval: std::time::Duration,
        call: F,
    ) -> QuerySubscription<T>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<dyn MarketplaceApi>, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let options = self.read_options(token).refetch_every(interval);
        let fetcher = self.bind(token, call);
        self.cache.watch(key, options, fetcher)
    }

    fn bind<T, F, Fut>(
        &self,
        token: Option<&str>,
        call: F,
    ) -> impl Fn() -> Fut + Send + Sync + 'static
    where
        F: Fn(Arc<dyn MarketplaceApi>, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let api = self.api.clone();
        let token = token.unwrap_or_default().to_string();
        move || call(api.clone(), token.clone())
    }
}

pub(crate) fn require_token(token: Option<&str>) -> Result<String, SyncError> {
    token
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or(SyncError::Unauthenticated)
}
