use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{broadcast, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use super::key::{KeyFilter, QueryKey};
use super::subscription::QuerySubscription;
use crate::api::ApiError;

type Erased = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<Erased, ApiError>>>;

/// Per-query behavior.
///
/// `retry` is the number of immediate re-attempts after a failed fetch. The default is zero:
/// a failure is surfaced on the first error and the next read or poll tries again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub enabled: bool,
    pub stale_time: Duration,
    pub refetch_interval: Option<Duration>,
    pub retry: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_time: Duration::ZERO,
            refetch_interval: None,
            retry: 0,
        }
    }
}

impl QueryOptions {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn refetch_every(mut self, interval: Duration) -> Self {
        self.refetch_interval = Some(interval);
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }
}

/// What a view renders for a query. `data` stays `None` until the first successful fetch and
/// keeps its last good value when a later fetch fails.
#[derive(Debug)]
pub struct QueryState<T> {
    pub data: Option<Arc<T>>,
    pub error: Option<ApiError>,
    pub is_loading: bool,
    pub updated_at: Option<Instant>,
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            is_loading: self.is_loading,
            updated_at: self.updated_at,
        }
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            updated_at: None,
        }
    }
}

impl<T> QueryState<T> {
    pub fn is_success(&self) -> bool {
        self.data.is_some() && self.error.is_none()
    }

    fn from_result(result: Result<Erased, ApiError>) -> Self
    where
        T: Send + Sync + 'static,
    {
        match result {
            Ok(value) => Self {
                data: value.downcast::<T>().ok(),
                error: None,
                is_loading: false,
                updated_at: Some(Instant::now()),
            },
            Err(error) => Self {
                error: Some(error),
                ..Self::default()
            },
        }
    }
}

struct InFlight {
    id: u64,
    generation: u64,
    future: SharedFetch,
}

#[derive(Default)]
struct Entry {
    value: Option<Erased>,
    error: Option<ApiError>,
    updated_at: Option<Instant>,
    invalidated: bool,
    generation: u64,
    in_flight: Option<InFlight>,
}

impl Entry {
    fn is_fresh(&self, stale_time: Duration) -> bool {
        match (&self.value, self.updated_at) {
            (Some(_), Some(updated_at)) => {
                !self.invalidated && self.error.is_none() && updated_at.elapsed() < stale_time
            }
            _ => false,
        }
    }

    fn commit(&mut self, started_generation: u64, result: Result<Erased, ApiError>) {
        match result {
            Ok(value) => {
                self.value = Some(value);
                self.error = None;
                self.updated_at = Some(Instant::now());
                // Invalidated while in flight: keep the data but force the next read out.
                self.invalidated = self.generation != started_generation;
            }
            Err(error) => self.error = Some(error),
        }
    }

    fn state<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        let data = self.value.clone().and_then(|value| match value.downcast::<T>() {
            Ok(data) => Some(data),
            Err(_) => {
                warn!(%key, "cached value has an unexpected type");
                None
            }
        });

        QueryState {
            data,
            error: self.error.clone(),
            is_loading: self.in_flight.is_some(),
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FetchMode {
    /// Serve fresh data from cache, go to network otherwise.
    IfStale,
    /// Go to network regardless of freshness (poll ticks); still joins an in-flight request.
    Refetch,
}

struct CacheInner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    next_fetch: AtomicU64,
    invalidations: broadcast::Sender<KeyFilter>,
}

/// Shared store of query results. Clone it to hand the same cache to several consumers.
///
/// Entries are never evicted on their own: every distinct key read stays until [`clear`] or
/// [`prune_idle`]. Long-lived clients that page through many filters should prune
/// periodically.
///
/// [`clear`]: QueryCache::clear
/// [`prune_idle`]: QueryCache::prune_idle
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (invalidations, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(HashMap::new()),
                next_fetch: AtomicU64::new(1),
                invalidations,
            }),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.inner
            .entries
            .lock()
            .expect("query cache mutex poisoned")
    }

    /// Resolve a query: cached when fresh, joined when already in flight, fetched otherwise.
    /// A disabled query returns whatever is cached without calling `fetcher`.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        options: &QueryOptions,
        fetcher: F,
    ) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.run(key, options, Arc::new(fetcher), FetchMode::IfStale)
            .await
    }

    pub(super) async fn run<T, F, Fut>(
        &self,
        key: QueryKey,
        options: &QueryOptions,
        fetcher: Arc<F>,
        mode: FetchMode,
    ) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        if !options.enabled {
            return self.snapshot(&key);
        }

        let (fetch_id, future) = {
            let mut entries = self.entries();
            let entry = entries.entry(key.clone()).or_default();

            if mode == FetchMode::IfStale && entry.is_fresh(options.stale_time) {
                debug!(%key, "query cache hit");
                return entry.state(&key);
            }

            match &entry.in_flight {
                Some(in_flight) => {
                    debug!(%key, "joining in-flight query");
                    (in_flight.id, in_flight.future.clone())
                }
                None => {
                    let id = self.inner.next_fetch.fetch_add(1, Ordering::Relaxed);
                    debug!(%key, fetch = id, ?mode, "fetching query");
                    let future = spawn_fetch(key.clone(), fetcher, options.retry);
                    entry.in_flight = Some(InFlight {
                        id,
                        generation: entry.generation,
                        future: future.clone(),
                    });
                    (id, future)
                }
            }
        };

        let result = future.await;

        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(&key) else {
            // Cleared while the request was out; hand the result back without caching it.
            return QueryState::from_result(result);
        };

        let owns_fetch = matches!(&entry.in_flight, Some(in_flight) if in_flight.id == fetch_id);
        if owns_fetch {
            if let Some(in_flight) = entry.in_flight.take() {
                if let Err(error) = &result {
                    warn!(%key, status = ?error.status, error = %error, "query failed");
                }
                entry.commit(in_flight.generation, result);
            }
        }

        entry.state(&key)
    }

    /// Current cached state for `key` without touching the network.
    pub fn snapshot<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        self.entries()
            .get(key)
            .map(|entry| entry.state(key))
            .unwrap_or_default()
    }

    pub fn get_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        self.snapshot::<T>(key).data
    }

    /// Mark every matching entry stale and wake subscriptions watching those keys.
    pub fn invalidate(&self, filter: &KeyFilter) -> usize {
        let mut matched = 0;
        {
            let mut entries = self.entries();
            for (key, entry) in entries.iter_mut() {
                if filter.matches(key) {
                    entry.invalidated = true;
                    entry.generation += 1;
                    matched += 1;
                }
            }
        }

        debug!(?filter, matched, "invalidated queries");
        // No subscribers is not an error.
        let _ = self.inner.invalidations.send(filter.clone());
        matched
    }

    pub fn is_invalidated(&self, key: &QueryKey) -> bool {
        self.entries()
            .get(key)
            .map(|entry| entry.invalidated)
            .unwrap_or(false)
    }

    pub fn entry_count(&self) -> usize {
        self.entries().len()
    }

    /// Drop every entry, e.g. at sign-out. Requests still in flight finish without caching.
    pub fn clear(&self) {
        self.entries().clear();
        debug!("query cache cleared");
    }

    /// Drop entries that have not been refreshed for `max_idle`, along with entries that never
    /// got data. In-flight entries are kept. Watched keys refresh on every poll, so they
    /// survive as long as `max_idle` is longer than their interval.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| {
            entry.in_flight.is_some()
                || entry
                    .updated_at
                    .is_some_and(|updated_at| updated_at.elapsed() < max_idle)
        });
        let pruned = before - entries.len();
        if pruned > 0 {
            debug!(pruned, remaining = entries.len(), "pruned idle queries");
        }
        pruned
    }

    /// Mount a query: fetch now, refetch every `refetch_interval`, and refetch whenever a
    /// matching key is invalidated. Polling stops when the subscription is dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn watch<T, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetcher: F,
    ) -> QuerySubscription<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let mut initial = self.snapshot::<T>(&key);
        initial.is_loading = options.enabled;
        let (sender, receiver) = watch::channel(initial);

        let cache = self.clone();
        let fetcher = Arc::new(fetcher);
        let mut invalidations = self.inner.invalidations.subscribe();

        let handle = tokio::spawn(async move {
            let mut mode = FetchMode::IfStale;
            loop {
                let state = cache.run(key.clone(), &options, fetcher.clone(), mode).await;
                if sender.send(state).is_err() {
                    return;
                }

                let deadline = options
                    .refetch_interval
                    .map(|interval| Instant::now() + interval);
                let tick = wait_until(deadline);
                tokio::pin!(tick);

                mode = loop {
                    tokio::select! {
                        _ = &mut tick => break FetchMode::Refetch,
                        event = invalidations.recv() => match event {
                            Ok(filter) if filter.matches(&key) => break FetchMode::IfStale,
                            Ok(_) => continue,
                            Err(broadcast::error::RecvError::Lagged(_)) => break FetchMode::IfStale,
                            Err(broadcast::error::RecvError::Closed) => return,
                        },
                        _ = sender.closed() => return,
                    }
                };
            }
        });

        QuerySubscription::new(receiver, handle)
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

fn spawn_fetch<T, F, Fut>(key: QueryKey, fetcher: Arc<F>, retry: u32) -> SharedFetch
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    async move {
        let mut attempt = 0;
        loop {
            match fetcher().await {
                Ok(value) => return Ok(Arc::new(value) as Erased),
                Err(error) if attempt < retry => {
                    attempt += 1;
                    debug!(%key, attempt, error = %error, "retrying query");
                }
                Err(error) => return Err(error),
            }
        }
    }
    .boxed()
    .shared()
}
