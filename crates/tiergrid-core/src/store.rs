//! Process-wide cache and revalidation coordinator.
//!
//! One [`QueryStore`] owns a key-to-entry map. Each entry is a small state
//! machine (`Uninitialized -> Loading -> Ready | Error`, cycling for the
//! lifetime of the session) with a single-flight guarantee: at most one
//! network episode per key is in flight at any time, and every concurrent
//! caller for that key awaits the same shared future.
//!
//! The store is an explicit, constructible object injected into consumers,
//! never an ambient singleton; tests build isolated instances.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::endpoints::CacheKey;
use crate::error::FetchError;
use crate::policy::{RevalidationPolicy, StaleConfig};

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Uninitialized,
    Loading,
    Ready,
    Error,
}

/// Point-in-time view of one entry, handed to consumers.
///
/// `version` increments on every Ready transition; derived views memoize on
/// it. During a revalidation the previous data stays readable (state is
/// Loading, `data` still set).
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub state: QueryState,
    pub data: Option<Arc<Value>>,
    pub error: Option<FetchError>,
    pub version: u64,
    pub last_fetched_at: Option<Instant>,
}

impl QuerySnapshot {
    pub fn uninitialized() -> Self {
        Self {
            state: QueryState::Uninitialized,
            data: None,
            error: None,
            version: 0,
            last_fetched_at: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == QueryState::Loading
    }

    pub fn is_ready(&self) -> bool {
        self.state == QueryState::Ready
    }

    /// Display string for the outermost consumer boundary.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}

type StoredFetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<Value, FetchError>> + Send + Sync>;
type InFlight = Shared<BoxFuture<'static, Result<Arc<Value>, FetchError>>>;

struct CacheEntry {
    state: QueryState,
    data: Option<Arc<Value>>,
    error: Option<FetchError>,
    version: u64,
    last_fetched_at: Option<Instant>,
    in_flight: Option<InFlight>,
    policy: RevalidationPolicy,
    /// Fetcher registered by the most recent request; reused by focus,
    /// reconnect, and staleness triggers.
    fetcher: Option<StoredFetcher>,
}

impl CacheEntry {
    fn new(policy: RevalidationPolicy) -> Self {
        Self {
            state: QueryState::Uninitialized,
            data: None,
            error: None,
            version: 0,
            last_fetched_at: None,
            in_flight: None,
            policy,
            fetcher: None,
        }
    }

    fn snapshot(&self) -> QuerySnapshot {
        QuerySnapshot {
            state: self.state,
            data: self.data.clone(),
            error: self.error.clone(),
            version: self.version,
            last_fetched_at: self.last_fetched_at,
        }
    }

    /// Whether this request should start a new fetch episode. Called with no
    /// episode currently in flight.
    fn needs_fetch(&self, dedup_window: Duration, stale: StaleConfig) -> bool {
        match self.state {
            QueryState::Uninitialized | QueryState::Loading => true,
            QueryState::Ready => {
                let age = self
                    .last_fetched_at
                    .map(|at| at.elapsed())
                    .unwrap_or(Duration::MAX);
                if age < dedup_window {
                    return false;
                }
                self.policy.revalidate_if_stale && age >= stale.stale_after
            }
            QueryState::Error => self.policy.retry_on_error,
        }
    }

    fn settle(&mut self, result: &Result<Arc<Value>, FetchError>) {
        match result {
            Ok(value) => {
                self.data = Some(Arc::clone(value));
                self.error = None;
                self.state = QueryState::Ready;
                self.version += 1;
                self.last_fetched_at = Some(Instant::now());
            }
            Err(err) => {
                // Previous Ready data, if any, stays readable alongside the
                // recorded error.
                self.error = Some(err.clone());
                self.state = QueryState::Error;
            }
        }
        self.in_flight = None;
    }
}

/// Store-level configuration.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// Window during which repeated requests for a Ready key are served from
    /// cache without any network call.
    pub dedup_window: Duration,
    pub stale: StaleConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dedup_window: Duration::from_secs(60),
            stale: StaleConfig::default(),
        }
    }
}

/// Cache/revalidation coordinator keyed by [`CacheKey`].
#[derive(Clone)]
pub struct QueryStore {
    inner: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    config: StoreConfig,
}

impl QueryStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(StoreConfig::default())
    }

    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Request the resource behind `key`, fetching, joining an in-flight
    /// episode, or serving cache per the entry's state and `policy`.
    ///
    /// `None` is the do-not-fetch sentinel (e.g. no scenario selected yet):
    /// the store treats it as inert and returns an Uninitialized snapshot.
    ///
    /// The fetcher is registered with the entry and reused by revalidation
    /// triggers, so it must be self-contained.
    pub async fn fetch<F, Fut>(
        &self,
        key: Option<CacheKey>,
        policy: RevalidationPolicy,
        fetcher: F,
    ) -> QuerySnapshot
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
    {
        let Some(key) = key else {
            return QuerySnapshot::uninitialized();
        };
        let fetcher: StoredFetcher = Arc::new(move || fetcher().boxed());

        let episode = {
            let mut map = self.inner.write().await;
            let entry = map
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(policy));
            entry.policy = policy;
            entry.fetcher = Some(Arc::clone(&fetcher));

            if let Some(in_flight) = entry.in_flight.clone() {
                tracing::debug!(key = %key, "joining in-flight episode");
                Some(in_flight)
            } else if entry.needs_fetch(self.config.dedup_window, self.config.stale) {
                let episode = self.start_episode(&key, fetcher);
                entry.state = QueryState::Loading;
                entry.in_flight = Some(episode.clone());
                Some(episode)
            } else {
                tracing::debug!(key = %key, "serving cached entry");
                None
            }
        };

        if let Some(episode) = episode {
            // Settlement happens inside the shared future before it
            // resolves, so the snapshot below observes the settled entry.
            let _ = episode.await;
        }

        self.get(&key).await
    }

    /// Peek at the current state of a key without triggering a fetch.
    pub async fn get(&self, key: &CacheKey) -> QuerySnapshot {
        let map = self.inner.read().await;
        map.get(key)
            .map(CacheEntry::snapshot)
            .unwrap_or_else(QuerySnapshot::uninitialized)
    }

    /// Number of known keys (entries are never destroyed within a session).
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Window focus event: revalidate every settled entry whose policy opts
    /// in and whose dedup window has elapsed. Returns the number of keys
    /// revalidated.
    pub async fn notify_focus(&self) -> usize {
        self.revalidate_matching(|policy| policy.revalidate_on_focus)
            .await
    }

    /// Network reconnect event.
    pub async fn notify_reconnect(&self) -> usize {
        self.revalidate_matching(|policy| policy.revalidate_on_reconnect)
            .await
    }

    async fn revalidate_matching<P>(&self, selects: P) -> usize
    where
        P: Fn(&RevalidationPolicy) -> bool,
    {
        let episodes = {
            let mut map = self.inner.write().await;
            let mut episodes = Vec::new();
            for (key, entry) in map.iter_mut() {
                if entry.in_flight.is_some() || !selects(&entry.policy) {
                    continue;
                }
                let eligible = match entry.state {
                    // Triggers honor the dedup window just like repeat
                    // requests do.
                    QueryState::Ready => {
                        let age = entry
                            .last_fetched_at
                            .map(|at| at.elapsed())
                            .unwrap_or(Duration::MAX);
                        age >= self.config.dedup_window
                    }
                    QueryState::Error => entry.policy.retry_on_error,
                    QueryState::Uninitialized | QueryState::Loading => false,
                };
                if !eligible {
                    continue;
                }
                let Some(fetcher) = entry.fetcher.clone() else {
                    continue;
                };

                tracing::debug!(key = %key, "revalidating");
                let episode = self.start_episode(key, fetcher);
                entry.state = QueryState::Loading;
                entry.in_flight = Some(episode.clone());
                episodes.push(episode);
            }
            episodes
        };

        let count = episodes.len();
        futures::future::join_all(episodes).await;
        count
    }

    /// Build one fetch episode as a shared future that settles the entry
    /// (state, data/error, version, timestamp, in-flight slot) before
    /// resolving. Installed under the map lock by the caller, which is what
    /// upholds the single-flight invariant.
    fn start_episode(&self, key: &CacheKey, fetcher: StoredFetcher) -> InFlight {
        let inner = Arc::clone(&self.inner);
        let key = key.clone();
        let episode: BoxFuture<'static, Result<Arc<Value>, FetchError>> = async move {
            let result = fetcher().await.map(Arc::new);
            let mut map = inner.write().await;
            if let Some(entry) = map.get_mut(&key) {
                entry.settle(&result);
            }
            result
        }
        .boxed();
        episode.shared()
    }
}
