//! Query cache keyed by resource kind and filter set.
//!
//! Entries go stale only through [`QueryCache::invalidate`], never by time.
//! Concurrent reads of the same key share one outstanding fetch, and that
//! fetch runs on its own task so it completes even if every reader goes away.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

use crate::errors::ApiError;
use crate::filters::FilterSet;
use crate::models::ResourceKind;

type Snapshot = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<Snapshot, ApiError>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh,
    Stale,
    /// The last re-fetch failed; the collection is the previous good one.
    Error,
}

/// Cache key: structural over the filter set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ResourceKind,
    pub filters: FilterSet,
}

impl CacheKey {
    pub fn new(kind: ResourceKind, filters: FilterSet) -> Self {
        Self { kind, filters }
    }
}

/// A cached collection. The collection is an immutable shared snapshot.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub collection: Arc<Vec<T>>,
    pub fetched_at: DateTime<Utc>,
    pub status: CacheStatus,
}

struct StoredEntry {
    collection: Snapshot,
    fetched_at: DateTime<Utc>,
    status: CacheStatus,
}

struct InFlight {
    id: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, StoredEntry>,
    in_flight: HashMap<CacheKey, InFlight>,
    /// Bumped on every invalidation of a kind.
    generations: HashMap<ResourceKind, u64>,
    /// Bumped on every clear; results of older fetches are dropped.
    epoch: u64,
    next_fetch_id: u64,
}

impl CacheState {
    fn generation(&self, kind: ResourceKind) -> u64 {
        self.generations.get(&kind).copied().unwrap_or(0)
    }
}

/// Identifies one spawned fetch and the cache state it started from.
#[derive(Debug, Clone, Copy)]
struct FetchTag {
    id: u64,
    generation: u64,
    epoch: u64,
}

/// Shared query cache service. Cloning yields another handle to the same cache.
#[derive(Clone, Default)]
pub struct QueryCache {
    state: Arc<Mutex<CacheState>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current entry for the key, whatever its status.
    pub async fn get<T>(&self, kind: ResourceKind, filters: &FilterSet) -> Option<CacheEntry<T>>
    where
        T: Send + Sync + 'static,
    {
        let state = self.state.lock().await;
        let key = CacheKey::new(kind, filters.clone());
        let entry = state.entries.get(&key)?;
        let collection = Arc::clone(&entry.collection).downcast::<Vec<T>>().ok()?;
        Some(CacheEntry {
            collection,
            fetched_at: entry.fetched_at,
            status: entry.status,
        })
    }

    /// Store a collection as fresh.
    pub async fn put<T>(&self, kind: ResourceKind, filters: FilterSet, collection: Vec<T>)
    where
        T: Send + Sync + 'static,
    {
        let mut state = self.state.lock().await;
        state.entries.insert(
            CacheKey::new(kind, filters),
            StoredEntry {
                collection: Arc::new(collection),
                fetched_at: Utc::now(),
                status: CacheStatus::Fresh,
            },
        );
    }

    /// Mark every entry of `kind` stale, whatever its filters. Returns how many were marked.
    pub async fn invalidate(&self, kind: ResourceKind) -> usize {
        let mut state = self.state.lock().await;
        *state.generations.entry(kind).or_insert(0) += 1;

        let mut marked = 0;
        for (key, entry) in state.entries.iter_mut() {
            if key.kind == kind {
                entry.status = CacheStatus::Stale;
                marked += 1;
            }
        }

        tracing::debug!("Invalidated {} cached {} collection(s)", marked, kind);
        marked
    }

    /// Drop everything, e.g. on sign-out.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.in_flight.clear();
        state.epoch += 1;
    }

    /// Serve a fresh entry, or fetch once and share the result with every
    /// concurrent reader of the same key.
    pub async fn fetch_with<T, F, Fut>(
        &self,
        kind: ResourceKind,
        filters: &FilterSet,
        fetch: F,
    ) -> Result<Arc<Vec<T>>, ApiError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, ApiError>> + Send + 'static,
    {
        let key = CacheKey::new(kind, filters.clone());

        let pending = {
            let mut state = self.state.lock().await;

            if let Some(entry) = state.entries.get(&key) {
                if entry.status == CacheStatus::Fresh {
                    if let Ok(collection) = Arc::clone(&entry.collection).downcast::<Vec<T>>() {
                        tracing::debug!("Cache hit for {} {:?}", kind, filters.to_query_pairs());
                        return Ok(collection);
                    }
                }
            }

            match state.in_flight.get(&key) {
                Some(pending) => {
                    tracing::debug!("Joining in-flight fetch for {}", kind);
                    pending.fetch.clone()
                }
                None => {
                    tracing::debug!("Cache miss for {} {:?}", kind, filters.to_query_pairs());
                    state.next_fetch_id += 1;
                    let tag = FetchTag {
                        id: state.next_fetch_id,
                        generation: state.generation(kind),
                        epoch: state.epoch,
                    };
                    let pending = self.spawn_fetch(key.clone(), tag, fetch());
                    state.in_flight.insert(
                        key,
                        InFlight {
                            id: tag.id,
                            fetch: pending.clone(),
                        },
                    );
                    pending
                }
            }
        };

        let snapshot = pending.await?;
        snapshot
            .downcast::<Vec<T>>()
            .map_err(|_| ApiError::Decode {
                url: kind.path().to_string(),
                message: "cached collection has an unexpected type".to_string(),
            })
    }

    fn spawn_fetch<T, Fut>(&self, key: CacheKey, tag: FetchTag, fetch: Fut) -> SharedFetch
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, ApiError>> + Send + 'static,
    {
        let cache = self.clone();
        let handle = tokio::spawn(async move {
            let result = fetch.await.map(|collection| Arc::new(collection) as Snapshot);
            cache.complete(key, tag, &result).await;
            result
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => Err(ApiError::Task(e.to_string())),
            }
        }
        .boxed()
        .shared()
    }

    /// Record a finished fetch. A fetch that started before an invalidation
    /// of its kind is stored stale; one that started before a clear is dropped.
    async fn complete(&self, key: CacheKey, tag: FetchTag, result: &Result<Snapshot, ApiError>) {
        let mut state = self.state.lock().await;
        if state.in_flight.get(&key).is_some_and(|pending| pending.id == tag.id) {
            state.in_flight.remove(&key);
        }

        if state.epoch != tag.epoch {
            tracing::debug!("Discarding {} fetch that started before a clear", key.kind);
            return;
        }

        match result {
            Ok(snapshot) => {
                let status = if state.generation(key.kind) == tag.generation {
                    CacheStatus::Fresh
                } else {
                    CacheStatus::Stale
                };
                state.entries.insert(
                    key,
                    StoredEntry {
                        collection: Arc::clone(snapshot),
                        fetched_at: Utc::now(),
                        status,
                    },
                );
            }
            Err(e) => {
                tracing::warn!("Fetching {} failed: {}", key.kind, e);
                if let Some(entry) = state.entries.get_mut(&key) {
                    entry.status = CacheStatus::Error;
                }
            }
        }
    }
}
