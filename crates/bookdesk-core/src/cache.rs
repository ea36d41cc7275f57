// ── Query cache ──
//
// One entry per `CacheKey`, each holding the last-known data, a loading
// flag, the last error and a staleness bit, published through a `watch`
// channel. Identical keys share one in-flight request. Every fetch is
// tagged with a per-key generation; a response that is not the latest
// issued for its key is dropped instead of overwriting newer data.

use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared, join_all};
use tokio::sync::{Mutex, watch};
use tracing::debug;

use crate::error::CoreError;
use crate::resource::{CacheKey, QueryScope};

type Data = Arc<dyn Any + Send + Sync>;
type Outcome = Result<Data, Arc<CoreError>>;
type Inflight = Shared<BoxFuture<'static, Outcome>>;

struct Fetcher(Box<dyn Fn() -> BoxFuture<'static, Result<Data, CoreError>> + Send + Sync>);

impl Fetcher {
    fn new<T, F, Fut>(fetch: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        Self(Box::new(move || {
            let request = fetch();
            async move { request.await.map(|value| Arc::new(value) as Data) }.boxed()
        }))
    }
}

/// Point-in-time state of one cache entry.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub data: Option<Arc<dyn Any + Send + Sync>>,
    pub is_loading: bool,
    pub error: Option<Arc<CoreError>>,
    pub is_stale: bool,
    pub updated_at: Option<Instant>,
}

struct Entry {
    key: CacheKey,
    state: watch::Sender<Snapshot>,
    generation: AtomicU64,
    /// Mounted observers. Only observed entries refetch on invalidate.
    observers: AtomicUsize,
    fetcher: ArcSwapOption<Fetcher>,
    inflight: Mutex<Option<(u64, Inflight)>>,
}

impl Entry {
    fn new(key: CacheKey) -> Self {
        let (state, _) = watch::channel(Snapshot::default());
        Self {
            key,
            state,
            generation: AtomicU64::new(0),
            observers: AtomicUsize::new(0),
            fetcher: ArcSwapOption::empty(),
            inflight: Mutex::new(None),
        }
    }

    /// Issue a new request under the next generation. The request is
    /// spawned so it settles even if every caller stops waiting.
    fn start(self: &Arc<Self>, fetcher: &Fetcher) -> (u64, Inflight) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| s.is_loading = true);
        debug!(key = %self.key, generation, "fetch started");

        let request = (fetcher.0)();
        let entry = Arc::clone(self);
        let pending = async move {
            let outcome = request.await.map_err(Arc::new);
            entry.settle(generation, &outcome).await;
            outcome
        }
        .boxed()
        .shared();

        tokio::spawn(pending.clone());
        (generation, pending)
    }

    async fn settle(&self, generation: u64, outcome: &Outcome) {
        {
            let mut inflight = self.inflight.lock().await;
            if inflight.as_ref().is_some_and(|(g, _)| *g == generation) {
                *inflight = None;
            }
        }

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(key = %self.key, generation, "discarding superseded response");
            return;
        }

        self.state.send_modify(|s| {
            s.is_loading = false;
            match outcome {
                Ok(data) => {
                    s.data = Some(Arc::clone(data));
                    s.error = None;
                    s.is_stale = false;
                    s.updated_at = Some(Instant::now());
                }
                Err(e) => s.error = Some(Arc::clone(e)),
            }
        });
    }

    /// Join the in-flight request, serve fresh data, or start a request.
    /// `force` always starts a new generation.
    async fn run(self: &Arc<Self>, force: bool) -> Outcome {
        let pending = {
            let mut inflight = self.inflight.lock().await;
            match inflight.as_ref() {
                Some((_, pending)) if !force => pending.clone(),
                _ => {
                    if !force {
                        let snap = self.state.borrow();
                        if let (Some(data), false, None) = (&snap.data, snap.is_stale, &snap.error) {
                            return Ok(Arc::clone(data));
                        }
                    }
                    let Some(fetcher) = self.fetcher.load_full() else {
                        return Err(Arc::new(CoreError::Internal(format!(
                            "no fetcher registered for {}",
                            self.key
                        ))));
                    };
                    let (generation, pending) = self.start(&fetcher);
                    *inflight = Some((generation, pending.clone()));
                    pending
                }
            }
        };
        pending.await
    }
}

fn downcast<T: Send + Sync + 'static>(data: Data, key: &CacheKey) -> Result<Arc<T>, Arc<CoreError>> {
    data.downcast::<T>().map_err(|_| {
        Arc::new(CoreError::Internal(format!(
            "cached value for {key} has an unexpected type"
        )))
    })
}

// ── QueryCache ───────────────────────────────────────────────────────

/// Shared, explicitly injected query cache. Cheap to clone.
#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<DashMap<CacheKey, Arc<Entry>>>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &CacheKey) -> Arc<Entry> {
        let slot = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Entry::new(key.clone())));
        Arc::clone(slot.value())
    }

    /// One-shot read through the cache: joins an in-flight request for the
    /// same key, returns fresh cached data, or fetches.
    pub async fn fetch<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<Arc<T>, Arc<CoreError>>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let entry = self.entry(&key);
        entry.fetcher.store(Some(Arc::new(Fetcher::new(fetch))));
        let data = entry.run(false).await?;
        downcast(data, &key)
    }

    /// Mount an observer on `key`. Nothing is fetched until
    /// [`QueryObserver::load`] is called.
    pub fn observe<T, F, Fut>(&self, key: CacheKey, fetch: F) -> QueryObserver<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let entry = self.entry(&key);
        entry.observers.fetch_add(1, Ordering::SeqCst);
        entry.fetcher.store(Some(Arc::new(Fetcher::new(fetch))));
        QueryObserver {
            cache: self.clone(),
            rx: entry.state.subscribe(),
            entry,
            previous: None,
            _marker: PhantomData,
        }
    }

    /// Current state of `key`, if it has ever been requested.
    pub fn snapshot(&self, key: &CacheKey) -> Option<Snapshot> {
        self.entries.get(key).map(|e| e.state.borrow().clone())
    }

    /// Cached data for `key`, typed.
    pub fn get<T: Send + Sync + 'static>(&self, key: &CacheKey) -> Option<Arc<T>> {
        self.snapshot(key)?.data?.downcast::<T>().ok()
    }

    /// Number of mounted observers on `key`.
    pub fn observers(&self, key: &CacheKey) -> usize {
        self.entries
            .get(key)
            .map_or(0, |e| e.observers.load(Ordering::SeqCst))
    }

    /// Mark every entry whose key matches as stale and refetch the ones
    /// that are currently observed. Returns once those refetches settle.
    pub async fn invalidate(&self, predicate: impl Fn(&CacheKey) -> bool) {
        let matched: Vec<Arc<Entry>> = self
            .entries
            .iter()
            .filter(|e| predicate(e.key()))
            .map(|e| Arc::clone(e.value()))
            .collect();

        let mut refetches = Vec::new();
        for entry in &matched {
            entry.state.send_modify(|s| s.is_stale = true);
            if entry.observers.load(Ordering::SeqCst) > 0 {
                refetches.push(entry.run(true));
            }
        }

        debug!(
            matched = matched.len(),
            refetching = refetches.len(),
            "cache invalidated"
        );
        join_all(refetches).await;
    }

    /// Invalidate every entry of one scope, whatever its params.
    pub async fn invalidate_scope(&self, scope: QueryScope) {
        self.invalidate(|key| key.scope == scope).await;
    }

    /// Drop every entry. Mounted observers keep their own handle.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── QueryObserver ────────────────────────────────────────────────────

/// What a consumer renders for one query.
#[derive(Debug, Clone)]
pub struct QueryView<T> {
    /// Data for the current key, or the previous key's data while the
    /// current one has never loaded (`is_previous`).
    pub data: Option<Arc<T>>,
    pub is_loading: bool,
    pub error: Option<Arc<CoreError>>,
    pub is_stale: bool,
    pub is_previous: bool,
}

/// A mounted consumer of one cache key at a time.
///
/// Switching keys keeps the last page visible until the new key has data,
/// so pagination does not flash an empty state. Dropping the observer
/// unmounts it.
pub struct QueryObserver<T> {
    cache: QueryCache,
    entry: Arc<Entry>,
    rx: watch::Receiver<Snapshot>,
    previous: Option<Arc<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> QueryObserver<T> {
    pub fn key(&self) -> &CacheKey {
        &self.entry.key
    }

    /// Point the observer at another key. The fetcher is always replaced;
    /// the key switch is a no-op when it is unchanged.
    pub fn set_key<F, Fut>(&mut self, key: CacheKey, fetch: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        if key != self.entry.key {
            if let Some(current) = self.current_data() {
                self.previous = Some(current);
            }
            self.entry.observers.fetch_sub(1, Ordering::SeqCst);
            let entry = self.cache.entry(&key);
            entry.observers.fetch_add(1, Ordering::SeqCst);
            self.rx = entry.state.subscribe();
            self.entry = entry;
        }
        self.entry
            .fetcher
            .store(Some(Arc::new(Fetcher::new(fetch))));
    }

    /// Load the current key (deduplicated, cached while fresh).
    pub async fn load(&self) -> Result<Arc<T>, Arc<CoreError>> {
        let data = self.entry.run(false).await?;
        downcast(data, &self.entry.key)
    }

    /// Refetch the current key regardless of freshness.
    pub async fn refresh(&self) -> Result<Arc<T>, Arc<CoreError>> {
        let data = self.entry.run(true).await?;
        downcast(data, &self.entry.key)
    }

    fn current_data(&self) -> Option<Arc<T>> {
        self.entry.state.borrow().data.clone()?.downcast::<T>().ok()
    }

    pub fn view(&self) -> QueryView<T> {
        let snap = self.entry.state.borrow().clone();
        let current = snap.data.clone().and_then(|d| d.downcast::<T>().ok());
        let (data, is_previous) = match current {
            Some(data) => (Some(data), false),
            None => (self.previous.clone(), self.previous.is_some()),
        };
        QueryView {
            data,
            is_loading: snap.is_loading || (snap.data.is_none() && snap.error.is_none()),
            error: snap.error,
            is_stale: snap.is_stale,
            is_previous,
        }
    }

    /// Wait for the next state change on the current key.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

impl<T> Drop for QueryObserver<T> {
    fn drop(&mut self) {
        self.entry.observers.fetch_sub(1, Ordering::SeqCst);
    }
}
