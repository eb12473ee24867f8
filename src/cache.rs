//! Client-side entity cache with stale-while-revalidate reads.
//!
//! Each partition (feeds, collections, articles) holds the last list the
//! server returned. Reads never wait: a missing or invalidated partition
//! schedules a background fetch and the caller gets whatever is cached now.
//!
//! Fetch bookkeeping per partition:
//!
//! - `Idle`: nothing outstanding
//! - `Scheduled`: a fetch task was spawned but has not hit the wire yet
//! - `InFlight`: the request is on the wire
//!
//! Invalidations while a fetch is scheduled or in flight are absorbed into
//! it: any number of them before the refetch completes yields one request.
//!
//! Failed fetches keep the previous list and record the error for display.
//! There is no retry here, not even when the snapshot passes its maximum
//! age; only an explicit invalidate/refresh fetches again.
//!
//! Every partition carries a generation, bumped by [`EntityCache::clear`].
//! A fetch task remembers the generation it was spawned for and its result
//! is dropped if the partition was cleared in the meantime.

use parking_lot::Mutex;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::api::{paths, ApiError, Article, Collection, Feed, Transport};

/// Identifies a cache partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Feeds,
    Collections,
    Articles,
}

impl CacheKey {
    pub const ALL: [CacheKey; 3] = [CacheKey::Feeds, CacheKey::Collections, CacheKey::Articles];

    /// Server endpoint backing this partition.
    pub fn path(self) -> &'static str {
        match self {
            CacheKey::Feeds => paths::FEEDS,
            CacheKey::Collections => paths::COLLECTIONS,
            CacheKey::Articles => paths::ARTICLES,
        }
    }
}

/// Freshness of a snapshot handed to a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// Never fetched successfully; the list is empty.
    Missing,
    /// Matches the last completed fetch and nothing is outstanding.
    Fresh,
    /// Last-known data served while a refetch is pending, or after the
    /// latest fetch failed. Expected, not an error.
    Stale,
}

/// What a read returns.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub items: Arc<Vec<T>>,
    pub status: ReadStatus,
    /// A fetch for this partition is scheduled or on the wire.
    pub fetching: bool,
    /// Error from the most recent fetch, cleared by the next success.
    pub error: Option<Arc<ApiError>>,
}

impl<T> Snapshot<T> {
    pub fn is_stale(&self) -> bool {
        self.status == ReadStatus::Stale
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchPhase {
    Idle,
    Scheduled,
    InFlight,
}

struct PartitionState<T> {
    items: Option<Arc<Vec<T>>>,
    fetched_at: Option<Instant>,
    phase: FetchPhase,
    error: Option<Arc<ApiError>>,
    /// Requests actually sent for this partition.
    dispatched: u64,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl<T> PartitionState<T> {
    fn empty(generation: u64) -> Self {
        Self {
            items: None,
            fetched_at: None,
            phase: FetchPhase::Idle,
            error: None,
            dispatched: 0,
            generation,
            task: None,
        }
    }

    /// Move to `Scheduled`; returns the generation the fetch belongs to.
    fn schedule(&mut self) -> u64 {
        self.phase = FetchPhase::Scheduled;
        self.generation
    }
}

pub(crate) struct Partition<T> {
    key: CacheKey,
    state: Mutex<PartitionState<T>>,
}

impl<T> Partition<T> {
    fn new(key: CacheKey) -> Self {
        Self {
            key,
            state: Mutex::new(PartitionState::empty(0)),
        }
    }

    /// Take a snapshot, plus the generation of a fetch the caller must spawn.
    fn read(&self, max_age: Option<Duration>) -> (Snapshot<T>, Option<u64>) {
        let mut state = self.state.lock();

        // A failed fetch is only retried on explicit invalidate/refresh.
        let never_tried = state.items.is_none() && state.error.is_none();
        let expired = match (max_age, state.fetched_at) {
            (Some(max), Some(at)) => state.error.is_none() && at.elapsed() >= max,
            _ => false,
        };

        let schedule = if (never_tried || expired) && state.phase == FetchPhase::Idle {
            Some(state.schedule())
        } else {
            None
        };

        let snapshot = Snapshot {
            items: state.items.clone().unwrap_or_default(),
            status: Self::status_of(&state),
            fetching: state.phase != FetchPhase::Idle,
            error: state.error.clone(),
        };
        (snapshot, schedule)
    }

    fn status_of(state: &PartitionState<T>) -> ReadStatus {
        if state.items.is_none() {
            ReadStatus::Missing
        } else if state.phase != FetchPhase::Idle || state.error.is_some() {
            ReadStatus::Stale
        } else {
            ReadStatus::Fresh
        }
    }

    /// Mark stale; returns the generation of a fetch the caller must spawn.
    fn invalidate(&self) -> Option<u64> {
        let mut state = self.state.lock();
        match state.phase {
            FetchPhase::Idle => Some(state.schedule()),
            FetchPhase::Scheduled | FetchPhase::InFlight => {
                tracing::trace!(key = ?self.key, phase = ?state.phase, "Invalidation absorbed by pending fetch");
                None
            }
        }
    }

    /// Returns false if the partition was cleared since `generation`.
    fn begin_dispatch(&self, generation: u64) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }
        state.phase = FetchPhase::InFlight;
        state.dispatched += 1;
        true
    }

    /// Store a fetch result unless the partition was cleared since
    /// `generation`. Returns whether the result was kept.
    fn complete(&self, generation: u64, result: Result<Vec<T>, ApiError>) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!(key = ?self.key, "Dropping fetch result from before clear");
            return false;
        }
        match result {
            Ok(items) => {
                tracing::debug!(key = ?self.key, count = items.len(), "Partition refreshed");
                state.items = Some(Arc::new(items));
                state.fetched_at = Some(Instant::now());
                state.error = None;
            }
            Err(e) => {
                tracing::warn!(key = ?self.key, error = %e, "Partition fetch failed, keeping previous snapshot");
                state.error = Some(Arc::new(e));
            }
        }

        state.phase = FetchPhase::Idle;
        state.task = None;
        true
    }

    fn reset(&self) {
        let mut state = self.state.lock();
        if let Some(task) = state.task.take() {
            task.abort();
        }
        let generation = state.generation.wrapping_add(1);
        *state = PartitionState::empty(generation);
    }
}

pub(crate) struct CacheInner {
    transport: Arc<dyn Transport>,
    max_age: Option<Duration>,
    feeds: Partition<Feed>,
    collections: Partition<Collection>,
    articles: Partition<Article>,
    version: watch::Sender<u64>,
}

impl CacheInner {
    fn bump(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }
}

/// Entity types stored in the cache, with the partition that holds them.
pub(crate) trait Cached: DeserializeOwned + Send + Sync + 'static {
    fn partition(cache: &CacheInner) -> &Partition<Self>;
}

impl Cached for Feed {
    fn partition(cache: &CacheInner) -> &Partition<Self> {
        &cache.feeds
    }
}

impl Cached for Collection {
    fn partition(cache: &CacheInner) -> &Partition<Self> {
        &cache.collections
    }
}

impl Cached for Article {
    fn partition(cache: &CacheInner) -> &Partition<Self> {
        &cache.articles
    }
}

/// Shared handle to the cache. Clones share state.
///
/// Created at application start and injected wherever it is needed;
/// [`clear`](Self::clear) tears it down at logout. Must be used from within
/// a tokio runtime, since reads and invalidations spawn fetch tasks.
#[derive(Clone)]
pub struct EntityCache {
    inner: Arc<CacheInner>,
}

impl EntityCache {
    /// `max_age`: if set, a snapshot older than this is refetched on read.
    pub fn new(transport: Arc<dyn Transport>, max_age: Option<Duration>) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(CacheInner {
                transport,
                max_age,
                feeds: Partition::new(CacheKey::Feeds),
                collections: Partition::new(CacheKey::Collections),
                articles: Partition::new(CacheKey::Articles),
                version,
            }),
        }
    }

    pub fn feeds(&self) -> Snapshot<Feed> {
        self.read::<Feed>()
    }

    pub fn collections(&self) -> Snapshot<Collection> {
        self.read::<Collection>()
    }

    pub fn articles(&self) -> Snapshot<Article> {
        self.read::<Article>()
    }

    /// Read every partition once, starting the initial fetches.
    pub fn prefetch(&self) {
        self.feeds();
        self.collections();
        self.articles();
    }

    /// Mark a partition stale and make sure a refetch is coming.
    pub fn invalidate(&self, key: CacheKey) {
        tracing::debug!(key = ?key, "Invalidating partition");
        match key {
            CacheKey::Feeds => self.invalidate_in::<Feed>(),
            CacheKey::Collections => self.invalidate_in::<Collection>(),
            CacheKey::Articles => self.invalidate_in::<Article>(),
        }
    }

    /// Forced refresh; also retries a partition whose last fetch failed.
    pub fn refresh(&self, key: CacheKey) {
        self.invalidate(key);
    }

    /// Number of requests sent for a partition since creation or `clear`.
    pub fn fetch_count(&self, key: CacheKey) -> u64 {
        match key {
            CacheKey::Feeds => self.inner.feeds.state.lock().dispatched,
            CacheKey::Collections => self.inner.collections.state.lock().dispatched,
            CacheKey::Articles => self.inner.articles.state.lock().dispatched,
        }
    }

    /// Receiver bumped whenever any partition's data or fetch status changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }

    /// Abort outstanding fetches and forget everything. Used at logout.
    pub fn clear(&self) {
        self.inner.feeds.reset();
        self.inner.collections.reset();
        self.inner.articles.reset();
        self.inner.bump();
        tracing::info!("Entity cache cleared");
    }

    fn read<T: Cached>(&self) -> Snapshot<T> {
        let (snapshot, schedule) = T::partition(&self.inner).read(self.inner.max_age);
        if let Some(generation) = schedule {
            self.spawn_fetch::<T>(generation);
        }
        snapshot
    }

    fn invalidate_in<T: Cached>(&self) {
        if let Some(generation) = T::partition(&self.inner).invalidate() {
            self.spawn_fetch::<T>(generation);
        }
        self.inner.bump();
    }

    fn spawn_fetch<T: Cached>(&self, generation: u64) {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(run_fetch::<T>(inner, generation));
        let mut state = T::partition(&self.inner).state.lock();
        if state.generation == generation && state.phase != FetchPhase::Idle {
            state.task = Some(handle);
        } else {
            handle.abort();
        }
    }
}

async fn run_fetch<T: Cached>(inner: Arc<CacheInner>, generation: u64) {
    let partition = T::partition(&inner);
    if !partition.begin_dispatch(generation) {
        return;
    }
    inner.bump();
    tracing::debug!(key = ?partition.key, "Fetching partition");

    let result = match inner.transport.send(Method::GET, partition.key.path()).await {
        Ok(response) => response.json::<Vec<T>>(),
        Err(e) => Err(e),
    };

    if partition.complete(generation, result) {
        inner.bump();
    }
}
