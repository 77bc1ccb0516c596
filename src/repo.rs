//! Repository layer merging the API client and the local cache.
//!
//! Every listing request produces a short sequence of emissions over a
//! channel: optionally an immediate success from cache, then a loading
//! marker, then a final success or error. The producer task is aborted
//! when its `FetchStream` is dropped, so replacing an in-flight fetch
//! gives latest-wins semantics - a superseded response is never observed.
//!
//! No error escapes this layer: every failure resolves to cached data or
//! a user-facing error message.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::cache::CharacterStore;
use crate::models::{Character, CharacterFilter};

/// Listing page size served by the API. Last-page detection keys off it:
/// a page with fewer rows is treated as the final one.
pub const PAGE_SIZE: usize = 20;

/// Buffer size for emission channels; a fetch emits at most three states
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Shown when the network is unreachable and the cache has nothing for the request
pub const MSG_NO_CONNECTION: &str = "No internet connection";

/// One state of an in-flight fetch
#[derive(Debug, Clone, PartialEq)]
pub enum Resource<T> {
    Loading,
    Success(T),
    Error(String),
}

/// Non-blocking poll result for a `FetchStream`
pub enum FetchPoll {
    Item(Resource<Vec<Character>>),
    Pending,
    Closed,
}

/// Handle to one in-flight fetch: the emission channel plus the producer
/// task. Dropping the stream aborts the producer.
pub struct FetchStream {
    rx: mpsc::Receiver<Resource<Vec<Character>>>,
    handle: JoinHandle<()>,
}

impl FetchStream {
    /// Await the next emission; None once the fetch has finished
    #[allow(dead_code)]
    pub async fn next(&mut self) -> Option<Resource<Vec<Character>>> {
        self.rx.recv().await
    }

    /// Non-blocking poll for the UI event loop
    pub fn poll(&mut self) -> FetchPoll {
        match self.rx.try_recv() {
            Ok(resource) => FetchPoll::Item(resource),
            Err(TryRecvError::Empty) => FetchPoll::Pending,
            Err(TryRecvError::Disconnected) => FetchPoll::Closed,
        }
    }
}

impl Drop for FetchStream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Repository over the API client and the local cache.
/// Clone is cheap - both halves are reference-counted.
#[derive(Clone)]
pub struct CharacterRepository {
    api: ApiClient,
    store: CharacterStore,
}

impl CharacterRepository {
    pub fn new(api: ApiClient, store: CharacterStore) -> Self {
        Self { api, store }
    }

    #[allow(dead_code)]
    pub fn store(&self) -> &CharacterStore {
        &self.store
    }

    /// Fetch one plain listing page.
    ///
    /// Emission order: cached rows for the page (skipped when
    /// `force_refresh` or the cache has none), Loading, then the network
    /// result. A successful response is upserted into the cache tagged
    /// with this page. On failure the cache is consulted again; only when
    /// it is empty too does the stream end in an error.
    pub fn fetch_page(&self, page: u32, force_refresh: bool) -> FetchStream {
        let repo = self.clone();
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let handle = tokio::spawn(async move {
            repo.run_page_fetch(page, force_refresh, tx).await;
        });
        FetchStream { rx, handle }
    }

    /// Fetch one page of a filtered or searched listing.
    ///
    /// Network-first: no cached emission precedes Loading. On any failure
    /// the same criteria are run against the cache and whatever matches is
    /// emitted as a success, even when empty. Successful responses are not
    /// written back to the cache, so cache-backed fallback results can lag
    /// behind live filtered data.
    pub fn filter_page(&self, filter: CharacterFilter, page: u32) -> FetchStream {
        let repo = self.clone();
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let handle = tokio::spawn(async move {
            repo.run_filter_fetch(filter, page, tx).await;
        });
        FetchStream { rx, handle }
    }

    /// Cache-first single character lookup. One network call on a cache
    /// miss; None on any failure. Not-found and network-down collapse to
    /// the same None - callers only learn the cause from the debug log.
    pub async fn fetch_by_id(&self, id: i64) -> Option<Character> {
        match self.store.by_id(id).await {
            Ok(Some(character)) => return Some(character),
            Ok(None) => {}
            Err(e) => debug!(id, error = %e, "Cache lookup failed"),
        }

        match self.api.fetch_character(id).await {
            Ok(character) => Some(character),
            Err(e) => {
                debug!(id, error = %e, "Character fetch failed");
                None
            }
        }
    }

    /// Unconditional cache wipe
    pub async fn clear_cache(&self) -> anyhow::Result<()> {
        self.store.clear().await
    }

    async fn run_page_fetch(
        &self,
        page: u32,
        force_refresh: bool,
        tx: mpsc::Sender<Resource<Vec<Character>>>,
    ) {
        if !force_refresh {
            match self.store.by_page(page).await {
                Ok(cached) if !cached.is_empty() => {
                    Self::emit(&tx, Resource::Success(cached)).await;
                }
                Ok(_) => {}
                Err(e) => debug!(page, error = %e, "Cache read failed"),
            }
        }

        Self::emit(&tx, Resource::Loading).await;

        match self.api.fetch_page(page).await {
            Ok(response) => {
                // The size heuristic downstream declares this the last page,
                // even when the server says otherwise. Make that visible.
                if response.results.len() < PAGE_SIZE && response.info.next.is_some() {
                    warn!(
                        page,
                        len = response.results.len(),
                        "Short page but server reports more; pagination will stop here"
                    );
                }

                if let Err(e) = self.store.upsert_page(&response.results, page).await {
                    warn!(page, error = %e, "Cache write failed");
                }

                Self::emit(&tx, Resource::Success(response.results)).await;
            }
            Err(e) => {
                debug!(page, error = %e, "Page fetch failed, trying cache");
                match self.store.by_page(page).await {
                    Ok(cached) if !cached.is_empty() => {
                        Self::emit(&tx, Resource::Success(cached)).await;
                    }
                    _ => {
                        Self::emit(&tx, Resource::Error(Self::error_message(&e))).await;
                    }
                }
            }
        }
    }

    async fn run_filter_fetch(
        &self,
        filter: CharacterFilter,
        page: u32,
        tx: mpsc::Sender<Resource<Vec<Character>>>,
    ) {
        Self::emit(&tx, Resource::Loading).await;

        match self.api.filter_characters(&filter, page).await {
            Ok(response) => {
                Self::emit(&tx, Resource::Success(response.results)).await;
            }
            Err(e) => {
                debug!(page, error = %e, "Filter fetch failed, trying cache");
                match self.store.filter(&filter).await {
                    Ok(cached) => {
                        Self::emit(&tx, Resource::Success(cached)).await;
                    }
                    Err(cache_err) => {
                        warn!(error = %cache_err, "Cache filter failed");
                        Self::emit(&tx, Resource::Error(Self::error_message(&e))).await;
                    }
                }
            }
        }
    }

    fn error_message(error: &ApiError) -> String {
        if error.is_connectivity() {
            MSG_NO_CONNECTION.to_string()
        } else {
            format!("Load failed: {}", error)
        }
    }

    async fn emit(tx: &mpsc::Sender<Resource<Vec<Character>>>, resource: Resource<Vec<Character>>) {
        // A send error means the stream was dropped: the request was superseded
        if tx.send(resource).await.is_err() {
            debug!("Fetch superseded, dropping emission");
        }
    }
}
