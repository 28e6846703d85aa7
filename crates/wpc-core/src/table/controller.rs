//! Table state machine.
//!
//! `TableController` owns the current page and the sort/search/filter
//! criteria, drives the fetch scheduler and publishes `TableState`
//! snapshots.
//!
//! Operations take `&self` and may overlap: a new search can start while
//! the previous one is still waiting on the data source. Every foreground
//! request is numbered and remembers the criteria it was issued under.
//! When it completes, its result is applied only if it is still the
//! latest request and the criteria have not changed since; anything else
//! is dropped.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use wpc_model::{
    ConfigError, DataSource, FetchError, Filters, PagerConfig, QueryCriteria, SortState,
};

use crate::cache::Generation;
use crate::layout::BlockLayout;
use crate::pagination::Pagination;
use crate::prefetch::PrefetchPolicy;
use crate::scheduler::{EnsuredPage, FetchMode, FetchScheduler};
use crate::table::state::TableState;

/// Paged table over a remote data source.
///
/// Cloning is cheap and yields a handle to the same table.
///
/// Background prefetches are spawned on the ambient Tokio runtime; when
/// the controller is driven outside one, prefetching is skipped.
pub struct TableController<S: DataSource> {
    inner: Arc<Inner<S>>,
}

impl<S: DataSource> Clone for TableController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S: DataSource> {
    config: PagerConfig,
    policy: PrefetchPolicy,
    scheduler: FetchScheduler<S>,
    live: Mutex<Live<S::Row>>,
    published: watch::Sender<TableState<S::Row>>,
    prefetches: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: DataSource> Inner<S> {
    fn live(&self) -> MutexGuard<'_, Live<S::Row>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn prefetches(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.prefetches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn total_items(&self) -> usize {
        self.scheduler.total_items().unwrap_or(0)
    }

    /// Whether any fetch has reported a total yet. Clearing the cache keeps
    /// the last total, so this stays true across criteria changes.
    fn total_known(&self) -> bool {
        self.scheduler.total_items().is_some()
    }

    fn total_pages(&self) -> usize {
        self.scheduler.layout().total_pages(self.total_items())
    }

    /// Publish a snapshot of `live`. Called with the live lock held so
    /// snapshots are sent in the order the state changed.
    fn publish(&self, live: &Live<S::Row>) {
        let state = live.snapshot(self.config.page_size, self.total_items());
        self.published.send_replace(state);
    }

    /// Republish if the cached total differs from the published one, e.g.
    /// after a prefetch saw the dataset grow or shrink. Rows and flags are
    /// republished as they are.
    fn publish_total(&self) {
        let live = self.live();
        let published = self.published.borrow().pagination.total_items;
        if published != self.total_items() {
            self.publish(&live);
        }
    }
}

/// Mutable table state behind the controller's lock.
struct Live<R> {
    page: usize,
    criteria: QueryCriteria,
    data: Vec<R>,
    loading: bool,
    error: Option<String>,
    loaded: bool,
    /// Number of the most recent foreground request.
    request_seq: u64,
    /// Blocks with a background fetch in flight, per cache generation.
    prefetching: HashSet<(Generation, usize)>,
}

impl<R: Clone> Live<R> {
    fn snapshot(&self, page_size: usize, total_items: usize) -> TableState<R> {
        TableState {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
            pagination: Pagination::new(self.page, page_size, total_items),
            sort: self.criteria.sort.clone(),
            search: self.criteria.search.clone(),
            filters: self.criteria.filters.clone(),
            loaded: self.loaded,
        }
    }
}

/// A foreground request and the criteria it was issued under.
#[derive(Debug, Clone)]
struct Ticket {
    seq: u64,
    page: usize,
    criteria: QueryCriteria,
    generation: Generation,
    mode: FetchMode,
    /// The page is not cached, so a loading state is published first.
    announce: bool,
}

enum Step {
    Applied { prefetch: bool },
    Retry(Ticket),
    Superseded,
}

impl<S: DataSource> TableController<S> {
    /// Create a controller with no sort, search or filters.
    ///
    /// Fails if the page geometry in `config` is invalid. Nothing is
    /// fetched until `load` or another operation is called.
    pub fn new(source: S, config: PagerConfig) -> Result<Self, ConfigError> {
        Self::with_criteria(source, config, QueryCriteria::default())
    }

    /// Create a controller starting from the given criteria, e.g. restored
    /// from a URL or saved view.
    pub fn with_criteria(
        source: S,
        config: PagerConfig,
        criteria: QueryCriteria,
    ) -> Result<Self, ConfigError> {
        let layout = BlockLayout::from_config(&config)?;
        let live = Live {
            page: config.initial_page,
            criteria,
            data: Vec::new(),
            loading: false,
            error: None,
            loaded: false,
            request_seq: 0,
            prefetching: HashSet::new(),
        };
        let (published, _) = watch::channel(live.snapshot(config.page_size, 0));

        tracing::debug!(
            "Table controller created: page_size={}, fetch_size={}, {} page(s) per block",
            config.page_size,
            config.fetch_size,
            layout.pages_per_block()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                policy: PrefetchPolicy::new(config.prefetch),
                scheduler: FetchScheduler::new(layout, source),
                config,
                live: Mutex::new(live),
                published,
                prefetches: Mutex::new(Vec::new()),
            }),
        })
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    pub fn config(&self) -> &PagerConfig {
        &self.inner.config
    }

    pub fn layout(&self) -> &BlockLayout {
        self.inner.scheduler.layout()
    }

    pub fn source(&self) -> &S {
        self.inner.scheduler.source()
    }

    /// The most recently published state.
    pub fn state(&self) -> TableState<S::Row> {
        self.inner.published.borrow().clone()
    }

    /// Receiver notified on every published state change.
    pub fn subscribe(&self) -> watch::Receiver<TableState<S::Row>> {
        self.inner.published.subscribe()
    }

    /// Pagination for the current page and last known total.
    pub fn pagination(&self) -> Pagination {
        let page = self.inner.live().page;
        Pagination::new(page, self.inner.config.page_size, self.inner.total_items())
    }

    /// Display pages currently held in the cache.
    pub fn cached_pages(&self) -> Vec<usize> {
        self.inner.scheduler.cached_pages()
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Load the current page, serving it from cache when possible.
    ///
    /// Used for the first load after construction.
    pub async fn load(&self) {
        let ticket = {
            let mut live = self.inner.live();
            self.begin(&mut live, FetchMode::CacheFirst)
        };
        self.run(ticket).await;
    }

    /// Go to display page `page`.
    ///
    /// Pages past the last known `total_pages` are ignored, including while
    /// a reload for new criteria is in flight. Before any fetch has
    /// reported a total, any page from 1 up is accepted. Once the current
    /// page has loaded, requesting it again is ignored.
    ///
    /// On failure the page number moves but `data` keeps the last rows
    /// that loaded successfully, and `error` is set.
    pub async fn set_page(&self, page: usize) {
        let ticket = {
            let mut live = self.inner.live();
            if page == 0 {
                tracing::debug!("Ignoring request for page 0");
                return;
            }
            let total_pages = self.inner.total_pages();
            let past_end = self.inner.total_known() && page > total_pages;
            if past_end || (live.loaded && page == live.page) {
                tracing::debug!(
                    "Ignoring request for page {} (current {}, {} total)",
                    page,
                    live.page,
                    total_pages
                );
                return;
            }
            live.page = page;
            self.begin(&mut live, FetchMode::CacheFirst)
        };
        self.run(ticket).await;
    }

    pub async fn next_page(&self) {
        let pagination = self.pagination();
        if pagination.has_next_page() {
            self.set_page(pagination.page + 1).await;
        }
    }

    pub async fn prev_page(&self) {
        let pagination = self.pagination();
        if pagination.has_prev_page() {
            self.set_page(pagination.page - 1).await;
        }
    }

    pub async fn first_page(&self) {
        self.set_page(1).await;
    }

    pub async fn last_page(&self) {
        let total_pages = self.pagination().total_pages();
        if total_pages > 0 {
            self.set_page(total_pages).await;
        }
    }

    // =========================================================================
    // CRITERIA
    // =========================================================================

    /// Replace the sort, clear the cache and reload from page 1.
    pub async fn set_sort(&self, sort: SortState) {
        self.change_criteria("sort", move |criteria| criteria.sort = sort)
            .await;
    }

    /// Sort by `column`, flipping the direction if it is already the sort
    /// column.
    pub async fn toggle_sort(&self, column: &str) {
        self.change_criteria("sort", |criteria| {
            criteria.sort = criteria.sort.toggled(column);
        })
        .await;
    }

    /// Replace the search text, clear the cache and reload from page 1.
    ///
    /// This method does not debounce. Keystroke-driven callers must
    /// debounce before calling it; rapid successive calls are still safe,
    /// as only the latest search is ever applied.
    pub async fn set_search(&self, term: impl Into<String>) {
        let term = term.into();
        self.change_criteria("search", move |criteria| criteria.search = term)
            .await;
    }

    /// Replace the filters, clear the cache and reload from page 1.
    pub async fn set_filters(&self, filters: Filters) {
        self.change_criteria("filters", move |criteria| criteria.filters = filters)
            .await;
    }

    /// Clear the cache and reload the current page.
    ///
    /// This is the retry path after a failed load.
    pub async fn refresh(&self) {
        let ticket = {
            let mut live = self.inner.live();
            let generation = self.inner.scheduler.clear();
            tracing::info!(
                "Refreshing page {} (generation {})",
                live.page,
                generation.value()
            );
            self.begin(&mut live, FetchMode::Refresh)
        };
        self.run(ticket).await;
    }

    /// Wait for every background prefetch spawned so far to finish.
    pub async fn settle(&self) {
        loop {
            let pending = std::mem::take(&mut *self.inner.prefetches());
            if pending.is_empty() {
                return;
            }
            for result in join_all(pending).await {
                if let Err(err) = result {
                    tracing::warn!("Prefetch task ended abnormally: {}", err);
                }
            }
        }
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    async fn change_criteria(
        &self,
        what: &'static str,
        update: impl FnOnce(&mut QueryCriteria) + Send,
    ) {
        let ticket = {
            let mut live = self.inner.live();
            update(&mut live.criteria);
            live.page = 1;
            live.loaded = false;
            let generation = self.inner.scheduler.clear();
            tracing::info!(
                "Table {} changed, cache invalidated (generation {})",
                what,
                generation.value()
            );
            self.begin(&mut live, FetchMode::CacheFirst)
        };
        self.run(ticket).await;
    }

    /// Register a new foreground request for `live.page`.
    fn begin(&self, live: &mut Live<S::Row>, mode: FetchMode) -> Ticket {
        live.request_seq += 1;
        let cached = mode == FetchMode::CacheFirst && self.inner.scheduler.is_cached(live.page);
        if !cached {
            live.loading = true;
        }
        Ticket {
            seq: live.request_seq,
            page: live.page,
            criteria: live.criteria.clone(),
            generation: self.inner.scheduler.generation(),
            mode,
            announce: !cached,
        }
    }

    async fn run(&self, mut ticket: Ticket) {
        loop {
            if ticket.announce {
                let live = self.inner.live();
                if live.request_seq == ticket.seq {
                    self.inner.publish(&live);
                }
            }

            let result = self
                .inner
                .scheduler
                .ensure_page(ticket.page, &ticket.criteria, ticket.generation, ticket.mode)
                .await;

            let step = {
                let mut live = self.inner.live();
                let step = self.complete(&mut live, &ticket, result);
                if !matches!(step, Step::Superseded) {
                    self.inner.publish(&live);
                }
                step
            };

            match step {
                Step::Applied { prefetch } => {
                    if prefetch {
                        self.schedule_prefetch(&ticket);
                    }
                    return;
                }
                Step::Retry(next) => ticket = next,
                Step::Superseded => return,
            }
        }
    }

    /// Apply the outcome of `ticket` to `live`, if it is still current.
    fn complete(
        &self,
        live: &mut Live<S::Row>,
        ticket: &Ticket,
        result: Result<EnsuredPage<S::Row>, FetchError>,
    ) -> Step {
        if live.request_seq != ticket.seq || live.criteria != ticket.criteria {
            tracing::debug!(
                "Discarding superseded result for page {} (request {}, latest {})",
                ticket.page,
                ticket.seq,
                live.request_seq
            );
            return Step::Superseded;
        }

        match result {
            Ok(served) => {
                let total_pages = self.layout().total_pages(served.total_items);
                if total_pages > 0 && ticket.page > total_pages {
                    tracing::debug!(
                        "Page {} is past the end ({} page(s)), moving to the last page",
                        ticket.page,
                        total_pages
                    );
                    live.page = total_pages;
                    return Step::Retry(self.begin(live, FetchMode::CacheFirst));
                }
                if total_pages == 0 {
                    live.page = 1;
                }

                live.data = served.rows;
                live.error = None;
                live.loading = false;
                live.loaded = true;
                Step::Applied { prefetch: true }
            }
            Err(err) => {
                tracing::warn!("Failed to load page {}: {}", ticket.page, err);
                live.error = Some(err.user_message());
                live.loading = false;
                Step::Applied { prefetch: false }
            }
        }
    }

    /// Fetch the next block in the background if the policy asks for it.
    ///
    /// Failures are logged and dropped; they never reach the table state.
    /// A successful prefetch only republishes when it changed the total.
    fn schedule_prefetch(&self, ticket: &Ticket) {
        let scheduler = &self.inner.scheduler;
        let layout = scheduler.layout();
        let Some(block) = self
            .inner
            .policy
            .next_block(ticket.page, layout, self.inner.total_pages())
        else {
            return;
        };

        if scheduler.is_cached(layout.start_page(block)) {
            tracing::debug!("Block {} already cached, no prefetch needed", block);
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime available, skipping prefetch of block {}", block);
            return;
        };

        {
            let mut live = self.inner.live();
            if live.criteria != ticket.criteria
                || !live.prefetching.insert((ticket.generation, block))
            {
                return;
            }
        }

        tracing::debug!("Prefetching block {} after page {}", block, ticket.page);

        let inner = Arc::clone(&self.inner);
        let criteria = ticket.criteria.clone();
        let generation = ticket.generation;
        let handle = runtime.spawn(async move {
            match inner
                .scheduler
                .prefetch_block(block, &criteria, generation)
                .await
            {
                Ok(outcome) => {
                    tracing::debug!(
                        "Prefetched block {}: {} page(s) cached{}",
                        block,
                        outcome.written,
                        if outcome.applied { "" } else { " (discarded)" }
                    );
                    if outcome.applied {
                        inner.publish_total();
                    }
                }
                Err(err) => tracing::debug!("Prefetch of block {} failed: {}", block, err),
            }
            inner.live().prefetching.remove(&(generation, block));
        });

        let mut prefetches = self.inner.prefetches();
        prefetches.retain(|handle| !handle.is_finished());
        prefetches.push(handle);
    }
}
