//! Fetch scheduler.
//!
//! Turns a request for one display page into at most one remote call for
//! the block containing it, and distributes the block's rows across the
//! page cache.
//!
//! Every call carries the cache [`Generation`] it was issued under. When
//! the response arrives the rows are only written if the cache has not
//! been cleared in the meantime, so a slow response for old criteria can
//! never repopulate a cache that now belongs to new criteria.

use std::sync::{Mutex, MutexGuard, PoisonError};

use wpc_model::{DataSource, FetchError, QueryCriteria};

use crate::cache::{Generation, PageCache};
use crate::layout::BlockLayout;

/// Whether a cached page may satisfy the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Serve from cache when possible.
    CacheFirst,
    /// Always call the source, then overwrite the block's pages.
    Refresh,
}

/// Where the rows of an [`EnsuredPage`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Remote,
}

/// Rows for one display page.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsuredPage<R> {
    pub page: usize,
    /// Rows of the requested page; empty when the data ends before it.
    pub rows: Vec<R>,
    /// Total matching rows as last reported by the source.
    pub total_items: usize,
    pub origin: Origin,
    /// False when the cache was cleared while the call was in flight and
    /// the response was therefore not written.
    pub applied: bool,
}

/// Result of a background block fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchOutcome {
    pub block: usize,
    /// Pages newly written to the cache.
    pub written: usize,
    pub applied: bool,
}

/// How block rows are written into the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WritePolicy {
    Overwrite,
    AppendOnly,
}

struct BlockLoad<R> {
    wanted: Vec<R>,
    total_items: usize,
    written: usize,
    applied: bool,
}

/// Owns the page cache and the data source, and is the only writer of
/// cached pages.
pub struct FetchScheduler<S: DataSource> {
    layout: BlockLayout,
    source: S,
    cache: Mutex<PageCache<S::Row>>,
}

impl<S: DataSource> FetchScheduler<S> {
    pub fn new(layout: BlockLayout, source: S) -> Self {
        Self {
            layout,
            source,
            cache: Mutex::new(PageCache::new()),
        }
    }

    #[inline]
    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    fn cache(&self) -> MutexGuard<'_, PageCache<S::Row>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current cache generation; capture it before issuing a fetch.
    pub fn generation(&self) -> Generation {
        self.cache().generation()
    }

    /// Drop all cached pages. Returns the new generation.
    pub fn clear(&self) -> Generation {
        let mut cache = self.cache();
        let generation = cache.clear();
        tracing::debug!("Page cache cleared (generation {})", generation.value());
        generation
    }

    pub fn total_items(&self) -> Option<usize> {
        self.cache().total_items()
    }

    pub fn is_cached(&self, page: usize) -> bool {
        self.cache().contains(page)
    }

    pub fn cached_page(&self, page: usize) -> Option<Vec<S::Row>> {
        self.cache().get(page).map(<[S::Row]>::to_vec)
    }

    pub fn cached_pages(&self) -> Vec<usize> {
        self.cache().cached_pages()
    }

    /// Rows for display page `page` under `criteria`.
    ///
    /// A cache hit returns without I/O. A miss fetches the whole block the
    /// page belongs to and caches every non-empty page of it, provided
    /// `generation` is still current when the response arrives. A failed
    /// call leaves the cache untouched.
    pub async fn ensure_page(
        &self,
        page: usize,
        criteria: &QueryCriteria,
        generation: Generation,
        mode: FetchMode,
    ) -> Result<EnsuredPage<S::Row>, FetchError> {
        if mode == FetchMode::CacheFirst {
            let cache = self.cache();
            if let Some(rows) = cache.get(page) {
                tracing::debug!("Cache hit for page {}", page);
                return Ok(EnsuredPage {
                    page,
                    rows: rows.to_vec(),
                    total_items: cache.total_items().unwrap_or(rows.len()),
                    origin: Origin::Cache,
                    applied: true,
                });
            }
        }

        let block = self.layout.block_index(page);
        tracing::debug!("Cache miss for page {}, fetching block {}", page, block);

        let load = self
            .load_block(block, page, criteria, generation, WritePolicy::Overwrite)
            .await?;

        Ok(EnsuredPage {
            page,
            rows: load.wanted,
            total_items: load.total_items,
            origin: Origin::Remote,
            applied: load.applied,
        })
    }

    /// Fetch `block` ahead of need.
    ///
    /// Pages already present in the cache are left as they are, so a
    /// foreground fetch resolving into the same pages always wins.
    pub async fn prefetch_block(
        &self,
        block: usize,
        criteria: &QueryCriteria,
        generation: Generation,
    ) -> Result<PrefetchOutcome, FetchError> {
        let start_page = self.layout.start_page(block);
        let load = self
            .load_block(block, start_page, criteria, generation, WritePolicy::AppendOnly)
            .await?;

        Ok(PrefetchOutcome {
            block,
            written: load.written,
            applied: load.applied,
        })
    }

    async fn load_block(
        &self,
        block: usize,
        wanted_page: usize,
        criteria: &QueryCriteria,
        generation: Generation,
        policy: WritePolicy,
    ) -> Result<BlockLoad<S::Row>, FetchError> {
        let start_page = self.layout.start_page(block);
        let params = criteria.to_params(
            start_page,
            self.layout.page_size(),
            self.layout.fetch_size(),
        );

        let response = self.source.fetch(params.clone()).await?;
        response.validate(&params)?;

        let total_items = response.total;
        let pages = self.layout.split(block, response.data);
        let wanted = pages
            .iter()
            .find(|(page, _)| *page == wanted_page)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();

        let mut cache = self.cache();
        if cache.generation() != generation {
            tracing::debug!(
                "Discarding block {} fetched under generation {} (now {})",
                block,
                generation.value(),
                cache.generation().value()
            );
            return Ok(BlockLoad {
                wanted,
                total_items,
                written: 0,
                applied: false,
            });
        }

        let mut written = 0;
        for (page, rows) in pages {
            match policy {
                WritePolicy::Overwrite => {
                    cache.set(page, rows);
                    written += 1;
                }
                WritePolicy::AppendOnly => {
                    if cache.insert_if_absent(page, rows) {
                        written += 1;
                    }
                }
            }
        }
        cache.set_total_items(total_items);

        tracing::debug!(
            "Cached {} page(s) from block {} ({} total rows)",
            written,
            block,
            total_items
        );

        Ok(BlockLoad {
            wanted,
            total_items,
            written,
            applied: true,
        })
    }
}
