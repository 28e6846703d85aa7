//! Block geometry: how display pages group into remote fetches.
//!
//! Display pages are 1-indexed, blocks are 0-indexed. With a page size of
//! 10 and a fetch size of 30, block 0 covers pages 1-3 and block 1 covers
//! pages 4-6.

use std::ops::RangeInclusive;

use wpc_model::{ConfigError, PagerConfig};

/// Validated page and fetch sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    page_size: usize,
    fetch_size: usize,
    pages_per_block: usize,
}

impl BlockLayout {
    pub fn new(page_size: usize, fetch_size: usize) -> Result<Self, ConfigError> {
        Self::from_config(&PagerConfig::new(page_size, fetch_size))
    }

    pub fn from_config(config: &PagerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            page_size: config.page_size,
            fetch_size: config.fetch_size,
            pages_per_block: config.pages_per_block(),
        })
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[inline]
    pub fn fetch_size(&self) -> usize {
        self.fetch_size
    }

    #[inline]
    pub fn pages_per_block(&self) -> usize {
        self.pages_per_block
    }

    /// Block containing display page `page`.
    #[inline]
    pub fn block_index(&self, page: usize) -> usize {
        page.saturating_sub(1) / self.pages_per_block
    }

    /// First display page of `block`.
    #[inline]
    pub fn start_page(&self, block: usize) -> usize {
        block * self.pages_per_block + 1
    }

    /// Display pages covered by `block`.
    pub fn pages_of(&self, block: usize) -> RangeInclusive<usize> {
        let start = self.start_page(block);
        start..=start + self.pages_per_block - 1
    }

    /// Zero-based position of `page` within its block.
    #[inline]
    pub fn position_in_block(&self, page: usize) -> usize {
        page.saturating_sub(1) % self.pages_per_block
    }

    #[inline]
    pub fn is_last_in_block(&self, page: usize) -> bool {
        self.position_in_block(page) == self.pages_per_block - 1
    }

    /// Number of display pages needed for `total_items` rows.
    #[inline]
    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.page_size)
    }

    /// Split the rows of `block` into per-page chunks.
    ///
    /// Returns `(page, rows)` pairs in page order. Only non-empty chunks are
    /// returned, so a block that ends mid-way yields fewer pairs than
    /// `pages_per_block`. Rows beyond the block are dropped.
    pub fn split<R>(&self, block: usize, rows: Vec<R>) -> Vec<(usize, Vec<R>)> {
        let start = self.start_page(block);
        let mut rows = rows.into_iter();
        let mut pages = Vec::with_capacity(self.pages_per_block);

        for offset in 0..self.pages_per_block {
            let chunk: Vec<R> = rows.by_ref().take(self.page_size).collect();
            if chunk.is_empty() {
                break;
            }
            pages.push((start + offset, chunk));
        }

        pages
    }
}
