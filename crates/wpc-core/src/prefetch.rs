//! Prefetch policy.
//!
//! When the last page of a block is shown and more pages follow, the next
//! block is fetched in the background so that turning the page at the
//! block boundary is served from cache.

use crate::layout::BlockLayout;

/// Decides whether the block after the current one should be fetched early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchPolicy {
    enabled: bool,
}

impl Default for PrefetchPolicy {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl PrefetchPolicy {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Block to fetch ahead after serving `page`, if any.
    pub fn next_block(
        &self,
        page: usize,
        layout: &BlockLayout,
        total_pages: usize,
    ) -> Option<usize> {
        if !self.enabled || page == 0 {
            return None;
        }
        if !layout.is_last_in_block(page) || page >= total_pages {
            return None;
        }
        Some(layout.block_index(page) + 1)
    }
}
