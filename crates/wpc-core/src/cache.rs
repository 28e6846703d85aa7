//! Page cache store.
//!
//! Maps display page numbers to the rows shown on that page, plus the
//! last known total row count. There is no eviction: the store grows
//! until `clear()` and is bounded by the dataset's page count.
//!
//! Entries carry no criteria of their own. Consistency relies on the
//! owner clearing the store whenever sort, search or filters change. Each
//! clear advances the store's [`Generation`]; a fetch remembers the
//! generation it was issued under and may only write if it still matches.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Monotonic counter advanced by every `PageCache::clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(u64);

impl Generation {
    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Rows cached per display page.
#[derive(Debug, Clone)]
pub struct PageCache<R> {
    pages: HashMap<usize, Vec<R>>,
    total_items: Option<usize>,
    generation: Generation,
}

impl<R> Default for PageCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> PageCache<R> {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            total_items: None,
            generation: Generation::default(),
        }
    }

    /// Rows for `page`, if cached.
    pub fn get(&self, page: usize) -> Option<&[R]> {
        self.pages.get(&page).map(Vec::as_slice)
    }

    #[inline]
    pub fn contains(&self, page: usize) -> bool {
        self.pages.contains_key(&page)
    }

    /// Store rows for `page`, replacing any existing entry.
    pub fn set(&mut self, page: usize, rows: Vec<R>) {
        self.pages.insert(page, rows);
    }

    /// Store rows for `page` only if nothing is cached for it yet.
    ///
    /// Returns whether the rows were stored.
    pub fn insert_if_absent(&mut self, page: usize, rows: Vec<R>) -> bool {
        match self.pages.entry(page) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(rows);
                true
            }
        }
    }

    /// Drop every cached page and advance the generation.
    ///
    /// The last known total is kept so pagination stays stable while the
    /// next load is in flight; the next successful fetch replaces it.
    pub fn clear(&mut self) -> Generation {
        self.pages.clear();
        self.generation = self.generation.next();
        self.generation
    }

    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    #[inline]
    pub fn total_items(&self) -> Option<usize> {
        self.total_items
    }

    pub fn set_total_items(&mut self, total: usize) {
        self.total_items = Some(total);
    }

    /// Number of cached pages.
    #[inline]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Cached page numbers in ascending order.
    pub fn cached_pages(&self) -> Vec<usize> {
        let mut pages: Vec<usize> = self.pages.keys().copied().collect();
        pages.sort_unstable();
        pages
    }
}
