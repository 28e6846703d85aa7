//! Pagination view model.
//!
//! Everything here is derived from `(page, page_size, total_items)`; none
//! of it is stored.

use serde::Serialize;

/// Inputs for pagination controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Current display page (1-indexed).
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
}

/// One entry in a compact page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageItem {
    Page(usize),
    /// Elided run of pages.
    Gap,
}

impl Pagination {
    pub fn new(page: usize, page_size: usize, total_items: usize) -> Self {
        Self {
            page,
            page_size,
            total_items,
        }
    }

    /// `ceil(total_items / page_size)`; zero for an empty dataset.
    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size.max(1))
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev_page(&self) -> bool {
        self.page > 1
    }

    /// 1-indexed inclusive range of items on the current page.
    ///
    /// `None` when the current page holds no items.
    pub fn visible_range(&self) -> Option<(usize, usize)> {
        let start = self.page.saturating_sub(1) * self.page_size + 1;
        if self.total_items == 0 || start > self.total_items {
            return None;
        }
        let end = (self.page * self.page_size).min(self.total_items);
        Some((start, end))
    }

    /// "11-20 of 42", or "0 of 0" when nothing is visible.
    pub fn summary(&self) -> String {
        match self.visible_range() {
            Some((start, end)) => format!("{}-{} of {}", start, end, self.total_items),
            None => format!("0 of {}", self.total_items),
        }
    }

    /// Page buttons for a selector showing `width` pages around the
    /// current one, plus the first and last page.
    ///
    /// With 10 pages, page 5 and a width of 3 this yields
    /// `1 … 4 5 6 … 10`.
    pub fn page_window(&self, width: usize) -> Vec<PageItem> {
        let total = self.total_pages();
        if total == 0 {
            return Vec::new();
        }

        let width = width.max(1);
        if total <= width + 2 {
            return (1..=total).map(PageItem::Page).collect();
        }

        let current = self.page.clamp(1, total);
        let mut start = current.saturating_sub(width / 2).max(2);
        let mut end = start + width - 1;
        if end > total - 1 {
            end = total - 1;
            start = end + 1 - width;
        }

        let mut items = Vec::with_capacity(width + 4);
        items.push(PageItem::Page(1));
        if start > 2 {
            items.push(PageItem::Gap);
        }
        items.extend((start..=end).map(PageItem::Page));
        if end < total - 1 {
            items.push(PageItem::Gap);
        }
        items.push(PageItem::Page(total));
        items
    }
}
