//! Published table state.

use wpc_model::{Filters, SortState};

use crate::pagination::Pagination;

/// Coarse lifecycle of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    /// Nothing loaded yet.
    Idle,
    Loading,
    Ready,
    /// The last foreground load failed; `data` still holds the last good rows.
    Error,
}

/// Snapshot of everything a grid needs to render.
///
/// Snapshots are produced by `TableController` and never mutated by
/// readers. `pagination` is rebuilt from the controller's page and the
/// cache's total on every publish.
#[derive(Debug, Clone, PartialEq)]
pub struct TableState<R> {
    /// Rows of the current page.
    pub data: Vec<R>,
    pub loading: bool,
    /// User-facing message of the last failed load, cleared on success.
    pub error: Option<String>,
    pub pagination: Pagination,
    pub sort: SortState,
    pub search: String,
    pub filters: Filters,
    /// Whether a load has succeeded under the current criteria.
    pub loaded: bool,
}

impl<R> TableState<R> {
    /// Current display page.
    #[inline]
    pub fn page(&self) -> usize {
        self.pagination.page
    }

    pub fn status(&self) -> TableStatus {
        if self.loading {
            TableStatus::Loading
        } else if self.error.is_some() {
            TableStatus::Error
        } else if self.loaded {
            TableStatus::Ready
        } else {
            TableStatus::Idle
        }
    }
}
