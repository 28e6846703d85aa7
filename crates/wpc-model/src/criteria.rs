//! Query criteria: the sort/search/filter snapshot a fetch runs under.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fetch::FetchParams;
use crate::sort::SortState;

/// Column filters keyed by field name.
///
/// Values are opaque to the cache; only the data source interprets them.
pub type Filters = BTreeMap<String, serde_json::Value>;

/// Everything that determines which rows a page contains, besides the
/// page number itself.
///
/// Two snapshots are equal when sort, search text and filters are all
/// equal. Cached pages are only valid for the snapshot they were fetched
/// under.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryCriteria {
    pub sort: SortState,
    pub search: String,
    pub filters: Filters,
}

impl QueryCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort(mut self, sort: SortState) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Build request parameters for a block starting at display page
    /// `start_page`.
    ///
    /// `display_page_size` converts the start page into a row offset;
    /// `fetch_size` is the number of rows requested. Unset criteria are
    /// left out of the request.
    pub fn to_params(
        &self,
        start_page: usize,
        display_page_size: usize,
        fetch_size: usize,
    ) -> FetchParams {
        FetchParams {
            page: start_page,
            page_size: fetch_size,
            offset: start_page.saturating_sub(1) * display_page_size,
            sort: self.sort.is_sorted().then(|| self.sort.clone()),
            search: (!self.search.is_empty()).then(|| self.search.clone()),
            filters: (!self.filters.is_empty()).then(|| self.filters.clone()),
        }
    }
}
