//! Request and response payloads of a paged query.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::criteria::Filters;
use crate::error::FetchError;
use crate::sort::SortState;

/// Parameters of one remote call.
///
/// `page` is expressed in display pages: a block covering display pages
/// 4-6 is requested with `page = 4` and `page_size` equal to the fetch
/// size. `offset` is the zero-based index of the first requested row and
/// is what sources should use to position their scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchParams {
    pub page: usize,
    pub page_size: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,
}

impl FetchParams {
    /// One-based block number for backends that page in fetch-size units.
    pub fn block_number(&self) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        self.offset / self.page_size + 1
    }

    /// Half-open row range this request covers.
    pub fn row_range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.page_size
    }
}

/// Rows returned for one request, plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchPage<R> {
    pub data: Vec<R>,
    pub total: usize,
}

impl<R> FetchPage<R> {
    pub fn new(data: Vec<R>, total: usize) -> Self {
        Self { data, total }
    }

    /// An empty result for an empty dataset.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            total: 0,
        }
    }

    /// Check the payload is consistent with the request that produced it.
    ///
    /// A source may return fewer rows than requested (end of data), but
    /// never more, and never more rows than its own total accounts for.
    pub fn validate(&self, params: &FetchParams) -> Result<(), FetchError> {
        if self.data.len() > params.page_size {
            return Err(FetchError::malformed(format!(
                "received {} rows for a request of {}",
                self.data.len(),
                params.page_size
            )));
        }
        if !self.data.is_empty() && params.offset + self.data.len() > self.total {
            return Err(FetchError::malformed(format!(
                "rows {}..{} exceed the reported total of {}",
                params.offset,
                params.offset + self.data.len(),
                self.total
            )));
        }
        Ok(())
    }
}

impl<R: DeserializeOwned> FetchPage<R> {
    /// Decode a `{ "data": [...], "total": n }` payload.
    pub fn from_json_str(payload: &str) -> Result<Self, FetchError> {
        serde_json::from_str(payload).map_err(|e| FetchError::malformed(e.to_string()))
    }

    /// Decode an already-parsed JSON payload.
    pub fn from_json_value(payload: serde_json::Value) -> Result<Self, FetchError> {
        serde_json::from_value(payload).map_err(|e| FetchError::malformed(e.to_string()))
    }
}
