//! The paged-query contract remote backends implement.

use std::future::Future;
use std::sync::Arc;

use crate::error::FetchError;
use crate::fetch::{FetchPage, FetchParams};

/// A remote, paged, sortable and searchable collection of rows.
///
/// Implementations own timeouts and retries of their transport; any
/// failure is reported as a `FetchError` and treated uniformly by the
/// cache.
pub trait DataSource: Send + Sync + 'static {
    type Row: Clone + Send + Sync + 'static;

    /// Fetch the rows described by `params`.
    fn fetch(
        &self,
        params: FetchParams,
    ) -> impl Future<Output = Result<FetchPage<Self::Row>, FetchError>> + Send;
}

impl<S: DataSource> DataSource for Arc<S> {
    type Row = S::Row;

    fn fetch(
        &self,
        params: FetchParams,
    ) -> impl Future<Output = Result<FetchPage<Self::Row>, FetchError>> + Send {
        S::fetch(self, params)
    }
}
