//! JSON payload adapter.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use wpc_model::{DataSource, FetchError, FetchPage, FetchParams};

/// Adapts an async transport returning `{ "data": [...], "total": n }` into
/// a [`DataSource`].
///
/// The transport receives the request parameters and is responsible for
/// encoding them (query string, JSON body, IPC message). Transport failures
/// should be reported as [`FetchError::Transport`] or
/// [`FetchError::Rejected`]; payloads that do not decode become
/// [`FetchError::Malformed`].
///
/// ```ignore
/// let source = JsonSource::<Part, _>::new(move |params| {
///     let client = client.clone();
///     async move { client.post("/parts/query", &params).await }
/// });
/// ```
pub struct JsonSource<R, F> {
    transport: F,
    _rows: PhantomData<fn() -> R>,
}

impl<R, F> JsonSource<R, F> {
    pub fn new(transport: F) -> Self {
        Self {
            transport,
            _rows: PhantomData,
        }
    }
}

impl<R, F> fmt::Debug for JsonSource<R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSource").finish_non_exhaustive()
    }
}

impl<R, F, Fut> DataSource for JsonSource<R, F>
where
    R: DeserializeOwned + Clone + Send + Sync + 'static,
    F: Fn(FetchParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<serde_json::Value, FetchError>> + Send,
{
    type Row = R;

    async fn fetch(&self, params: FetchParams) -> Result<FetchPage<R>, FetchError> {
        let payload = (self.transport)(params).await?;
        let page = FetchPage::from_json_value(payload)?;
        tracing::trace!("Decoded {} row(s) of {}", page.data.len(), page.total);
        Ok(page)
    }
}
