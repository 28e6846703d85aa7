//! Data sources and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::{Notify, oneshot};
use wpc_model::{DataSource, FetchError, FetchPage, FetchParams};

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub id: u32,
    pub name: String,
    pub qty: u32,
    pub status: String,
}

/// `count` parts with ids starting at 1.
pub fn parts(count: u32) -> Vec<Part> {
    const STATUSES: [&str; 3] = ["active", "pending", "obsolete"];
    (1..=count)
        .map(|id| Part {
            id,
            name: format!("Part {:03}", id),
            qty: (id * 7) % 50,
            status: STATUSES[(id as usize) % STATUSES.len()].to_string(),
        })
        .collect()
}

pub fn ids(rows: &[Part]) -> Vec<u32> {
    rows.iter().map(|part| part.id).collect()
}

pub fn numbers(count: u32) -> Vec<u32> {
    (0..count).collect()
}

/// Rows of `dataset` a well-behaved backend returns for `params`.
pub fn page_of<R: Clone>(dataset: &[R], params: &FetchParams) -> FetchPage<R> {
    let rows = dataset
        .iter()
        .skip(params.offset)
        .take(params.page_size)
        .cloned()
        .collect();
    FetchPage::new(rows, dataset.len())
}

// ============================================================================
// CountingSource
// ============================================================================

/// Records the parameters of every call before delegating.
pub struct CountingSource<S> {
    inner: S,
    requests: Mutex<Vec<FetchParams>>,
}

impl<S> CountingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn calls(&self) -> usize {
        self.requests().len()
    }

    pub fn requests(&self) -> Vec<FetchParams> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<S: DataSource> DataSource for CountingSource<S> {
    type Row = S::Row;

    async fn fetch(&self, params: FetchParams) -> Result<FetchPage<S::Row>, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(params.clone());
        self.inner.fetch(params).await
    }
}

// ============================================================================
// ManualSource
// ============================================================================

/// A call held open until the test answers it.
pub struct Request<R> {
    pub params: FetchParams,
    reply: oneshot::Sender<Result<FetchPage<R>, FetchError>>,
}

impl<R: Clone> Request<R> {
    pub fn respond(self, result: Result<FetchPage<R>, FetchError>) {
        let _ = self.reply.send(result);
    }

    /// Answer with the slice of `dataset` the request asks for.
    pub fn respond_from(self, dataset: &[R]) {
        let page = page_of(dataset, &self.params);
        self.respond(Ok(page));
    }

    pub fn fail(self, message: &str) {
        self.respond(Err(FetchError::rejected(message)));
    }
}

/// A source whose calls only complete when the test answers them, so
/// overlapping fetches can be resolved in any order.
pub struct ManualSource<R> {
    pending: Mutex<VecDeque<Request<R>>>,
    arrived: Notify,
    calls: Mutex<usize>,
}

impl<R> Default for ManualSource<R> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            arrived: Notify::new(),
            calls: Mutex::new(0),
        }
    }
}

impl<R> ManualSource<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Wait for the next call to arrive.
    pub async fn next_request(&self) -> Request<R> {
        loop {
            let next = self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            if let Some(request) = next {
                return request;
            }
            self.arrived.notified().await;
        }
    }
}

impl<R: Clone + Send + Sync + 'static> DataSource for ManualSource<R> {
    type Row = R;

    async fn fetch(&self, params: FetchParams) -> Result<FetchPage<R>, FetchError> {
        let (reply, response) = oneshot::channel();
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Request { params, reply });
        self.arrived.notify_one();
        response
            .await
            .unwrap_or_else(|_| Err(FetchError::rejected("request dropped")))
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Route `tracing` output through the test harness. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
