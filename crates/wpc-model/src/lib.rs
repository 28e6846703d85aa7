//! Shared model for the windowed pagination cache.
//!
//! This crate holds the plain data types every layer agrees on:
//!
//! - `sort.rs` - sort column and direction, with toggle semantics
//! - `criteria.rs` - the sort/search/filter snapshot a fetch is issued under
//! - `fetch.rs` - request parameters and response payload of a paged query
//! - `source.rs` - the `DataSource` trait implemented by remote backends
//! - `config.rs` - page/fetch geometry, validated at construction
//! - `error.rs` - fetch and configuration errors

pub mod config;
pub mod criteria;
pub mod error;
pub mod fetch;
pub mod sort;
pub mod source;

pub use config::{
    DEFAULT_FETCH_SIZE, DEFAULT_INITIAL_PAGE, DEFAULT_PAGE_SIZE, PagerConfig,
};
pub use criteria::{Filters, QueryCriteria};
pub use error::{ConfigError, FetchError};
pub use fetch::{FetchPage, FetchParams};
pub use sort::{SortDirection, SortState};
pub use source::DataSource;
