//! Windowed pagination cache for paged data grids.
//!
//! A grid shows one small display page at a time while the backend is asked
//! for larger blocks. This crate maps display pages onto blocks, caches the
//! rows of every page a block yields, prefetches the next block near a block
//! boundary and keeps results for outdated criteria out of the table.
//!
//! # Example
//!
//! ```ignore
//! use wpc_core::TableController;
//! use wpc_model::PagerConfig;
//!
//! let table = TableController::new(source, PagerConfig::new(10, 30))?;
//! table.load().await;
//! table.next_page().await; // served from cache, no remote call
//! table.set_search("widget").await; // cache cleared, back to page 1
//! ```
//!
//! # Modules
//!
//! - `layout.rs` - block geometry and page/block arithmetic
//! - `cache.rs` - display page cache with a generation counter
//! - `scheduler.rs` - block fetches and cache writes
//! - `prefetch.rs` - when to fetch the next block early
//! - `pagination.rs` - derived pagination view model
//! - `table/` - the controller and its published state

pub mod cache;
pub mod layout;
pub mod pagination;
pub mod prefetch;
pub mod scheduler;
pub mod table;

pub use cache::{Generation, PageCache};
pub use layout::BlockLayout;
pub use pagination::{PageItem, Pagination};
pub use prefetch::PrefetchPolicy;
pub use scheduler::{EnsuredPage, FetchMode, FetchScheduler, Origin, PrefetchOutcome};
pub use table::{TableController, TableState, TableStatus};
