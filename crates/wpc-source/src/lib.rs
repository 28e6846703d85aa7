//! Data sources for the windowed pagination cache.
//!
//! - [`MemorySource`] answers paged queries over rows held in memory,
//!   applying search, filters and sort the way a backend would.
//! - [`JsonSource`] decodes `{ "data": [...], "total": n }` payloads
//!   produced by any async transport.

mod json;
mod memory;

pub use json::JsonSource;
pub use memory::MemorySource;
