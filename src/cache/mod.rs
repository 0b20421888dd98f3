//! Cache Module
//!
//! Provides the unbounded keyed memoization store used by the coalescer.

mod entry;
mod lookup;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lookup::Cached;
pub use stats::CacheStats;
pub use store::{CacheStore, SharedCache};
