//! Cache Module
//!
//! Provides a generic in-memory memoization cache with per-instance TTL.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::KvCache;
