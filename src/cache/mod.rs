//! Cache Module
//!
//! Provides a bounded in-memory cache with TTL expiration and namespace
//! invalidation.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::{format_bytes, CacheStats};
pub use store::TtlCache;

// == Public Constants ==
/// Separates a namespace from the rest of a cache key, as in `recipes:1a2b3c4d`.
pub const NAMESPACE_SEPARATOR: char = ':';
