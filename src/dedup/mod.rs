//! Deduplication Module
//!
//! Answers repeated upstream requests from the TTL cache.

mod deduplicator;
mod key;

pub use deduplicator::Deduplicator;
pub use key::{cache_key, canonical_json, UNSERIALIZABLE_KEY};
