//! Recipe Cache - cost-control layer in front of an expensive recipe generator
//!
//! Provides a TTL cache with namespace invalidation, fuzzy query similarity,
//! a sliding-window rate limiter and a request deduplicator, served over HTTP.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod dedup;
pub mod error;
pub mod limiter;
pub mod models;
pub mod recipes;
pub mod similarity;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_sweep_task;
