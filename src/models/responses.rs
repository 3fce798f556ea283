//! Response DTOs for the recipe cache API
//!
//! Defines the structure of outgoing HTTP response bodies. Generate requests
//! answer with [`RecipeOutcome`](crate::recipes::RecipeOutcome).

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for `GET /cache/stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub max_size: usize,
    /// Human-readable estimate, e.g. "1.50 KB"
    pub memory_usage: String,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Entries removed by the sweep that ran before this snapshot
    pub expired_cleaned: usize,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(stats: CacheStats, expired_cleaned: usize) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            total_entries: stats.total_entries,
            valid_entries: stats.valid_entries,
            expired_entries: stats.expired_entries,
            max_size: stats.max_size,
            memory_usage: stats.memory_usage,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expired_cleaned,
        }
    }
}

/// Response body for `POST /cache/invalidate`
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// The namespace that was targeted
    pub namespace: String,
    /// Number of entries removed
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(namespace: impl Into<String>, removed: usize) -> Self {
        Self {
            namespace: namespace.into(),
            removed,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
    /// Seconds until a rate-limited caller may retry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            retry_after: None,
        }
    }

    pub fn rate_limited(error: impl Into<String>, retry_after: u64) -> Self {
        Self {
            error: error.into(),
            retry_after: Some(retry_after),
        }
    }
}
