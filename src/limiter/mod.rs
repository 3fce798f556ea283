//! Rate Limiter Module
//!
//! Sliding-window attempt counting per caller key with temporary blocking.

mod record;
mod sliding_window;

pub use record::RateLimitRecord;
pub use sliding_window::{RateLimitConfig, RateLimitDecision, RateLimiter, MAX_TRACKED_KEYS};
