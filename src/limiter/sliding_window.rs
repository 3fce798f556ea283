//! Sliding-Window Rate Limiter
//!
//! Counts attempts per key over a rolling window and blocks a key for a while
//! once it uses up its attempts. Advisory and in-memory: state is lost on
//! restart and is not shared between processes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::record::RateLimitRecord;
use crate::clock::{system_clock, SharedClock};

/// Tracked keys past which new keys trigger a sweep of idle records.
pub const MAX_TRACKED_KEYS: usize = 10_000;

// == Config ==
/// Limits applied to one kind of action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Attempts allowed inside one window (`0` is treated as `1`)
    pub max_attempts: usize,
    /// Length of the sliding window in milliseconds
    pub window_ms: u64,
    /// How long a key stays blocked once it runs out of attempts
    pub block_duration_ms: u64,
}

impl RateLimitConfig {
    pub fn new(max_attempts: usize, window_ms: u64, block_duration_ms: u64) -> Self {
        Self {
            max_attempts,
            window_ms,
            block_duration_ms,
        }
    }

    /// 5 generations a minute, then 15 minutes off.
    pub fn recipe_generation() -> Self {
        Self::new(5, 60_000, 15 * 60_000)
    }

    /// 20 content edits a minute, then 5 minutes off.
    pub fn content_update() -> Self {
        Self::new(20, 60_000, 5 * 60_000)
    }

    fn effective_max(&self) -> usize {
        self.max_attempts.max(1)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::recipe_generation()
    }
}

// == Decision ==
/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Attempts left in the current window
    pub remaining: usize,
    /// When the window frees up or the block lifts (Unix ms)
    pub reset_time: u64,
    /// Seconds to wait before retrying, set only when denied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl RateLimitDecision {
    fn allowed(remaining: usize, reset_time: u64) -> Self {
        Self {
            allowed: true,
            remaining,
            reset_time,
            retry_after: None,
        }
    }

    fn denied(blocked_until: u64, now_ms: u64) -> Self {
        let wait_ms = blocked_until.saturating_sub(now_ms);
        Self {
            allowed: false,
            remaining: 0,
            reset_time: blocked_until,
            retry_after: Some(wait_ms.div_ceil(1000).max(1)),
        }
    }
}

// == Rate Limiter ==
/// Per-key sliding-window limiter with temporary blocking.
#[derive(Debug)]
pub struct RateLimiter {
    records: HashMap<String, RateLimitRecord>,
    high_water_mark: usize,
    clock: SharedClock,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    // == Constructor ==
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            records: HashMap::new(),
            high_water_mark: MAX_TRACKED_KEYS,
            clock,
        }
    }

    /// Overrides the number of tracked keys that triggers a sweep.
    pub fn with_high_water_mark(mut self, keys: usize) -> Self {
        self.high_water_mark = keys;
        self
    }

    // == Check ==
    /// Records an attempt by `key` and decides whether it may proceed.
    ///
    /// Stale attempts are pruned before counting, so a key is never blocked
    /// on attempts from a previous window.
    pub fn check(&mut self, key: &str, config: &RateLimitConfig) -> RateLimitDecision {
        let now = self.clock.now_ms();
        let max_attempts = config.effective_max();

        if !self.records.contains_key(key) && self.records.len() >= self.high_water_mark {
            self.sweep_at(now, config.window_ms);
        }

        let record = self.records.entry(key.to_string()).or_default();

        if let Some(until) = record.blocked_until {
            if now < until {
                return RateLimitDecision::denied(until, now);
            }
            record.reset();
        }

        record.prune(now, config.window_ms);

        if record.attempts.len() >= max_attempts {
            let until = now.saturating_add(config.block_duration_ms);
            record.blocked_until = Some(until);
            warn!(
                key,
                attempts = record.attempts.len(),
                blocked_for_ms = config.block_duration_ms,
                "Rate limit exceeded, blocking key"
            );
            return RateLimitDecision::denied(until, now);
        }

        record.attempts.push_back(now);
        let oldest = record.attempts.front().copied().unwrap_or(now);
        RateLimitDecision::allowed(
            max_attempts - record.attempts.len(),
            oldest.saturating_add(config.window_ms),
        )
    }

    // == Status ==
    /// Reports where `key` stands without recording an attempt.
    ///
    /// Returns `None` for keys that were never seen.
    pub fn status(&self, key: &str, config: &RateLimitConfig) -> Option<RateLimitDecision> {
        let now = self.clock.now_ms();
        let record = self.records.get(key)?;

        if let Some(until) = record.blocked_until {
            if now < until {
                return Some(RateLimitDecision::denied(until, now));
            }
            // The block has lifted; the next check starts from scratch.
            return Some(RateLimitDecision::allowed(config.effective_max(), now));
        }

        let used = record.attempts_in_window(now, config.window_ms);
        let reset_time = record
            .attempts
            .iter()
            .find(|&&t| now.saturating_sub(t) < config.window_ms)
            .map(|&t| t.saturating_add(config.window_ms))
            .unwrap_or(now);

        Some(RateLimitDecision {
            allowed: used < config.effective_max(),
            remaining: config.effective_max().saturating_sub(used),
            reset_time,
            retry_after: None,
        })
    }

    // == Reset ==
    /// Forgets everything about `key`. Returns whether it was tracked.
    pub fn reset(&mut self, key: &str) -> bool {
        self.records.remove(key).is_some()
    }

    // == Sweep ==
    /// Drops records that are unblocked and have no attempts in the window.
    ///
    /// Returns the number of records dropped.
    pub fn sweep(&mut self, config: &RateLimitConfig) -> usize {
        let now = self.clock.now_ms();
        self.sweep_at(now, config.window_ms)
    }

    fn sweep_at(&mut self, now: u64, window_ms: u64) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_idle(now, window_ms));
        let removed = before - self.records.len();
        debug!(removed, remaining = self.records.len(), "Swept idle rate-limit records");
        removed
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.records.len()
    }
}
