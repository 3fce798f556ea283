//! Rate Limit Record Module
//!
//! Per-key attempt history and block state.

use std::collections::VecDeque;

// == Rate Limit Record ==
/// Attempts made by one key inside the current window, plus its block state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitRecord {
    /// Attempt timestamps (Unix ms), oldest first
    pub attempts: VecDeque<u64>,
    /// When set, the key is blocked until this instant
    pub blocked_until: Option<u64>,
}

impl RateLimitRecord {
    pub fn new() -> Self {
        Self::default()
    }

    // == Prune ==
    /// Drops attempts that are `window_ms` or more in the past.
    pub fn prune(&mut self, now_ms: u64, window_ms: u64) {
        while let Some(&oldest) = self.attempts.front() {
            if now_ms.saturating_sub(oldest) >= window_ms {
                self.attempts.pop_front();
            } else {
                break;
            }
        }
    }

    /// Attempts still inside the window, without mutating.
    pub fn attempts_in_window(&self, now_ms: u64, window_ms: u64) -> usize {
        self.attempts
            .iter()
            .filter(|&&t| now_ms.saturating_sub(t) < window_ms)
            .count()
    }

    pub fn is_blocked(&self, now_ms: u64) -> bool {
        self.blocked_until.map_or(false, |until| now_ms < until)
    }

    /// True when the record carries no state worth keeping.
    pub fn is_idle(&self, now_ms: u64, window_ms: u64) -> bool {
        !self.is_blocked(now_ms) && self.attempts_in_window(now_ms, window_ms) == 0
    }

    // == Reset ==
    /// Clears attempts and lifts any block.
    pub fn reset(&mut self) {
        self.attempts.clear();
        self.blocked_until = None;
    }
}
