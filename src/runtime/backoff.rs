//! # Backoff
//!
//! Per-resource exponential backoff for transient reconciliation errors.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

/// Exponential backoff doubling from `min` up to `max`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    min: Duration,
    max: Duration,
    attempts: u32,
}

impl ExponentialBackoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
            attempts: 0,
        }
    }

    /// Delay before the next retry. Each call doubles the delay until `max`.
    pub fn next_backoff(&mut self) -> Duration {
        let factor = 2u32.saturating_pow(self.attempts);
        self.attempts = self.attempts.saturating_add(1);
        self.min.saturating_mul(factor).min(self.max)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Backoff state per resource key, reset once a pass succeeds.
#[derive(Debug)]
pub struct BackoffTracker {
    min: Duration,
    max: Duration,
    states: Mutex<HashMap<String, ExponentialBackoff>>,
}

impl BackoffTracker {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Next delay for `key` and the number of consecutive failures so far.
    pub fn next(&self, key: &str) -> (Duration, u32) {
        match self.states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(key.to_string())
                    .or_insert_with(|| ExponentialBackoff::new(self.min, self.max));
                let delay = state.next_backoff();
                (delay, state.attempts())
            }
            Err(e) => {
                warn!("Failed to lock backoff states: {e}, using maximum backoff");
                (self.max, 0)
            }
        }
    }

    pub fn reset(&self, key: &str) {
        if let Ok(mut states) = self.states.lock() {
            states.remove(key);
        }
    }
}
