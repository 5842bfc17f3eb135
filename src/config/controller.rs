//! # Controller Configuration
//!
//! Reconciliation timing, concurrency and identity settings.

use super::{env_duration_or_default, env_var_or_default};
use std::time::Duration;

/// Controller configuration shared by every managed kind
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Requeue interval for resources that are up to date
    pub poll_interval: Duration,
    /// Requeue interval while AWS is still applying a change
    pub short_wait: Duration,
    /// Deadline for a single reconciliation pass
    pub reconcile_timeout: Duration,
    /// Maximum parallel reconciliations per kind
    pub max_reconcile_rate: u16,
    /// Lower bound of the exponential backoff for transient errors
    pub backoff_min: Duration,
    /// Upper bound of the exponential backoff for transient errors
    pub backoff_max: Duration,
    /// Provider name, used as field manager, tag value and token prefix
    pub provider_name: String,
    /// ProviderConfig used when a resource names none
    pub default_provider_config: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            short_wait: Duration::from_secs(DEFAULT_SHORT_WAIT_SECS),
            reconcile_timeout: Duration::from_secs(DEFAULT_RECONCILE_TIMEOUT_SECS),
            max_reconcile_rate: DEFAULT_MAX_RECONCILE_RATE,
            backoff_min: Duration::from_secs(DEFAULT_BACKOFF_MIN_SECS),
            backoff_max: Duration::from_secs(DEFAULT_BACKOFF_MAX_SECS),
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
            default_provider_config: DEFAULT_PROVIDER_CONFIG.to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        let mut config = Self {
            poll_interval: env_duration_or_default("POLL_INTERVAL", DEFAULT_POLL_INTERVAL_SECS),
            short_wait: env_duration_or_default("SHORT_WAIT", DEFAULT_SHORT_WAIT_SECS),
            reconcile_timeout: env_duration_or_default(
                "RECONCILE_TIMEOUT",
                DEFAULT_RECONCILE_TIMEOUT_SECS,
            ),
            max_reconcile_rate: env_var_or_default(
                "MAX_RECONCILE_RATE",
                DEFAULT_MAX_RECONCILE_RATE,
            ),
            backoff_min: env_duration_or_default("BACKOFF_MIN", DEFAULT_BACKOFF_MIN_SECS),
            backoff_max: env_duration_or_default("BACKOFF_MAX", DEFAULT_BACKOFF_MAX_SECS),
            provider_name: env_var_or_default("PROVIDER_NAME", DEFAULT_PROVIDER_NAME.to_string()),
            default_provider_config: env_var_or_default(
                "DEFAULT_PROVIDER_CONFIG",
                DEFAULT_PROVIDER_CONFIG.to_string(),
            ),
        };
        config.normalize();
        config
    }

    /// Clamp values that would stall the controller.
    pub fn normalize(&mut self) {
        if self.max_reconcile_rate == 0 {
            self.max_reconcile_rate = 1;
        }
        if self.backoff_max < self.backoff_min {
            self.backoff_max = self.backoff_min;
        }
    }
}
