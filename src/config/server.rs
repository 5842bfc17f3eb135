//! # Server Configuration
//!
//! Settings of the side HTTP server that serves `/metrics`, `/healthz` and
//! `/readyz` next to the managed-resource controllers.
//!
//! | Variable | Default |
//! |---|---|
//! | `METRICS_PORT` | `8080` |
//! | `SERVER_STARTUP_TIMEOUT_SECS` | `10` |
//! | `SERVER_POLL_INTERVAL_MS` | `100` |

use std::time::Duration;

use super::env_var_or_default;
use crate::constants::{
    DEFAULT_METRICS_PORT, DEFAULT_SERVER_POLL_INTERVAL_MS, DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub metrics_port: u16,
    /// Controllers are not started until the probe server answers within this
    pub startup_timeout: Duration,
    /// Delay between readiness checks of the probe server during startup
    pub readiness_poll: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            startup_timeout: Duration::from_secs(DEFAULT_SERVER_STARTUP_TIMEOUT_SECS),
            readiness_poll: Duration::from_millis(DEFAULT_SERVER_POLL_INTERVAL_MS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            startup_timeout: Duration::from_secs(env_var_or_default(
                "SERVER_STARTUP_TIMEOUT_SECS",
                DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            )),
            readiness_poll: Duration::from_millis(env_var_or_default(
                "SERVER_POLL_INTERVAL_MS",
                DEFAULT_SERVER_POLL_INTERVAL_MS,
            )),
        }
    }
}
