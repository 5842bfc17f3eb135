//! # Provider Configuration
//!
//! Provider-level configuration loaded from environment variables.
//!
//! All configuration has sensible defaults and can be overridden via environment variables.
//! Command-line flags parsed in `main` take precedence over the environment.

mod controller;
mod duration;
mod server;

pub use controller::ControllerConfig;
pub use duration::parse_kubernetes_duration;
pub use server::ServerConfig;

/// Load configuration from environment variables with defaults
pub fn load_config() -> (ControllerConfig, ServerConfig) {
    (ControllerConfig::from_env(), ServerConfig::from_env())
}

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read a Kubernetes-style duration (`30s`, `5m`, `1h`) from the environment.
/// Falls back to `default_secs` when the variable is unset or malformed.
pub(crate) fn env_duration_or_default(key: &str, default_secs: u64) -> std::time::Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| match parse_kubernetes_duration(&v) {
            Ok(d) => Some(d),
            Err(e) => {
                tracing::warn!("Ignoring {key}={v}: {e}");
                None
            }
        })
        .unwrap_or(std::time::Duration::from_secs(default_secs))
}
