//! # Runtime Module
//!
//! Runtime components of the provider: initialization, the per-kind watch
//! loops, error handling with backoff and the metrics/probe server.

pub mod backoff;
pub mod error_policy;
pub mod initialization;
pub mod server;
pub mod watch_loop;

pub use error_policy::*;
pub use initialization::*;
pub use watch_loop::*;
