//! # Observability
//!
//! Prometheus metrics exposed on `/metrics`.

pub mod metrics;
