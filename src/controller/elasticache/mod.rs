//! # ElastiCache
//!
//! Replication groups use a hand-written client; cache clusters and cache
//! subnet groups use the generated client with hooks.

pub mod cache_cluster;
pub mod cache_subnet_group;
pub mod replication_group;

/// Status ElastiCache reports for a resource that accepts modifications
pub(crate) const STATUS_AVAILABLE: &str = "available";
