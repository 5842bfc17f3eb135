//! # Controllers
//!
//! Per-kind integrations of the managed reconciler: each kind implements
//! [`Managed`](crate::managed::Managed) and supplies an
//! [`ExternalClient`](crate::managed::ExternalClient) over its AWS gateway.

pub mod elasticache;
pub mod s3;
pub mod servicecatalog;
