//! # AWS Provider
//!
//! A Kubernetes provider that reconciles AWS resources declared as cluster-scoped
//! custom resources against the AWS API.
//!
//! ## Overview
//!
//! Each managed resource carries its desired state in `spec.forProvider` and reports
//! what AWS observed in `status.atProvider`. The provider:
//!
//! 1. **Resolves references** - Cross-resource references and label selectors become AWS identifiers
//! 2. **Observes** - Describes the external resource and late-initializes unset fields
//! 3. **Diffs** - Classifies drift into the single update class AWS can apply next
//! 4. **Mutates** - Creates, updates or deletes the external resource, one class per pass
//! 5. **Publishes** - Writes endpoints and generated credentials to connection secrets
//!
//! ## Managed kinds
//!
//! - ElastiCache `ReplicationGroup`, `CacheCluster`, `CacheSubnetGroup`
//! - Service Catalog `ProvisionedProduct`
//! - S3 `Bucket` (composed of independently reconciled sub-configurations)

pub mod aws;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod diff;
pub mod managed;
pub mod observability;
pub mod reference;
pub mod runtime;

// Re-export CRD types for convenience
pub use crd::*;
