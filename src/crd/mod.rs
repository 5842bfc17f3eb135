//! # Custom Resource Definitions
//!
//! CRD types for the AWS provider.
//!
//! Every managed kind composes the same envelope: [`ResourceSpec`] is flattened
//! next to `forProvider` in the spec and [`ResourceStatus`] next to `atProvider`
//! in the status. `ProviderConfig` is not reconciled; the credential resolver
//! reads it.

mod common;
mod condition;
pub mod elasticache;
mod provider_config;
pub mod s3;
pub mod servicecatalog;

pub use common::{
    DeletionPolicy, ManagementAction, Reference, ResourceSpec, ResourceStatus, SecretKeySelector,
    SecretReference, Selector, Tag,
};
pub use condition::{Condition, ConditionReason, CONDITION_READY, CONDITION_SYNCED};
pub use elasticache::{CacheCluster, CacheSubnetGroup, ReplicationGroup};
pub use provider_config::{
    AssumeRoleOptions, CredentialsSource, ProviderConfig, ProviderConfigSpec, ProviderCredentials,
};
pub use s3::Bucket;
pub use servicecatalog::ProvisionedProduct;
