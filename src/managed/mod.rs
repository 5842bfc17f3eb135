//! # Resource Reconciler
//!
//! The generic Observe → Create | Update | Delete state machine every managed
//! kind runs through, and the contracts kinds implement to plug into it:
//!
//! - [`Managed`]: envelope accessors and reference resolution for a kind
//! - [`ExternalClient`]: observe, create, update and delete against AWS
//! - [`Connector`]: builds an [`ExternalClient`] from fresh credentials
//!
//! Hook-based clients for plain CRUD kinds live in [`generated`], sub-resource
//! composition (S3 buckets) in [`subresource`].

pub mod connection;
pub mod connector;
pub mod control_plane;
pub mod error;
pub mod generated;
pub mod meta;
pub mod reconciler;
pub mod subresource;

use async_trait::async_trait;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::aws::RegionScope;
use crate::crd::{Condition, ResourceSpec, ResourceStatus, Tag};
use crate::reference::{ReferenceError, Resolver};

pub use connector::SdkConnector;
pub use control_plane::{ControlPlane, KubeControlPlane};
pub use error::ReconcileError;
pub use reconciler::Reconciler;

/// Connection secret content, key to raw bytes.
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

/// A cluster-scoped custom resource that mirrors one AWS resource.
#[async_trait]
pub trait Managed:
    Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    fn resource_spec(&self) -> &ResourceSpec;
    fn resource_status(&self) -> Option<&ResourceStatus>;
    fn resource_status_mut(&mut self) -> &mut ResourceStatus;

    /// `forProvider.region`, when the kind carries one
    fn region(&self) -> Option<&str> {
        None
    }

    /// Kinds whose AWS API is partition-global return [`RegionScope::Global`]
    fn region_scope() -> RegionScope {
        RegionScope::Regional
    }

    /// Tags the provider adds its own tags to
    fn tags_mut(&mut self) -> Option<&mut Vec<Tag>> {
        None
    }

    /// Resolve reference fields into their literal counterparts. Returns
    /// whether any field changed.
    async fn resolve_references(&mut self, _resolver: &Resolver<'_>) -> Result<bool, ReferenceError> {
        Ok(false)
    }

    fn set_conditions(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        self.resource_status_mut().set_conditions(conditions);
    }
}

/// Implements the envelope accessors of [`Managed`] for a kind whose spec
/// flattens `resource` and whose status flattens `resource`.
macro_rules! managed_envelope {
    ($status:ty) => {
        fn resource_spec(&self) -> &$crate::crd::ResourceSpec {
            &self.spec.resource
        }

        fn resource_status(&self) -> Option<&$crate::crd::ResourceStatus> {
            self.status.as_ref().map(|s| &s.resource)
        }

        fn resource_status_mut(&mut self) -> &mut $crate::crd::ResourceStatus {
            &mut self.status.get_or_insert_with(<$status>::default).resource
        }
    };
}
pub(crate) use managed_envelope;

/// What Observe found in AWS.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalObservation {
    pub resource_exists: bool,
    pub resource_up_to_date: bool,
    /// Desired state was filled in from AWS and should be written back
    pub resource_late_initialized: bool,
    /// AWS is still applying a change; poll again soon
    pub pending: bool,
    pub connection_details: ConnectionDetails,
    /// Human-readable drift summary for logs
    pub diff: String,
}

impl ExternalObservation {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn up_to_date() -> Self {
        Self {
            resource_exists: true,
            resource_up_to_date: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalCreation {
    /// Published once, right after creation
    pub connection_details: ConnectionDetails,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalUpdate {
    pub connection_details: ConnectionDetails,
}

/// AWS operations for one managed object, built per pass.
#[async_trait]
pub trait ExternalClient<R: Managed>: Send + Sync {
    /// Must not mutate AWS. May late-initialize `mr`'s spec and set its
    /// status.
    async fn observe(&self, mr: &mut R) -> Result<ExternalObservation, ReconcileError>;
    /// Only called when Observe found nothing. Tolerates already-exists.
    async fn create(&self, mr: &mut R) -> Result<ExternalCreation, ReconcileError>;
    /// Applies at most one class of change.
    async fn update(&self, mr: &mut R) -> Result<ExternalUpdate, ReconcileError>;
    /// Tolerates already-deleting and not-found.
    async fn delete(&self, mr: &mut R) -> Result<(), ReconcileError>;
}

/// Produces an [`ExternalClient`] with freshly resolved credentials.
#[async_trait]
pub trait Connector<R: Managed>: Send + Sync {
    async fn connect(&self, mr: &R) -> Result<Box<dyn ExternalClient<R>>, ReconcileError>;
}

/// Ready condition for an AWS lifecycle status. Every status maps to exactly
/// one condition; unknown ones are `Unavailable`.
pub fn condition_for_status(status: Option<&str>, message: Option<&str>) -> Condition {
    let Some(status) = status else {
        return Condition::unavailable();
    };
    match status.to_ascii_lowercase().as_str() {
        "available" | "active" => Condition::available(),
        "creating" => Condition::creating(),
        "deleting" => Condition::deleting(),
        "error" | "tainted" | "create-failed" | "failed" => match message {
            Some(m) if !m.is_empty() => Condition::unavailable().with_message(m),
            _ => Condition::unavailable(),
        },
        _ => Condition::unavailable(),
    }
}
