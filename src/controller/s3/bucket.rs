//! # Bucket
//!
//! The bucket itself only has a create and a delete call. Everything else
//! is a sub-configuration with its own handler.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::subresources;
use crate::aws::{CredentialResolver, S3Gateway, SdkS3};
use crate::crd::s3::BucketStatus;
use crate::crd::{Bucket, Condition, Tag};
use crate::managed::connection::KEY_REGION;
use crate::managed::subresource::{self, Subresources};
use crate::managed::{
    managed_envelope, meta, ConnectionDetails, ExternalClient, ExternalCreation,
    ExternalObservation, ExternalUpdate, Managed, ReconcileError, SdkConnector,
};

/// Buckets in this region are created without a location constraint
const US_EAST_1: &str = "us-east-1";

#[async_trait]
impl Managed for Bucket {
    managed_envelope!(BucketStatus);

    fn region(&self) -> Option<&str> {
        Some(self.spec.for_provider.location_constraint.as_str()).filter(|r| !r.is_empty())
    }

    fn tags_mut(&mut self) -> Option<&mut Vec<Tag>> {
        Some(
            &mut self
                .spec
                .for_provider
                .tagging
                .get_or_insert_with(Default::default)
                .tag_set,
        )
    }
}

pub fn connector(credentials: Arc<CredentialResolver>) -> SdkConnector<Bucket> {
    SdkConnector::new(credentials, |config| {
        Box::new(BucketClient::new(Arc::new(SdkS3::new(config)))) as Box<dyn ExternalClient<Bucket>>
    })
}

/// `arn:<partition>:s3:::<bucket>`
pub fn bucket_arn(region: &str, bucket: &str) -> String {
    let partition = if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else {
        "aws"
    };
    format!("arn:{partition}:s3:::{bucket}")
}

pub struct BucketClient {
    gateway: Arc<dyn S3Gateway>,
    subresources: Subresources<Bucket>,
}

impl std::fmt::Debug for BucketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketClient")
            .field("subresources", &self.subresources.len())
            .finish_non_exhaustive()
    }
}

impl BucketClient {
    pub fn new(gateway: Arc<dyn S3Gateway>) -> Self {
        let subresources = subresources::all(&gateway);
        Self {
            gateway,
            subresources,
        }
    }
}

#[async_trait]
impl ExternalClient<Bucket> for BucketClient {
    async fn observe(&self, mr: &mut Bucket) -> Result<ExternalObservation, ReconcileError> {
        let name = meta::external_name_or_name(mr);
        match self.gateway.head_bucket(&name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Ok(ExternalObservation::absent()),
            Err(e) => return Err(ReconcileError::aws("cannot get bucket")(e)),
        }

        let region = mr.spec.for_provider.location_constraint.clone();
        mr.status.get_or_insert_with(Default::default).at_provider.arn =
            Some(bucket_arn(&region, &name));
        mr.set_conditions([Condition::available()]);

        let late_initialized = subresource::late_initialize_all(&self.subresources, mr).await?;
        let pending = subresource::first_pending(&self.subresources, mr).await?;

        let mut connection_details = ConnectionDetails::new();
        if !region.is_empty() {
            connection_details.insert(KEY_REGION.to_string(), region.into_bytes());
        }
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: pending.is_none(),
            resource_late_initialized: late_initialized,
            pending: false,
            connection_details,
            diff: pending.map(|(h, _)| h.name().to_string()).unwrap_or_default(),
        })
    }

    async fn create(&self, mr: &mut Bucket) -> Result<ExternalCreation, ReconcileError> {
        let name = meta::external_name_or_name(mr);
        let params = &mr.spec.for_provider;
        let location = Some(params.location_constraint.as_str())
            .filter(|r| !r.is_empty() && *r != US_EAST_1);
        match self
            .gateway
            .create_bucket(&name, location, params.acl.as_deref())
            .await
        {
            Err(e) if e.is_already_exists() => {
                debug!(bucket = %name, "Bucket already exists");
                Ok(ExternalCreation::default())
            }
            Err(e) => Err(ReconcileError::aws("cannot create bucket")(e)),
            Ok(()) => Ok(ExternalCreation::default()),
        }
    }

    async fn update(&self, mr: &mut Bucket) -> Result<ExternalUpdate, ReconcileError> {
        if let Some(applied) = subresource::apply_first(&self.subresources, mr).await? {
            debug!(subresource = applied, "Applied bucket sub-configuration");
        }
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, mr: &mut Bucket) -> Result<(), ReconcileError> {
        let name = meta::external_name_or_name(mr);
        match self.gateway.delete_bucket(&name).await {
            Err(e) if !e.is_not_found() => Err(ReconcileError::aws("cannot delete bucket")(e)),
            _ => Ok(()),
        }
    }
}
