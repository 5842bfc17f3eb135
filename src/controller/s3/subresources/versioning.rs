use async_trait::async_trait;

use super::{bucket_name, handler, STATUS_ENABLED, STATUS_SUSPENDED};
use crate::crd::Bucket;
use crate::managed::subresource::{SubresourceClient, SubresourceState};
use crate::managed::ReconcileError;

handler!(VersioningClient);

#[async_trait]
impl SubresourceClient<Bucket> for VersioningClient {
    fn name(&self) -> &'static str {
        "versioningConfiguration"
    }

    async fn observe(&self, mr: &Bucket) -> Result<SubresourceState, ReconcileError> {
        let observed = self
            .gateway
            .get_bucket_versioning(&bucket_name(mr))
            .await
            .map_err(ReconcileError::aws("cannot get bucket versioning"))?;
        Ok(match &mr.spec.for_provider.versioning_configuration {
            None if observed.as_deref() == Some(STATUS_ENABLED) => SubresourceState::NeedsDeletion,
            None => SubresourceState::Updated,
            Some(desired) if observed.as_deref() == Some(desired.status.as_str()) => {
                SubresourceState::Updated
            }
            // A never-versioned bucket reports no status, which is as good as suspended
            Some(desired) if observed.is_none() && desired.status == STATUS_SUSPENDED => {
                SubresourceState::Updated
            }
            Some(_) => SubresourceState::NeedsUpdate,
        })
    }

    async fn create_or_update(&self, mr: &Bucket) -> Result<(), ReconcileError> {
        let Some(desired) = &mr.spec.for_provider.versioning_configuration else {
            return Ok(());
        };
        self.gateway
            .put_bucket_versioning(&bucket_name(mr), &desired.status)
            .await
            .map_err(ReconcileError::aws("cannot put bucket versioning"))
    }

    /// Versioning cannot be turned off once enabled, only suspended.
    async fn delete(&self, mr: &Bucket) -> Result<(), ReconcileError> {
        self.gateway
            .put_bucket_versioning(&bucket_name(mr), STATUS_SUSPENDED)
            .await
            .map_err(ReconcileError::aws("cannot suspend bucket versioning"))
    }
}
