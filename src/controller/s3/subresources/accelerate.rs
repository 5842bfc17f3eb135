use async_trait::async_trait;

use super::{bucket_name, handler, STATUS_ENABLED, STATUS_SUSPENDED};
use crate::crd::Bucket;
use crate::managed::subresource::{SubresourceClient, SubresourceState};
use crate::managed::ReconcileError;

handler!(AccelerateClient);

#[async_trait]
impl SubresourceClient<Bucket> for AccelerateClient {
    fn name(&self) -> &'static str {
        "accelerateConfiguration"
    }

    async fn observe(&self, mr: &Bucket) -> Result<SubresourceState, ReconcileError> {
        let observed = self
            .gateway
            .get_bucket_accelerate(&bucket_name(mr))
            .await
            .map_err(ReconcileError::aws("cannot get bucket accelerate configuration"))?;
        Ok(match &mr.spec.for_provider.accelerate_configuration {
            None if observed.as_deref() == Some(STATUS_ENABLED) => SubresourceState::NeedsDeletion,
            None => SubresourceState::Updated,
            Some(desired) if observed.as_deref() == Some(desired.status.as_str()) => {
                SubresourceState::Updated
            }
            Some(_) => SubresourceState::NeedsUpdate,
        })
    }

    async fn create_or_update(&self, mr: &Bucket) -> Result<(), ReconcileError> {
        let Some(desired) = &mr.spec.for_provider.accelerate_configuration else {
            return Ok(());
        };
        self.gateway
            .put_bucket_accelerate(&bucket_name(mr), &desired.status)
            .await
            .map_err(ReconcileError::aws("cannot put bucket accelerate configuration"))
    }

    /// Acceleration cannot be removed, only suspended.
    async fn delete(&self, mr: &Bucket) -> Result<(), ReconcileError> {
        self.gateway
            .put_bucket_accelerate(&bucket_name(mr), STATUS_SUSPENDED)
            .await
            .map_err(ReconcileError::aws("cannot suspend bucket acceleration"))
    }
}
