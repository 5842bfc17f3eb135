use async_trait::async_trait;

use super::{bucket_name, handler};
use crate::crd::Bucket;
use crate::managed::subresource::{SubresourceClient, SubresourceState};
use crate::managed::ReconcileError;

handler!(CorsClient);

#[async_trait]
impl SubresourceClient<Bucket> for CorsClient {
    fn name(&self) -> &'static str {
        "corsConfiguration"
    }

    async fn observe(&self, mr: &Bucket) -> Result<SubresourceState, ReconcileError> {
        let observed = self
            .gateway
            .get_bucket_cors(&bucket_name(mr))
            .await
            .map_err(ReconcileError::aws("cannot get bucket CORS configuration"))?;
        let desired = mr
            .spec
            .for_provider
            .cors_configuration
            .as_ref()
            .map(|c| c.cors_rules.as_slice())
            .unwrap_or_default();
        Ok(if desired.is_empty() && !observed.is_empty() {
            SubresourceState::NeedsDeletion
        } else if desired == observed.as_slice() {
            SubresourceState::Updated
        } else {
            SubresourceState::NeedsUpdate
        })
    }

    async fn create_or_update(&self, mr: &Bucket) -> Result<(), ReconcileError> {
        let Some(desired) = &mr.spec.for_provider.cors_configuration else {
            return Ok(());
        };
        self.gateway
            .put_bucket_cors(&bucket_name(mr), &desired.cors_rules)
            .await
            .map_err(ReconcileError::aws("cannot put bucket CORS configuration"))
    }

    async fn delete(&self, mr: &Bucket) -> Result<(), ReconcileError> {
        self.gateway
            .delete_bucket_cors(&bucket_name(mr))
            .await
            .map_err(ReconcileError::aws("cannot delete bucket CORS configuration"))
    }
}
