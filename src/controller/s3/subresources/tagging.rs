use async_trait::async_trait;

use super::{bucket_name, handler};
use crate::crd::Bucket;
use crate::diff::tags::tag_map;
use crate::managed::subresource::{SubresourceClient, SubresourceState};
use crate::managed::ReconcileError;

handler!(TaggingClient);

#[async_trait]
impl SubresourceClient<Bucket> for TaggingClient {
    fn name(&self) -> &'static str {
        "tagging"
    }

    async fn observe(&self, mr: &Bucket) -> Result<SubresourceState, ReconcileError> {
        let observed = self
            .gateway
            .get_bucket_tagging(&bucket_name(mr))
            .await
            .map_err(ReconcileError::aws("cannot get bucket tagging"))?;
        let desired = mr
            .spec
            .for_provider
            .tagging
            .as_ref()
            .map(|t| tag_map(&t.tag_set))
            .unwrap_or_default();
        Ok(if desired.is_empty() && !observed.is_empty() {
            SubresourceState::NeedsDeletion
        } else if desired == observed {
            SubresourceState::Updated
        } else {
            SubresourceState::NeedsUpdate
        })
    }

    async fn create_or_update(&self, mr: &Bucket) -> Result<(), ReconcileError> {
        let Some(tagging) = &mr.spec.for_provider.tagging else {
            return Ok(());
        };
        self.gateway
            .put_bucket_tagging(&bucket_name(mr), &tag_map(&tagging.tag_set))
            .await
            .map_err(ReconcileError::aws("cannot put bucket tagging"))
    }

    async fn delete(&self, mr: &Bucket) -> Result<(), ReconcileError> {
        self.gateway
            .delete_bucket_tagging(&bucket_name(mr))
            .await
            .map_err(ReconcileError::aws("cannot delete bucket tagging"))
    }
}
