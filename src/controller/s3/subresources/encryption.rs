use async_trait::async_trait;

use super::{bucket_name, handler};
use crate::crd::s3::ServerSideEncryptionRule;
use crate::crd::Bucket;
use crate::managed::subresource::{SubresourceClient, SubresourceState};
use crate::managed::ReconcileError;

const SSE_S3: &str = "AES256";

handler!(EncryptionClient);

/// S3 encrypts every bucket with SSE-S3 when nothing else is configured.
fn is_default_encryption(rules: &[ServerSideEncryptionRule]) -> bool {
    match rules {
        [rule] => {
            let default = &rule.apply_server_side_encryption_by_default;
            default.sse_algorithm == SSE_S3 && default.kms_master_key_id.is_none()
        }
        _ => false,
    }
}

#[async_trait]
impl SubresourceClient<Bucket> for EncryptionClient {
    fn name(&self) -> &'static str {
        "serverSideEncryptionConfiguration"
    }

    async fn observe(&self, mr: &Bucket) -> Result<SubresourceState, ReconcileError> {
        let observed = self
            .gateway
            .get_bucket_encryption(&bucket_name(mr))
            .await
            .map_err(ReconcileError::aws("cannot get bucket encryption configuration"))?;
        let desired = mr
            .spec
            .for_provider
            .server_side_encryption_configuration
            .as_ref()
            .map(|c| c.rules.as_slice())
            .unwrap_or_default();
        Ok(if desired.is_empty() {
            if observed.is_empty() || is_default_encryption(&observed) {
                SubresourceState::Updated
            } else {
                SubresourceState::NeedsDeletion
            }
        } else if desired == observed.as_slice() {
            SubresourceState::Updated
        } else {
            SubresourceState::NeedsUpdate
        })
    }

    async fn create_or_update(&self, mr: &Bucket) -> Result<(), ReconcileError> {
        let Some(desired) = &mr.spec.for_provider.server_side_encryption_configuration else {
            return Ok(());
        };
        self.gateway
            .put_bucket_encryption(&bucket_name(mr), &desired.rules)
            .await
            .map_err(ReconcileError::aws("cannot put bucket encryption configuration"))
    }

    async fn delete(&self, mr: &Bucket) -> Result<(), ReconcileError> {
        self.gateway
            .delete_bucket_encryption(&bucket_name(mr))
            .await
            .map_err(ReconcileError::aws("cannot delete bucket encryption configuration"))
    }
}
