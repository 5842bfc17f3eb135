use async_trait::async_trait;

use super::{bucket_name, handler, PAYER_BUCKET_OWNER};
use crate::crd::s3::PaymentConfiguration;
use crate::crd::Bucket;
use crate::managed::subresource::{SubresourceClient, SubresourceState};
use crate::managed::ReconcileError;

handler!(PaymentClient);

impl PaymentClient {
    async fn observed_payer(&self, mr: &Bucket) -> Result<String, ReconcileError> {
        let payer = self
            .gateway
            .get_bucket_request_payment(&bucket_name(mr))
            .await
            .map_err(ReconcileError::aws("cannot get bucket request payment configuration"))?;
        Ok(payer.unwrap_or_else(|| PAYER_BUCKET_OWNER.to_string()))
    }
}

#[async_trait]
impl SubresourceClient<Bucket> for PaymentClient {
    fn name(&self) -> &'static str {
        "paymentConfiguration"
    }

    async fn observe(&self, mr: &Bucket) -> Result<SubresourceState, ReconcileError> {
        let observed = self.observed_payer(mr).await?;
        Ok(match &mr.spec.for_provider.payment_configuration {
            None if observed != PAYER_BUCKET_OWNER => SubresourceState::NeedsDeletion,
            None => SubresourceState::Updated,
            Some(desired) if desired.payer == observed => SubresourceState::Updated,
            Some(_) => SubresourceState::NeedsUpdate,
        })
    }

    async fn create_or_update(&self, mr: &Bucket) -> Result<(), ReconcileError> {
        let Some(desired) = &mr.spec.for_provider.payment_configuration else {
            return Ok(());
        };
        self.gateway
            .put_bucket_request_payment(&bucket_name(mr), &desired.payer)
            .await
            .map_err(ReconcileError::aws("cannot put bucket request payment configuration"))
    }

    /// Every bucket has a payer; removing the configuration restores the owner.
    async fn delete(&self, mr: &Bucket) -> Result<(), ReconcileError> {
        self.gateway
            .put_bucket_request_payment(&bucket_name(mr), PAYER_BUCKET_OWNER)
            .await
            .map_err(ReconcileError::aws("cannot reset bucket request payment configuration"))
    }

    /// Only the default payer is adopted, so a removed `Requester`
    /// configuration still gets reset.
    async fn late_initialize(&self, mr: &mut Bucket) -> Result<bool, ReconcileError> {
        if mr.spec.for_provider.payment_configuration.is_some() {
            return Ok(false);
        }
        if self.observed_payer(mr).await? != PAYER_BUCKET_OWNER {
            return Ok(false);
        }
        mr.spec.for_provider.payment_configuration = Some(PaymentConfiguration {
            payer: PAYER_BUCKET_OWNER.to_string(),
        });
        Ok(true)
    }
}
