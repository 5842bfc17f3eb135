//! # Provisioned Product
//!
//! Hand-written client for Service Catalog provisioned products. Drift is
//! read from the CloudFormation stack behind the product.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::aws::servicecatalog::ProvisionedProductDetail;
use crate::aws::{CredentialResolver, SdkServiceCatalog, ServiceCatalogGateway};
use crate::crd::servicecatalog::ProvisionedProductStatus;
use crate::crd::{Condition, ProvisionedProduct, Tag};
use crate::diff::provisioned_product as diff;
use crate::managed::{
    managed_envelope, meta, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate,
    Managed, ReconcileError, SdkConnector,
};

pub const STATUS_AVAILABLE: &str = "AVAILABLE";
pub const STATUS_UNDER_CHANGE: &str = "UNDER_CHANGE";
pub const STATUS_PLAN_IN_PROGRESS: &str = "PLAN_IN_PROGRESS";
pub const STATUS_ERROR: &str = "ERROR";
pub const STATUS_TAINTED: &str = "TAINTED";

pub const RECORD_PROVISION: &str = "PROVISION_PRODUCT";
pub const RECORD_UPDATE: &str = "UPDATE_PROVISIONED_PRODUCT";
pub const RECORD_TERMINATE: &str = "TERMINATE_PROVISIONED_PRODUCT";

pub const MSG_UPDATING: &str = "provisioned product is updating, availability depends on product";
pub const MSG_AWAITING_PLAN: &str = "provisioned product is awaiting plan approval";
pub const MSG_UPDATE_PENDING: &str = "Provisioned product is already under change, not updating";

const ERR_DESCRIBE: &str = "cannot describe provisioned product";
const ERR_DESCRIBE_RECORD: &str = "cannot describe provisioning record";
const ERR_DESCRIBE_PRODUCT: &str = "cannot describe product";
const ERR_OUTPUTS: &str = "cannot get provisioned product outputs";
const ERR_STACK: &str = "cannot describe provisioned product stack";
const ERR_PROVISION: &str = "cannot provision product";
const ERR_UPDATE: &str = "cannot update provisioned product";
const ERR_TERMINATE: &str = "cannot terminate provisioned product";

#[async_trait]
impl Managed for ProvisionedProduct {
    managed_envelope!(ProvisionedProductStatus);

    fn region(&self) -> Option<&str> {
        self.spec.for_provider.region.as_deref()
    }

    fn tags_mut(&mut self) -> Option<&mut Vec<Tag>> {
        Some(&mut self.spec.for_provider.tags)
    }
}

pub fn connector(
    credentials: Arc<CredentialResolver>,
    provider_name: impl Into<String>,
) -> SdkConnector<ProvisionedProduct> {
    let provider_name = provider_name.into();
    SdkConnector::new(credentials, move |config| {
        Box::new(ProvisionedProductClient::new(
            Arc::new(SdkServiceCatalog::new(config)),
            provider_name.clone(),
        )) as Box<dyn ExternalClient<ProvisionedProduct>>
    })
}

/// Ready condition for a provisioned product status and the type of its
/// last record.
pub fn condition(status: Option<&str>, record_type: Option<&str>, message: Option<&str>) -> Condition {
    let message = message.unwrap_or_default();
    match status.unwrap_or_default() {
        STATUS_AVAILABLE => Condition::available(),
        STATUS_UNDER_CHANGE => match record_type.unwrap_or_default() {
            RECORD_PROVISION => Condition::creating(),
            RECORD_UPDATE => Condition::available().with_message(MSG_UPDATING),
            RECORD_TERMINATE => Condition::deleting(),
            _ => Condition::unavailable(),
        },
        STATUS_PLAN_IN_PROGRESS => Condition::unavailable().with_message(MSG_AWAITING_PLAN),
        STATUS_ERROR => Condition::unavailable()
            .with_message(format!("provisioned product has status {STATUS_ERROR}: {message}")),
        STATUS_TAINTED => Condition::unavailable()
            .with_message(format!("provisioned product has status {STATUS_TAINTED}: {message}")),
        _ => Condition::unavailable(),
    }
}

pub struct ProvisionedProductClient {
    gateway: Arc<dyn ServiceCatalogGateway>,
    provider_name: String,
}

impl std::fmt::Debug for ProvisionedProductClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionedProductClient")
            .field("provider_name", &self.provider_name)
            .finish_non_exhaustive()
    }
}

impl ProvisionedProductClient {
    pub fn new(gateway: Arc<dyn ServiceCatalogGateway>, provider_name: impl Into<String>) -> Self {
        Self {
            gateway,
            provider_name: provider_name.into(),
        }
    }

    /// Idempotency token, fresh per call.
    fn token(&self) -> String {
        format!("{}-{}", self.provider_name, Uuid::new_v4())
    }

    async fn last_record_type(
        &self,
        detail: &ProvisionedProductDetail,
        accept_language: Option<&str>,
    ) -> Result<Option<String>, ReconcileError> {
        let Some(record_id) = detail.last_record_id.as_deref() else {
            return Ok(None);
        };
        let record = self
            .gateway
            .describe_record(record_id, accept_language)
            .await
            .map_err(ReconcileError::aws(ERR_DESCRIBE_RECORD))?;
        Ok(record.record_type)
    }
}

fn observed_status(mr: &ProvisionedProduct) -> Option<&str> {
    mr.status.as_ref().and_then(|s| s.at_provider.status.as_deref())
}

#[async_trait]
impl ExternalClient<ProvisionedProduct> for ProvisionedProductClient {
    async fn observe(
        &self,
        mr: &mut ProvisionedProduct,
    ) -> Result<ExternalObservation, ReconcileError> {
        let late_initialized = diff::late_initialize(&mut mr.spec.for_provider);
        let name = meta::external_name_or_name(mr);
        let accept_language = mr.spec.for_provider.accept_language.clone();
        let accept_language = accept_language.as_deref();

        let detail = match self
            .gateway
            .describe_provisioned_product(&name, accept_language)
            .await
        {
            Ok(detail) => detail,
            Err(e) if e.is_not_found() => return Ok(ExternalObservation::absent()),
            Err(e) => return Err(ReconcileError::aws(ERR_DESCRIBE)(e)),
        };
        let record_type = self.last_record_type(&detail, accept_language).await?;
        let ready = condition(
            detail.status.as_deref(),
            record_type.as_deref(),
            detail.status_message.as_deref(),
        );

        let status = detail.status.as_deref().unwrap_or_default();
        if status == STATUS_UNDER_CHANGE || status == STATUS_PLAN_IN_PROGRESS {
            // Outputs and stack parameters are in flux; keep what was last seen
            let at_provider = &mut mr.status.get_or_insert_with(Default::default).at_provider;
            let mut observation = diff::generate_observation(&detail, &[], record_type);
            observation.outputs = std::mem::take(&mut at_provider.outputs);
            observation.cloudformation_stack_arn = at_provider.cloudformation_stack_arn.take();
            *at_provider = observation;
            mr.set_conditions([ready]);
            debug!(status, "Provisioned product is changing, skipping drift detection");
            return Ok(ExternalObservation {
                resource_exists: true,
                resource_up_to_date: true,
                resource_late_initialized: late_initialized,
                pending: true,
                ..ExternalObservation::default()
            });
        }

        let product_ref = detail.id.as_deref().unwrap_or(name.as_str());
        let outputs = self
            .gateway
            .get_provisioned_product_outputs(product_ref, accept_language)
            .await
            .map_err(ReconcileError::aws(ERR_OUTPUTS))?;
        let stack_parameters = match diff::stack_arn(&outputs) {
            Some(arn) => self
                .gateway
                .stack_parameters(arn)
                .await
                .map_err(ReconcileError::aws(ERR_STACK))?,
            None => BTreeMap::new(),
        };

        let params = &mr.spec.for_provider;
        let product = self
            .gateway
            .describe_product(
                params.product_id.as_deref(),
                params.product_name.as_deref(),
                accept_language,
            )
            .await
            .map_err(ReconcileError::aws(ERR_DESCRIBE_PRODUCT))?;
        let drift = diff::drifted_fields(params, &detail, &product, &stack_parameters);

        mr.status.get_or_insert_with(Default::default).at_provider =
            diff::generate_observation(&detail, &outputs, record_type);
        mr.set_conditions([ready]);

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: drift.is_empty(),
            resource_late_initialized: late_initialized,
            pending: false,
            connection_details: Default::default(),
            diff: drift.join(", "),
        })
    }

    async fn create(&self, mr: &mut ProvisionedProduct) -> Result<ExternalCreation, ReconcileError> {
        let name = meta::external_name_or_name(mr);
        let input = diff::generate_provision_input(&name, &mr.spec.for_provider, self.token());
        let record = match self.gateway.provision_product(input).await {
            Ok(record) => record,
            Err(e) if e.is_already_exists() => {
                debug!(provisioned_product = %name, "Provisioned product already exists");
                return Ok(ExternalCreation::default());
            }
            Err(e) => return Err(ReconcileError::aws(ERR_PROVISION)(e)),
        };
        if let Some(product_name) = record.provisioned_product_name.filter(|n| !n.is_empty()) {
            if product_name != name {
                info!(provisioned_product = %product_name, "Using provisioned product name from AWS");
            }
            meta::set_external_name(mr, product_name);
        }
        Ok(ExternalCreation::default())
    }

    async fn update(&self, mr: &mut ProvisionedProduct) -> Result<ExternalUpdate, ReconcileError> {
        let status = observed_status(mr).unwrap_or_default();
        if status.is_empty() || status == STATUS_UNDER_CHANGE {
            return Err(ReconcileError::UpdatePending(MSG_UPDATE_PENDING.to_string()));
        }
        let name = meta::external_name_or_name(mr);
        let input = diff::generate_update_input(&name, &mr.spec.for_provider, self.token());
        self.gateway
            .update_provisioned_product(input)
            .await
            .map_err(ReconcileError::aws(ERR_UPDATE))?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, mr: &mut ProvisionedProduct) -> Result<(), ReconcileError> {
        if observed_status(mr) == Some(STATUS_UNDER_CHANGE) {
            debug!("Provisioned product is under change, not terminating");
            return Ok(());
        }
        let name = meta::external_name_or_name(mr);
        let token = self.token();
        match self
            .gateway
            .terminate_provisioned_product(
                &name,
                &token,
                mr.spec.for_provider.accept_language.as_deref(),
            )
            .await
        {
            Err(e) if !e.is_not_found() => Err(ReconcileError::aws(ERR_TERMINATE)(e)),
            _ => Ok(()),
        }
    }
}
