//! Provisioned product drift.
//!
//! The product's real state lives in a CloudFormation stack, so drift is
//! the product or artifact having changed, or a desired provisioning
//! parameter differing from the stack's value. Parameters only the stack
//! carries are product defaults and never drift.

use std::collections::BTreeMap;

use super::late_init;
use super::tags::tag_map;
use crate::aws::servicecatalog::{
    ProductView, ProvisionProductInput, ProvisionedProductDetail, RecordOutput,
    UpdateProvisionedProductInput,
};
use crate::crd::servicecatalog::{ProvisionedProductObservation, ProvisionedProductParameters};

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en";
/// Output key carrying the ARN of the underlying stack
pub const STACK_ARN_OUTPUT: &str = "CloudformationStackARN";

pub fn late_initialize(params: &mut ProvisionedProductParameters) -> bool {
    late_init(
        &mut params.accept_language,
        Some(DEFAULT_ACCEPT_LANGUAGE.to_string()),
    )
}

/// Desired product ID, resolving a product given by name.
fn desired_product_id<'a>(
    params: &'a ProvisionedProductParameters,
    product: &'a ProductView,
) -> Option<&'a str> {
    params
        .product_id
        .as_deref()
        .or(product.product_id.as_deref())
}

/// Desired artifact ID, resolving an artifact given by name.
fn desired_artifact_id<'a>(
    params: &'a ProvisionedProductParameters,
    product: &'a ProductView,
) -> Option<&'a str> {
    if let Some(id) = params.provisioning_artifact_id.as_deref() {
        return Some(id);
    }
    let name = params.provisioning_artifact_name.as_deref()?;
    product
        .artifacts
        .iter()
        .find(|a| a.name.as_deref() == Some(name))
        .and_then(|a| a.id.as_deref())
}

pub fn product_or_artifact_changed(
    params: &ProvisionedProductParameters,
    detail: &ProvisionedProductDetail,
    product: &ProductView,
) -> bool {
    let product_changed = desired_product_id(params, product)
        .is_some_and(|id| detail.product_id.as_deref() != Some(id));
    let artifact_changed = desired_artifact_id(params, product)
        .is_some_and(|id| detail.provisioning_artifact_id.as_deref() != Some(id));
    product_changed || artifact_changed
}

pub fn parameters_changed(
    params: &ProvisionedProductParameters,
    stack_parameters: &BTreeMap<String, String>,
) -> bool {
    params
        .provisioning_parameters
        .iter()
        .any(|p| stack_parameters.get(&p.key) != Some(&p.value))
}

/// Drifted fields, in the order they are reported. Empty when up to date.
pub fn drifted_fields(
    params: &ProvisionedProductParameters,
    detail: &ProvisionedProductDetail,
    product: &ProductView,
    stack_parameters: &BTreeMap<String, String>,
) -> Vec<&'static str> {
    let mut drift = Vec::new();
    if product_or_artifact_changed(params, detail, product) {
        drift.push("product");
    }
    if parameters_changed(params, stack_parameters) {
        drift.push("provisioningParameters");
    }
    drift
}

pub fn stack_arn(outputs: &[RecordOutput]) -> Option<&str> {
    outputs
        .iter()
        .find(|o| o.key == STACK_ARN_OUTPUT)
        .and_then(|o| o.value.as_deref())
}

pub fn generate_observation(
    detail: &ProvisionedProductDetail,
    outputs: &[RecordOutput],
    last_record_type: Option<String>,
) -> ProvisionedProductObservation {
    ProvisionedProductObservation {
        arn: detail.arn.clone(),
        cloudformation_stack_arn: stack_arn(outputs).map(str::to_string),
        created_time: detail.created_time.clone(),
        id: detail.id.clone(),
        last_product_id: detail.product_id.clone(),
        last_provisioning_artifact_id: detail.provisioning_artifact_id.clone(),
        last_provisioning_record_id: detail.last_provisioning_record_id.clone(),
        last_successful_provisioning_record_id: detail
            .last_successful_provisioning_record_id
            .clone(),
        last_record_type,
        outputs: outputs
            .iter()
            .filter_map(|o| Some((o.key.clone(), o.value.clone()?)))
            .collect(),
        provisioned_product_type: detail.provisioned_product_type.clone(),
        status: detail.status.clone(),
        status_message: detail.status_message.clone(),
    }
}

pub fn generate_provision_input(
    name: &str,
    params: &ProvisionedProductParameters,
    token: String,
) -> ProvisionProductInput {
    ProvisionProductInput {
        accept_language: params.accept_language.clone(),
        notification_arns: params.notification_arns.clone(),
        path_id: params.path_id.clone(),
        path_name: params.path_name.clone(),
        product_id: params.product_id.clone(),
        product_name: params.product_name.clone(),
        provisioning_artifact_id: params.provisioning_artifact_id.clone(),
        provisioning_artifact_name: params.provisioning_artifact_name.clone(),
        provisioned_product_name: name.to_string(),
        parameters: params.provisioning_parameters.clone(),
        tags: tag_map(&params.tags),
        provision_token: token,
    }
}

pub fn generate_update_input(
    name: &str,
    params: &ProvisionedProductParameters,
    token: String,
) -> UpdateProvisionedProductInput {
    UpdateProvisionedProductInput {
        accept_language: params.accept_language.clone(),
        provisioned_product_name: name.to_string(),
        path_id: params.path_id.clone(),
        path_name: params.path_name.clone(),
        product_id: params.product_id.clone(),
        product_name: params.product_name.clone(),
        provisioning_artifact_id: params.provisioning_artifact_id.clone(),
        provisioning_artifact_name: params.provisioning_artifact_name.clone(),
        parameters: params.provisioning_parameters.clone(),
        update_token: token,
    }
}
