//! # Service Catalog gateway
//!
//! Provisioned product operations plus the CloudFormation lookup that maps a
//! provisioned product back to the parameters of its underlying stack.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_servicecatalog::primitives::DateTimeFormat;
use aws_sdk_servicecatalog::types as sdk;
use std::collections::BTreeMap;

use super::{observe_call, AwsError, ErrorKind};
use crate::crd::servicecatalog::ProvisioningParameter;

const SERVICE: &str = "servicecatalog";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionedProductDetail {
    pub id: Option<String>,
    pub name: Option<String>,
    pub arn: Option<String>,
    pub status: Option<String>,
    pub status_message: Option<String>,
    pub product_id: Option<String>,
    pub provisioning_artifact_id: Option<String>,
    pub last_record_id: Option<String>,
    pub last_provisioning_record_id: Option<String>,
    pub last_successful_provisioning_record_id: Option<String>,
    pub created_time: Option<String>,
    pub provisioned_product_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDetail {
    pub record_id: Option<String>,
    pub record_type: Option<String>,
    pub status: Option<String>,
    pub provisioned_product_name: Option<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningArtifact {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductView {
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub artifacts: Vec<ProvisioningArtifact>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordOutput {
    pub key: String,
    pub value: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionProductInput {
    pub accept_language: Option<String>,
    pub notification_arns: Vec<String>,
    pub path_id: Option<String>,
    pub path_name: Option<String>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub provisioning_artifact_id: Option<String>,
    pub provisioning_artifact_name: Option<String>,
    pub provisioned_product_name: String,
    pub parameters: Vec<ProvisioningParameter>,
    pub tags: BTreeMap<String, String>,
    pub provision_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateProvisionedProductInput {
    pub accept_language: Option<String>,
    pub provisioned_product_name: String,
    pub path_id: Option<String>,
    pub path_name: Option<String>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub provisioning_artifact_id: Option<String>,
    pub provisioning_artifact_name: Option<String>,
    pub parameters: Vec<ProvisioningParameter>,
    pub update_token: String,
}

#[async_trait]
pub trait ServiceCatalogGateway: Send + Sync {
    /// `NotFound` when no provisioned product has this name
    async fn describe_provisioned_product(
        &self,
        name: &str,
        accept_language: Option<&str>,
    ) -> Result<ProvisionedProductDetail, AwsError>;
    async fn describe_record(
        &self,
        record_id: &str,
        accept_language: Option<&str>,
    ) -> Result<RecordDetail, AwsError>;
    /// Look a product up by ID, or by name when no ID is given
    async fn describe_product(
        &self,
        product_id: Option<&str>,
        product_name: Option<&str>,
        accept_language: Option<&str>,
    ) -> Result<ProductView, AwsError>;
    async fn get_provisioned_product_outputs(
        &self,
        provisioned_product_id: &str,
        accept_language: Option<&str>,
    ) -> Result<Vec<RecordOutput>, AwsError>;
    async fn provision_product(&self, input: ProvisionProductInput)
        -> Result<RecordDetail, AwsError>;
    async fn update_provisioned_product(
        &self,
        input: UpdateProvisionedProductInput,
    ) -> Result<RecordDetail, AwsError>;
    async fn terminate_provisioned_product(
        &self,
        name: &str,
        terminate_token: &str,
        accept_language: Option<&str>,
    ) -> Result<RecordDetail, AwsError>;
    /// Parameters of the CloudFormation stack behind a provisioned product
    async fn stack_parameters(&self, stack_arn: &str)
        -> Result<BTreeMap<String, String>, AwsError>;
}

/// [`ServiceCatalogGateway`] backed by the Service Catalog and CloudFormation SDK clients
#[derive(Debug, Clone)]
pub struct SdkServiceCatalog {
    catalog: aws_sdk_servicecatalog::Client,
    cloudformation: aws_sdk_cloudformation::Client,
}

impl SdkServiceCatalog {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            catalog: aws_sdk_servicecatalog::Client::new(config),
            cloudformation: aws_sdk_cloudformation::Client::new(config),
        }
    }
}

fn record_detail(record: Option<&sdk::RecordDetail>) -> RecordDetail {
    record.map_or_else(RecordDetail::default, |r| RecordDetail {
        record_id: r.record_id().map(str::to_string),
        record_type: r.record_type().map(str::to_string),
        status: r.status().map(|s| s.as_str().to_string()),
        provisioned_product_name: r.provisioned_product_name().map(str::to_string),
        errors: r
            .record_errors()
            .iter()
            .filter_map(|e| e.description().map(str::to_string))
            .collect(),
    })
}

fn sdk_parameters(parameters: &[ProvisioningParameter]) -> Option<Vec<sdk::ProvisioningParameter>> {
    (!parameters.is_empty()).then(|| {
        parameters
            .iter()
            .map(|p| {
                sdk::ProvisioningParameter::builder()
                    .key(&p.key)
                    .value(&p.value)
                    .build()
            })
            .collect()
    })
}

#[async_trait]
impl ServiceCatalogGateway for SdkServiceCatalog {
    async fn describe_provisioned_product(
        &self,
        name: &str,
        accept_language: Option<&str>,
    ) -> Result<ProvisionedProductDetail, AwsError> {
        let output = observe_call(
            SERVICE,
            "DescribeProvisionedProduct",
            self.catalog
                .describe_provisioned_product()
                .name(name)
                .set_accept_language(accept_language.map(str::to_string))
                .send()
                .await,
        )?;
        let detail = output
            .provisioned_product_detail()
            .ok_or_else(|| AwsError::not_found(format!("provisioned product {name} not found")))?;
        Ok(ProvisionedProductDetail {
            id: detail.id().map(str::to_string),
            name: detail.name().map(str::to_string),
            arn: detail.arn().map(str::to_string),
            status: detail.status().map(|s| s.as_str().to_string()),
            status_message: detail.status_message().map(str::to_string),
            product_id: detail.product_id().map(str::to_string),
            provisioning_artifact_id: detail.provisioning_artifact_id().map(str::to_string),
            last_record_id: detail.last_record_id().map(str::to_string),
            last_provisioning_record_id: detail.last_provisioning_record_id().map(str::to_string),
            last_successful_provisioning_record_id: detail
                .last_successful_provisioning_record_id()
                .map(str::to_string),
            created_time: detail
                .created_time()
                .and_then(|t| t.fmt(DateTimeFormat::DateTime).ok()),
            provisioned_product_type: detail.r#type().map(str::to_string),
        })
    }

    async fn describe_record(
        &self,
        record_id: &str,
        accept_language: Option<&str>,
    ) -> Result<RecordDetail, AwsError> {
        let output = observe_call(
            SERVICE,
            "DescribeRecord",
            self.catalog
                .describe_record()
                .id(record_id)
                .set_accept_language(accept_language.map(str::to_string))
                .send()
                .await,
        )?;
        Ok(record_detail(output.record_detail()))
    }

    async fn describe_product(
        &self,
        product_id: Option<&str>,
        product_name: Option<&str>,
        accept_language: Option<&str>,
    ) -> Result<ProductView, AwsError> {
        let request = self
            .catalog
            .describe_product()
            .set_accept_language(accept_language.map(str::to_string));
        let request = match (product_id, product_name) {
            (Some(id), _) => request.id(id),
            (None, Some(name)) => request.name(name),
            (None, None) => {
                return Err(AwsError::new(
                    ErrorKind::InvalidParameter,
                    None,
                    "one of productId or productName is required",
                ))
            }
        };
        let output = observe_call(SERVICE, "DescribeProduct", request.send().await)?;
        let summary = output.product_view_summary();
        Ok(ProductView {
            product_id: summary.and_then(|s| s.product_id()).map(str::to_string),
            name: summary.and_then(|s| s.name()).map(str::to_string),
            artifacts: output
                .provisioning_artifacts()
                .iter()
                .map(|a| ProvisioningArtifact {
                    id: a.id().map(str::to_string),
                    name: a.name().map(str::to_string),
                })
                .collect(),
        })
    }

    async fn get_provisioned_product_outputs(
        &self,
        provisioned_product_id: &str,
        accept_language: Option<&str>,
    ) -> Result<Vec<RecordOutput>, AwsError> {
        let output = observe_call(
            SERVICE,
            "GetProvisionedProductOutputs",
            self.catalog
                .get_provisioned_product_outputs()
                .provisioned_product_id(provisioned_product_id)
                .set_accept_language(accept_language.map(str::to_string))
                .send()
                .await,
        )?;
        Ok(output
            .outputs()
            .iter()
            .filter_map(|o| {
                Some(RecordOutput {
                    key: o.output_key()?.to_string(),
                    value: o.output_value().map(str::to_string),
                    description: o.description().map(str::to_string),
                })
            })
            .collect())
    }

    async fn provision_product(
        &self,
        input: ProvisionProductInput,
    ) -> Result<RecordDetail, AwsError> {
        let tags = input
            .tags
            .iter()
            .map(|(k, v)| {
                sdk::Tag::builder().key(k).value(v).build().map_err(|e| {
                    AwsError::new(ErrorKind::InvalidParameter, None, e.to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let output = observe_call(
            SERVICE,
            "ProvisionProduct",
            self.catalog
                .provision_product()
                .set_accept_language(input.accept_language)
                .set_notification_arns(
                    (!input.notification_arns.is_empty()).then_some(input.notification_arns),
                )
                .set_path_id(input.path_id)
                .set_path_name(input.path_name)
                .set_product_id(input.product_id)
                .set_product_name(input.product_name)
                .set_provisioning_artifact_id(input.provisioning_artifact_id)
                .set_provisioning_artifact_name(input.provisioning_artifact_name)
                .provisioned_product_name(input.provisioned_product_name)
                .set_provisioning_parameters(sdk_parameters(&input.parameters))
                .set_tags((!tags.is_empty()).then_some(tags))
                .provision_token(input.provision_token)
                .send()
                .await,
        )?;
        Ok(record_detail(output.record_detail()))
    }

    async fn update_provisioned_product(
        &self,
        input: UpdateProvisionedProductInput,
    ) -> Result<RecordDetail, AwsError> {
        let parameters = (!input.parameters.is_empty()).then(|| {
            input
                .parameters
                .iter()
                .map(|p| {
                    sdk::UpdateProvisioningParameter::builder()
                        .key(&p.key)
                        .value(&p.value)
                        .use_previous_value(false)
                        .build()
                })
                .collect()
        });
        let output = observe_call(
            SERVICE,
            "UpdateProvisionedProduct",
            self.catalog
                .update_provisioned_product()
                .set_accept_language(input.accept_language)
                .provisioned_product_name(input.provisioned_product_name)
                .set_path_id(input.path_id)
                .set_path_name(input.path_name)
                .set_product_id(input.product_id)
                .set_product_name(input.product_name)
                .set_provisioning_artifact_id(input.provisioning_artifact_id)
                .set_provisioning_artifact_name(input.provisioning_artifact_name)
                .set_provisioning_parameters(parameters)
                .update_token(input.update_token)
                .send()
                .await,
        )?;
        Ok(record_detail(output.record_detail()))
    }

    async fn terminate_provisioned_product(
        &self,
        name: &str,
        terminate_token: &str,
        accept_language: Option<&str>,
    ) -> Result<RecordDetail, AwsError> {
        let output = observe_call(
            SERVICE,
            "TerminateProvisionedProduct",
            self.catalog
                .terminate_provisioned_product()
                .provisioned_product_name(name)
                .terminate_token(terminate_token)
                .set_accept_language(accept_language.map(str::to_string))
                .send()
                .await,
        )?;
        Ok(record_detail(output.record_detail()))
    }

    async fn stack_parameters(
        &self,
        stack_arn: &str,
    ) -> Result<BTreeMap<String, String>, AwsError> {
        let output = observe_call(
            "cloudformation",
            "DescribeStacks",
            self.cloudformation
                .describe_stacks()
                .stack_name(stack_arn)
                .send()
                .await,
        )?;
        let stack = output
            .stacks()
            .first()
            .ok_or_else(|| AwsError::not_found(format!("stack {stack_arn} not found")))?;
        Ok(stack
            .parameters()
            .iter()
            .filter_map(|p| {
                Some((
                    p.parameter_key()?.to_string(),
                    p.parameter_value().unwrap_or_default().to_string(),
                ))
            })
            .collect())
    }
}
