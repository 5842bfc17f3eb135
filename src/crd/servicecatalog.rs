//! # Service Catalog kinds

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ResourceSpec, ResourceStatus, Tag};

/// A provisioned Service Catalog product. Its real state lives in the
/// CloudFormation stack the product launches.
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    kind = "ProvisionedProduct",
    group = "servicecatalog.aws.microscaler.io",
    version = "v1alpha1",
    status = "ProvisionedProductStatus",
    shortname = "pp",
    category = "managed",
    category = "aws",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}, {"name":"Status", "type":"string", "jsonPath":".status.atProvider.status"}, {"name":"External-Name", "type":"string", "jsonPath":".metadata.annotations.aws\\.microscaler\\.io/external-name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedProductSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: ProvisionedProductParameters,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedProductParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// `en`, `jp` or `zh`. Defaults to `en`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_language: Option<String>,
    #[serde(
        rename = "notificationARNs",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub notification_arns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_name: Option<String>,
    /// Product by ID; takes precedence over `productName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    /// Artifact (version) by ID; takes precedence over `provisioningArtifactName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_artifact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_artifact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provisioning_parameters: Vec<ProvisioningParameter>,
    /// Applied at provisioning time only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ProvisioningParameter {
    pub key: String,
    pub value: String,
}

impl ProvisioningParameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedProductStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,
    #[serde(default)]
    pub at_provider: ProvisionedProductObservation,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedProductObservation {
    #[serde(rename = "arn", default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(
        rename = "cloudformationStackARN",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cloudformation_stack_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_provisioning_artifact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_provisioning_record_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_successful_provisioning_record_id: Option<String>,
    /// Record type of the last provisioning record (PROVISION_PRODUCT, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_record_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_product_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}
