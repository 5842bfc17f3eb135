//! # ProviderConfig
//!
//! Credentials, region and partition shared by managed resources.
//!
//! ```yaml
//! apiVersion: aws.microscaler.io/v1beta1
//! kind: ProviderConfig
//! metadata:
//!   name: default
//! spec:
//!   region: eu-west-1
//!   credentials:
//!     source: Secret
//!     secretRef:
//!       namespace: crossplane-system
//!       name: aws-creds
//!       key: credentials
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::SecretKeySelector;

#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    kind = "ProviderConfig",
    group = "aws.microscaler.io",
    version = "v1beta1",
    shortname = "awspc",
    printcolumn = r#"{"name":"Source", "type":"string", "jsonPath":".spec.credentials.source"}, {"name":"Region", "type":"string", "jsonPath":".spec.region"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    pub credentials: ProviderCredentials,
    /// Default region for resources that do not carry their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// AWS partition (aws, aws-cn, aws-us-gov, aws-iso, aws-iso-b). Defaults to `aws`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Endpoint override, e.g. for LocalStack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Roles assumed in order after the base credentials are loaded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assume_role_chain: Vec<AssumeRoleOptions>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    pub source: CredentialsSource,
    /// Secret holding a shared credentials file. Required for `Secret`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretKeySelector>,
    /// Profile selected from the credentials file (case-insensitive). Defaults to `default`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum CredentialsSource {
    None,
    Secret,
    #[serde(alias = "IRSA")]
    ServiceAccount,
    PodIdentity,
    InjectedIdentity,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssumeRoleOptions {
    #[serde(rename = "roleARN")]
    pub role_arn: String,
    #[serde(rename = "externalID", default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_secret_source_with_role_chain() {
        let spec: ProviderConfigSpec = serde_json::from_value(serde_json::json!({
            "region": "eu-west-1",
            "credentials": {
                "source": "Secret",
                "secretRef": {"namespace": "ns", "name": "aws-creds", "key": "credentials"}
            },
            "assumeRoleChain": [{"roleARN": "arn:aws:iam::123456789012:role/a", "externalID": "x"}]
        }))
        .unwrap();

        assert_eq!(spec.credentials.source, CredentialsSource::Secret);
        assert_eq!(spec.assume_role_chain.len(), 1);
        assert_eq!(spec.assume_role_chain[0].external_id.as_deref(), Some("x"));
    }

    #[test]
    fn irsa_is_an_alias_for_service_account() {
        let source: CredentialsSource = serde_json::from_value(serde_json::json!("IRSA")).unwrap();
        assert_eq!(source, CredentialsSource::ServiceAccount);
    }
}
