//! Envelope types shared by every managed kind.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Condition;

/// Fields every managed resource carries next to `forProvider`.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// ProviderConfig holding the credentials and region for this resource.
    /// Falls back to the provider's default ProviderConfig when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config_ref: Option<Reference>,
    /// What happens to the AWS resource when this object is deleted
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
    /// Actions the provider may take on the AWS resource
    #[serde(default = "default_management_policies")]
    pub management_policies: Vec<ManagementAction>,
    /// Secret that receives endpoints and generated credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_connection_secret_to_ref: Option<SecretReference>,
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self {
            provider_config_ref: None,
            deletion_policy: DeletionPolicy::default(),
            management_policies: default_management_policies(),
            write_connection_secret_to_ref: None,
        }
    }
}

impl ResourceSpec {
    /// Whether the management policies permit `action`. An empty list is
    /// treated like the default `["*"]`.
    pub fn allows(&self, action: ManagementAction) -> bool {
        self.management_policies.is_empty()
            || self
                .management_policies
                .iter()
                .any(|p| *p == ManagementAction::All || *p == action)
    }
}

fn default_management_policies() -> Vec<ManagementAction> {
    vec![ManagementAction::All]
}

/// Fields every managed resource carries next to `atProvider`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    /// Ready mirrors the AWS lifecycle, Synced mirrors the last reconciliation
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum DeletionPolicy {
    #[default]
    Delete,
    Orphan,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ManagementAction {
    Observe,
    Create,
    Update,
    Delete,
    LateInitialize,
    #[serde(rename = "*")]
    All,
}

/// Reference to another cluster-scoped object by name
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
}

/// Label selector used to pick a referenced object
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
    /// Only select objects controlled by the same owner as the selecting object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_controller_ref: Option<bool>,
}

/// Namespaced secret reference
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct SecretReference {
    pub name: String,
    pub namespace: String,
}

/// A single key of a namespaced secret
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct SecretKeySelector {
    pub name: String,
    pub namespace: String,
    pub key: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn management_policies_default_to_everything() {
        let spec: ResourceSpec = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(spec.management_policies, vec![ManagementAction::All]);
        assert_eq!(spec.deletion_policy, DeletionPolicy::Delete);
        assert!(spec.allows(ManagementAction::Delete));
    }

    #[test]
    fn observe_only_policy_forbids_mutation() {
        let spec: ResourceSpec = serde_json::from_value(serde_json::json!({
            "managementPolicies": ["Observe"],
            "deletionPolicy": "Orphan"
        }))
        .unwrap();
        assert!(spec.allows(ManagementAction::Observe));
        assert!(!spec.allows(ManagementAction::Create));
        assert!(!spec.allows(ManagementAction::LateInitialize));
        assert_eq!(spec.deletion_policy, DeletionPolicy::Orphan);
    }

    #[test]
    fn wildcard_serializes_as_star() {
        let json = serde_json::to_value(ManagementAction::All).unwrap();
        assert_eq!(json, serde_json::json!("*"));
    }
}
