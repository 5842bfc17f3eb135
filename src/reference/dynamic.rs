//! [`ReferenceReader`] over the Kubernetes API using untyped objects, so any
//! managed kind can be referenced without compiling its types in.

use async_trait::async_trait;
use kube::api::{ApiResource, DynamicObject, ListParams};
use kube::core::GroupVersionKind;
use kube::{Api, Client};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{Candidate, Extractor, ReferenceError, ReferenceReader, Target};
use crate::constants::ANNOTATION_EXTERNAL_NAME;
use crate::crd::CONDITION_READY;

#[derive(Clone)]
pub struct KubeReferenceReader {
    client: Client,
}

impl std::fmt::Debug for KubeReferenceReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeReferenceReader").finish_non_exhaustive()
    }
}

impl KubeReferenceReader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, target: &Target) -> Api<DynamicObject> {
        let ar = ApiResource::from_gvk(&GroupVersionKind {
            group: target.group.to_string(),
            version: target.version.to_string(),
            kind: target.kind.to_string(),
        });
        Api::all_with(self.client.clone(), &ar)
    }
}

fn is_ready(obj: &DynamicObject) -> bool {
    obj.data
        .pointer("/status/conditions")
        .and_then(Value::as_array)
        .is_some_and(|conditions| {
            conditions.iter().any(|c| {
                c.get("type").and_then(Value::as_str) == Some(CONDITION_READY)
                    && c.get("status").and_then(Value::as_str) == Some("True")
            })
        })
}

fn extract(obj: &DynamicObject, extractor: Extractor) -> Option<String> {
    match extractor {
        Extractor::ExternalName => obj
            .metadata
            .annotations
            .as_ref()?
            .get(ANNOTATION_EXTERNAL_NAME)
            .cloned(),
        Extractor::AtProviderField(path) => {
            let pointer = format!("/status/atProvider/{}", path.replace('.', "/"));
            match obj.data.pointer(&pointer)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        }
    }
}

pub(super) fn candidate(obj: &DynamicObject, extractor: Extractor) -> Candidate {
    Candidate {
        name: obj.metadata.name.clone().unwrap_or_default(),
        ready: is_ready(obj),
        value: extract(obj, extractor),
        controller_uid: obj
            .metadata
            .owner_references
            .as_ref()
            .and_then(|refs| refs.iter().find(|r| r.controller == Some(true)))
            .map(|r| r.uid.clone()),
    }
}

#[async_trait]
impl ReferenceReader for KubeReferenceReader {
    async fn get(&self, target: &Target, name: &str) -> Result<Option<Candidate>, ReferenceError> {
        let obj = self
            .api(target)
            .get_opt(name)
            .await
            .map_err(|source| ReferenceError::Kube {
                kind: target.kind,
                source,
            })?;
        Ok(obj.map(|o| candidate(&o, target.extractor)))
    }

    async fn list(
        &self,
        target: &Target,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<Candidate>, ReferenceError> {
        let selector = labels
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        let mut params = ListParams::default();
        if !selector.is_empty() {
            params = params.labels(&selector);
        }
        let list = self
            .api(target)
            .list(&params)
            .await
            .map_err(|source| ReferenceError::Kube {
                kind: target.kind,
                source,
            })?;
        Ok(list
            .items
            .iter()
            .map(|o| candidate(o, target.extractor))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> DynamicObject {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn reads_ready_and_external_name() {
        let obj = object(json!({
            "apiVersion": "elasticache.aws.microscaler.io/v1beta1",
            "kind": "CacheSubnetGroup",
            "metadata": {
                "name": "private",
                "annotations": {"aws.microscaler.io/external-name": "private-csg"},
                "ownerReferences": [{
                    "apiVersion": "v1", "kind": "X", "name": "owner",
                    "uid": "uid-1", "controller": true
                }]
            },
            "status": {"conditions": [{"type": "Ready", "status": "True"}]}
        }));
        let c = candidate(&obj, Extractor::ExternalName);
        assert_eq!(c.name, "private");
        assert!(c.ready);
        assert_eq!(c.value.as_deref(), Some("private-csg"));
        assert_eq!(c.controller_uid.as_deref(), Some("uid-1"));
    }

    #[test]
    fn reads_at_provider_field() {
        let obj = object(json!({
            "apiVersion": "sns.aws.microscaler.io/v1beta1",
            "kind": "Topic",
            "metadata": {"name": "alerts"},
            "status": {
                "atProvider": {"arn": "arn:aws:sns:eu-west-1:123:alerts"},
                "conditions": [{"type": "Ready", "status": "False"}]
            }
        }));
        let c = candidate(&obj, Extractor::AtProviderField("arn"));
        assert!(!c.ready);
        assert_eq!(c.value.as_deref(), Some("arn:aws:sns:eu-west-1:123:alerts"));
    }
}
