//! Writes back to the Kubernetes API: spec and metadata, status, and the
//! connection secret.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{ObjectMeta, Patch, PatchParams, PostParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::debug;

use super::connection::contains_all;
use super::{ConnectionDetails, Managed};

const CONNECTION_SECRET_TYPE: &str = "connection.aws.microscaler.io/v1beta1";

#[async_trait]
pub trait ControlPlane<R: Managed>: Send + Sync {
    /// Persist metadata and spec. Returns the stored object.
    async fn update(&self, mr: &R) -> Result<R, kube::Error>;
    /// Merge `status` into the object's status.
    async fn patch_status(&self, mr: &R, status: serde_json::Value) -> Result<(), kube::Error>;
    /// Merge `details` into the object's connection secret, owned by the
    /// object. Returns whether the secret changed.
    async fn publish_connection_details(
        &self,
        mr: &R,
        details: &ConnectionDetails,
    ) -> Result<bool, kube::Error>;
}

#[derive(Clone)]
pub struct KubeControlPlane {
    client: Client,
    field_manager: String,
}

impl std::fmt::Debug for KubeControlPlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeControlPlane")
            .field("field_manager", &self.field_manager)
            .finish_non_exhaustive()
    }
}

impl KubeControlPlane {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }
}

fn to_secret_data(details: &ConnectionDetails) -> BTreeMap<String, ByteString> {
    details
        .iter()
        .map(|(k, v)| (k.clone(), ByteString(v.clone())))
        .collect()
}

#[async_trait]
impl<R: Managed> ControlPlane<R> for KubeControlPlane {
    async fn update(&self, mr: &R) -> Result<R, kube::Error> {
        let api: Api<R> = Api::all(self.client.clone());
        let params = PostParams {
            field_manager: Some(self.field_manager.clone()),
            ..PostParams::default()
        };
        api.replace(&mr.name_any(), &params, mr).await
    }

    async fn patch_status(&self, mr: &R, status: serde_json::Value) -> Result<(), kube::Error> {
        let api: Api<R> = Api::all(self.client.clone());
        api.patch_status(
            &mr.name_any(),
            &PatchParams::apply(&self.field_manager),
            &Patch::Merge(json!({ "status": status })),
        )
        .await?;
        Ok(())
    }

    async fn publish_connection_details(
        &self,
        mr: &R,
        details: &ConnectionDetails,
    ) -> Result<bool, kube::Error> {
        let Some(target) = mr.resource_spec().write_connection_secret_to_ref.as_ref() else {
            return Ok(false);
        };
        if details.is_empty() {
            return Ok(false);
        }

        let api: Api<Secret> = Api::namespaced(self.client.clone(), &target.namespace);
        match api.get_opt(&target.name).await? {
            None => {
                let secret = Secret {
                    metadata: ObjectMeta {
                        name: Some(target.name.clone()),
                        namespace: Some(target.namespace.clone()),
                        owner_references: mr.controller_owner_ref(&()).map(|o| vec![o]),
                        ..ObjectMeta::default()
                    },
                    data: Some(to_secret_data(details)),
                    type_: Some(CONNECTION_SECRET_TYPE.to_string()),
                    ..Secret::default()
                };
                let params = PostParams {
                    field_manager: Some(self.field_manager.clone()),
                    ..PostParams::default()
                };
                api.create(&params, &secret).await?;
                debug!(secret = %target.name, namespace = %target.namespace, "Created connection secret");
                Ok(true)
            }
            Some(existing) => {
                let current: ConnectionDetails = existing
                    .data
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(k, v)| (k, v.0))
                    .collect();
                if contains_all(&current, details) {
                    return Ok(false);
                }
                api.patch(
                    &target.name,
                    &PatchParams::apply(&self.field_manager),
                    &Patch::Merge(json!({ "data": to_secret_data(details) })),
                )
                .await?;
                debug!(secret = %target.name, namespace = %target.namespace, "Updated connection secret");
                Ok(true)
            }
        }
    }
}
