//! # Replication Group
//!
//! Hand-written client for ElastiCache Redis replication groups.
//!
//! Shard layout, replica count, general modification and tags are changed
//! through separate AWS calls. Update applies only the first drifted class;
//! the next pass observes the result and moves on to the next one.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::STATUS_AVAILABLE;
use crate::aws::elasticache::{CacheCluster, ReplicationGroup as AwsReplicationGroup};
use crate::aws::{CredentialResolver, ElastiCacheGateway, SdkElastiCache};
use crate::crd::elasticache::ReplicationGroupStatus;
use crate::crd::{ReplicationGroup, Tag};
use crate::diff::replication_group::{self as diff, ReplicaChange, UpdateClass};
use crate::managed::connection::{endpoint_details, KEY_PASSWORD};
use crate::managed::{
    condition_for_status, managed_envelope, meta, ConnectionDetails, ExternalClient,
    ExternalCreation, ExternalObservation, ExternalUpdate, Managed, ReconcileError, SdkConnector,
};
use crate::reference::{targets, ReferenceError, Resolver};

const AUTH_TOKEN_BYTES: usize = 32;
const STATUS_DELETING: &str = "deleting";

const ERR_DESCRIBE: &str = "cannot describe replication group";
const ERR_DESCRIBE_MEMBER: &str = "cannot describe replication group member cluster";
const ERR_LIST_TAGS: &str = "cannot list replication group tags";
const ERR_CREATE: &str = "cannot create replication group";
const ERR_MODIFY: &str = "cannot modify replication group";
const ERR_MODIFY_SHARDS: &str = "cannot modify replication group shard configuration";
const ERR_INCREASE_REPLICAS: &str = "cannot increase replication group replica count";
const ERR_DECREASE_REPLICAS: &str = "cannot decrease replication group replica count";
const ERR_ADD_TAGS: &str = "cannot add replication group tags";
const ERR_REMOVE_TAGS: &str = "cannot remove replication group tags";
const ERR_DELETE: &str = "cannot delete replication group";

#[async_trait]
impl Managed for ReplicationGroup {
    managed_envelope!(ReplicationGroupStatus);

    fn region(&self) -> Option<&str> {
        self.spec.for_provider.region.as_deref()
    }

    fn tags_mut(&mut self) -> Option<&mut Vec<Tag>> {
        Some(&mut self.spec.for_provider.tags)
    }

    async fn resolve_references(&mut self, resolver: &Resolver<'_>) -> Result<bool, ReferenceError> {
        let p = &mut self.spec.for_provider;
        let mut changed = resolver
            .resolve_field(
                &targets::CACHE_SUBNET_GROUP,
                &mut p.cache_subnet_group_name,
                p.cache_subnet_group_name_ref.as_ref(),
                p.cache_subnet_group_name_selector.as_ref(),
            )
            .await?;
        changed |= resolver
            .resolve_list_field(
                &targets::SECURITY_GROUP,
                &mut p.security_group_ids,
                &p.security_group_id_refs,
                p.security_group_id_selector.as_ref(),
            )
            .await?;
        changed |= resolver
            .resolve_field(
                &targets::SNS_TOPIC,
                &mut p.notification_topic_arn,
                p.notification_topic_arn_ref.as_ref(),
                p.notification_topic_arn_selector.as_ref(),
            )
            .await?;
        Ok(changed)
    }
}

/// Connector building a [`ReplicationGroupClient`] over the SDK gateway.
pub fn connector(credentials: Arc<CredentialResolver>) -> SdkConnector<ReplicationGroup> {
    SdkConnector::new(credentials, |config| {
        Box::new(ReplicationGroupClient::new(Arc::new(SdkElastiCache::new(config))))
            as Box<dyn ExternalClient<ReplicationGroup>>
    })
}

/// Random AUTH token, URL-safe so it is accepted by ElastiCache as is.
pub fn generate_auth_token() -> String {
    let mut bytes = [0u8; AUTH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub struct ReplicationGroupClient {
    gateway: Arc<dyn ElastiCacheGateway>,
}

impl std::fmt::Debug for ReplicationGroupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationGroupClient").finish_non_exhaustive()
    }
}

/// Everything Observe and Update compare against
struct Observed {
    group: AwsReplicationGroup,
    clusters: Vec<CacheCluster>,
    tags: Option<BTreeMap<String, String>>,
}

impl Observed {
    fn available(&self) -> bool {
        self.group.status.as_deref() == Some(STATUS_AVAILABLE)
    }
}

impl ReplicationGroupClient {
    pub fn new(gateway: Arc<dyn ElastiCacheGateway>) -> Self {
        Self { gateway }
    }

    /// `Ok(None)` when the group does not exist.
    async fn describe(&self, id: &str) -> Result<Option<Observed>, ReconcileError> {
        let group = match self.gateway.describe_replication_group(id).await {
            Ok(group) => group,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(ReconcileError::aws(ERR_DESCRIBE)(e)),
        };

        let mut clusters = Vec::with_capacity(group.member_clusters.len());
        for cluster_id in &group.member_clusters {
            match self.gateway.describe_cache_cluster(cluster_id).await {
                Ok(cluster) => clusters.push(cluster),
                Err(e) if e.is_not_found() => {
                    debug!(cache_cluster = %cluster_id, "Member cluster not found");
                }
                Err(e) => return Err(ReconcileError::aws(ERR_DESCRIBE_MEMBER)(e)),
            }
        }

        let mut observed = Observed {
            group,
            clusters,
            tags: None,
        };
        // Tags can only be listed once the group is available
        if observed.available() {
            if let Some(arn) = observed.group.arn.as_deref() {
                observed.tags = Some(
                    self.gateway
                        .list_tags(arn)
                        .await
                        .map_err(ReconcileError::aws(ERR_LIST_TAGS))?,
                );
            }
        }
        Ok(Some(observed))
    }
}

#[async_trait]
impl ExternalClient<ReplicationGroup> for ReplicationGroupClient {
    async fn observe(
        &self,
        mr: &mut ReplicationGroup,
    ) -> Result<ExternalObservation, ReconcileError> {
        let id = meta::external_name_or_name(mr);
        let Some(observed) = self.describe(&id).await? else {
            return Ok(ExternalObservation::absent());
        };
        let group = &observed.group;

        let late_initialized =
            diff::late_initialize(&mut mr.spec.for_provider, group, observed.clusters.first());
        mr.status.get_or_insert_with(Default::default).at_provider =
            diff::generate_observation(group);
        mr.set_conditions([condition_for_status(group.status.as_deref(), None)]);

        let drift = diff::needs_update(
            &mr.spec.for_provider,
            group,
            &observed.clusters,
            observed.tags.as_ref(),
        );
        let endpoint = diff::connection_endpoint(group);
        let available = observed.available();

        Ok(ExternalObservation {
            resource_exists: true,
            // Modifications are rejected until the group is available again
            resource_up_to_date: !available || drift.is_up_to_date(),
            resource_late_initialized: late_initialized,
            pending: !available,
            connection_details: endpoint_details(
                endpoint.and_then(|e| e.address.as_deref()),
                endpoint.and_then(|e| e.port),
            ),
            diff: drift.describe(),
        })
    }

    async fn create(&self, mr: &mut ReplicationGroup) -> Result<ExternalCreation, ReconcileError> {
        let id = meta::external_name_or_name(mr);
        let params = &mr.spec.for_provider;
        let token = (params.auth_enabled == Some(true)).then(generate_auth_token);

        let input = diff::generate_create_input(&id, params, token.clone());
        match self.gateway.create_replication_group(input).await {
            Ok(()) => {}
            Err(e) if e.is_already_exists() => {
                debug!(replication_group = %id, "Replication group already exists");
                return Ok(ExternalCreation::default());
            }
            Err(e) => return Err(ReconcileError::aws(ERR_CREATE)(e)),
        }

        let mut connection_details = ConnectionDetails::new();
        if let Some(token) = token {
            connection_details.insert(KEY_PASSWORD.to_string(), token.into_bytes());
        }
        Ok(ExternalCreation { connection_details })
    }

    async fn update(&self, mr: &mut ReplicationGroup) -> Result<ExternalUpdate, ReconcileError> {
        let id = meta::external_name_or_name(mr);
        let Some(observed) = self.describe(&id).await? else {
            return Ok(ExternalUpdate::default());
        };
        let params = &mr.spec.for_provider;
        let group = &observed.group;
        let drift = diff::needs_update(params, group, &observed.clusters, observed.tags.as_ref());

        match drift.update_class() {
            Some(UpdateClass::ShardConfiguration) => {
                if let Some(input) = diff::generate_shard_configuration_input(&id, params, group) {
                    info!(
                        node_group_count = input.node_group_count,
                        retain = ?input.node_groups_to_retain,
                        "Modifying shard configuration"
                    );
                    self.gateway
                        .modify_replication_group_shard_configuration(input)
                        .await
                        .map_err(ReconcileError::aws(ERR_MODIFY_SHARDS))?;
                }
            }
            Some(UpdateClass::ReplicaCount) => {
                let desired = params.num_cache_clusters.unwrap_or_default();
                let change = diff::replica_count_change(desired, group.member_clusters.len())
                    .map_err(|msg| ReconcileError::InvalidSpec(msg.to_string()))?;
                match change {
                    ReplicaChange::Increase(n) => {
                        info!(new_replica_count = n, "Increasing replica count");
                        self.gateway
                            .increase_replica_count(diff::generate_replica_count_input(&id, n))
                            .await
                            .map_err(ReconcileError::aws(ERR_INCREASE_REPLICAS))?;
                    }
                    ReplicaChange::Decrease(n) => {
                        info!(new_replica_count = n, "Decreasing replica count");
                        self.gateway
                            .decrease_replica_count(diff::generate_replica_count_input(&id, n))
                            .await
                            .map_err(ReconcileError::aws(ERR_DECREASE_REPLICAS))?;
                    }
                }
            }
            Some(UpdateClass::GroupModification) => {
                info!(fields = ?drift.modified_fields, "Modifying replication group");
                let input = diff::generate_modify_input(&id, params, group, &observed.clusters);
                self.gateway
                    .modify_replication_group(input)
                    .await
                    .map_err(ReconcileError::aws(ERR_MODIFY))?;
            }
            Some(UpdateClass::Tags) => {
                let Some(arn) = group.arn.as_deref() else {
                    return Ok(ExternalUpdate::default());
                };
                if !drift.tags.add.is_empty() {
                    self.gateway
                        .add_tags(arn, &drift.tags.add)
                        .await
                        .map_err(ReconcileError::aws(ERR_ADD_TAGS))?;
                }
                if !drift.tags.remove.is_empty() {
                    self.gateway
                        .remove_tags(arn, &drift.tags.remove)
                        .await
                        .map_err(ReconcileError::aws(ERR_REMOVE_TAGS))?;
                }
            }
            None => {}
        }
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, mr: &mut ReplicationGroup) -> Result<(), ReconcileError> {
        let observed_status = mr
            .status
            .as_ref()
            .and_then(|s| s.at_provider.status.as_deref());
        if observed_status == Some(STATUS_DELETING) {
            return Ok(());
        }
        let id = meta::external_name_or_name(mr);
        match self.gateway.delete_replication_group(&id).await {
            Err(e) if !e.is_not_found() => Err(ReconcileError::aws(ERR_DELETE)(e)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_token_is_url_safe_and_random() {
        let a = generate_auth_token();
        let b = generate_auth_token();
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
