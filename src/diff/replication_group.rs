//! Replication group late initialization, drift classification and request
//! generation.
//!
//! AWS exposes disjoint endpoints for shard layout, replica count, general
//! modification and tags, so drift is classified and only the first class in
//! [`UpdateClass`] order is applied per pass.

use std::collections::BTreeMap;

use super::tags::{diff_tags, tag_map, TagDiff};
use super::{engine_version_matches, late_init, late_init_string, late_init_vec, string_set_equal, window_equal};
use crate::aws::elasticache::{
    CacheCluster, CreateReplicationGroupInput, Endpoint, ModifyReplicationGroupInput,
    ModifyShardConfigurationInput, NodeGroupConfiguration, ReplicaCountInput, ReplicationGroup,
};
use crate::crd::elasticache::{
    Endpoint as EndpointObservation, NodeGroupMemberObservation, NodeGroupObservation,
    PendingModifiedValues, ReplicationGroupObservation, ReplicationGroupParameters,
};

pub const DEFAULT_ENGINE: &str = "redis";

/// Replica counts AWS accepts per node group, including the primary
const MIN_CACHE_CLUSTERS: i32 = 1;
const MAX_CACHE_CLUSTERS: i32 = 6;

pub const ERR_MIN_REPLICAS: &str = "at least 1 replica is required";
pub const ERR_MAX_REPLICAS: &str = "maximum of 5 replicas are allowed";

/// Update classes in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateClass {
    ShardConfiguration,
    ReplicaCount,
    GroupModification,
    Tags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationGroupDiff {
    pub shard_configuration: bool,
    pub replica_count: bool,
    /// Fields that need ModifyReplicationGroup, by their spec name
    pub modified_fields: Vec<&'static str>,
    pub tags: TagDiff,
}

impl ReplicationGroupDiff {
    /// The class the next update must apply, if any.
    pub fn update_class(&self) -> Option<UpdateClass> {
        if self.shard_configuration {
            Some(UpdateClass::ShardConfiguration)
        } else if self.replica_count {
            Some(UpdateClass::ReplicaCount)
        } else if !self.modified_fields.is_empty() {
            Some(UpdateClass::GroupModification)
        } else if !self.tags.is_empty() {
            Some(UpdateClass::Tags)
        } else {
            None
        }
    }

    pub fn is_up_to_date(&self) -> bool {
        self.update_class().is_none()
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.shard_configuration {
            parts.push("numNodeGroups".to_string());
        }
        if self.replica_count {
            parts.push("numCacheClusters".to_string());
        }
        parts.extend(self.modified_fields.iter().map(|f| (*f).to_string()));
        if !self.tags.is_empty() {
            parts.push("tags".to_string());
        }
        parts.join(", ")
    }
}

/// `enabled`/`enabling` are on, `disabled`/`disabling` are off.
pub fn automatic_failover_enabled(status: Option<&str>) -> Option<bool> {
    match status? {
        "enabled" | "enabling" => Some(true),
        "disabled" | "disabling" => Some(false),
        _ => None,
    }
}

fn multi_az_enabled(status: Option<&str>) -> Option<bool> {
    match status? {
        "enabled" => Some(true),
        "disabled" => Some(false),
        _ => None,
    }
}

/// Fill unset parameters from the group and its first member cluster.
pub fn late_initialize(
    params: &mut ReplicationGroupParameters,
    rg: &ReplicationGroup,
    cluster: Option<&CacheCluster>,
) -> bool {
    let mut changed = false;
    changed |= late_init(&mut params.at_rest_encryption_enabled, rg.at_rest_encryption_enabled);
    changed |= late_init(&mut params.auth_enabled, rg.auth_token_enabled);
    changed |= late_init(
        &mut params.automatic_failover_enabled,
        automatic_failover_enabled(rg.automatic_failover.as_deref()),
    );
    changed |= late_init(&mut params.auto_minor_version_upgrade, rg.auto_minor_version_upgrade);
    changed |= late_init_string(&mut params.cache_node_type, rg.cache_node_type.as_deref());
    changed |= late_init(&mut params.kms_key_id, rg.kms_key_id.clone());
    changed |= late_init(
        &mut params.multi_az_enabled,
        multi_az_enabled(rg.multi_az.as_deref()),
    );
    changed |= late_init(&mut params.snapshot_retention_limit, rg.snapshot_retention_limit);
    changed |= late_init(&mut params.snapshot_window, rg.snapshot_window.clone());
    changed |= late_init(&mut params.snapshotting_cluster_id, rg.snapshotting_cluster_id.clone());
    changed |= late_init(&mut params.transit_encryption_enabled, rg.transit_encryption_enabled);
    changed |= late_init_string(
        &mut params.replication_group_description,
        rg.description.as_deref(),
    );

    if let Some(cc) = cluster {
        changed |= late_init(&mut params.engine, cc.engine.clone());
        changed |= late_init(&mut params.engine_version, cc.engine_version.clone());
        changed |= late_init(
            &mut params.cache_parameter_group_name,
            cc.cache_parameter_group_name.clone(),
        );
        changed |= late_init(&mut params.cache_subnet_group_name, cc.cache_subnet_group_name.clone());
        changed |= late_init(&mut params.notification_topic_arn, cc.notification_topic_arn.clone());
        changed |= late_init(
            &mut params.preferred_maintenance_window,
            cc.preferred_maintenance_window.clone(),
        );
        changed |= late_init_vec(&mut params.security_group_ids, &cc.security_group_ids);
        changed |= late_init_vec(
            &mut params.cache_security_group_names,
            &cc.cache_security_group_names,
        );
    }
    changed
}

/// Shard count differs from the observed node groups.
pub fn shard_configuration_needs_update(
    params: &ReplicationGroupParameters,
    rg: &ReplicationGroup,
) -> bool {
    params
        .num_node_groups
        .is_some_and(|n| usize::try_from(n).ok() != Some(rg.node_groups.len()))
}

/// Primary plus replicas differs from the observed member clusters.
/// Cluster-mode groups size replicas per node group instead.
pub fn replica_count_needs_update(
    params: &ReplicationGroupParameters,
    rg: &ReplicationGroup,
) -> bool {
    rg.cluster_enabled != Some(true)
        && params
            .num_cache_clusters
            .is_some_and(|n| usize::try_from(n).ok() != Some(rg.member_clusters.len()))
}

fn engine_version_drifted(params: &ReplicationGroupParameters, clusters: &[CacheCluster]) -> bool {
    params.engine_version.as_deref().is_some_and(|desired| {
        clusters.iter().any(|cc| {
            cc.engine_version
                .as_deref()
                .is_some_and(|observed| !engine_version_matches(desired, observed))
        })
    })
}

fn cache_node_type_drifted(params: &ReplicationGroupParameters, rg: &ReplicationGroup) -> bool {
    !params.cache_node_type.is_empty()
        && rg.cache_node_type.as_deref() != Some(params.cache_node_type.as_str())
}

/// Fields that only ModifyReplicationGroup can change.
pub fn modified_fields(
    params: &ReplicationGroupParameters,
    rg: &ReplicationGroup,
    clusters: &[CacheCluster],
) -> Vec<&'static str> {
    let mut fields = Vec::new();

    if let Some(desired) = params.automatic_failover_enabled {
        if automatic_failover_enabled(rg.automatic_failover.as_deref())
            .is_some_and(|observed| observed != desired)
        {
            fields.push("automaticFailoverEnabled");
        }
    }
    if let (Some(desired), Some(observed)) =
        (params.auto_minor_version_upgrade, rg.auto_minor_version_upgrade)
    {
        if desired != observed {
            fields.push("autoMinorVersionUpgrade");
        }
    }
    if cache_node_type_drifted(params, rg) {
        fields.push("cacheNodeType");
    }
    if let Some(desired) = params.multi_az_enabled {
        if multi_az_enabled(rg.multi_az.as_deref()).unwrap_or(false) != desired {
            fields.push("multiAZEnabled");
        }
    }
    if !params.replication_group_description.is_empty()
        && rg.description.as_deref() != Some(params.replication_group_description.as_str())
    {
        fields.push("replicationGroupDescription");
    }
    if params
        .snapshot_retention_limit
        .is_some_and(|desired| desired != rg.snapshot_retention_limit.unwrap_or(0))
    {
        fields.push("snapshotRetentionLimit");
    }
    if params
        .snapshot_window
        .as_deref()
        .is_some_and(|desired| !window_equal(desired, rg.snapshot_window.as_deref()))
    {
        fields.push("snapshotWindow");
    }
    if params.snapshotting_cluster_id.is_some()
        && params.snapshotting_cluster_id != rg.snapshotting_cluster_id
    {
        fields.push("snapshottingClusterId");
    }

    if engine_version_drifted(params, clusters) {
        fields.push("engineVersion");
    }
    for cc in clusters {
        if params.cache_parameter_group_name.is_some()
            && params.cache_parameter_group_name != cc.cache_parameter_group_name
        {
            fields.push("cacheParameterGroupName");
        }
        if params.notification_topic_arn.is_some()
            && params.notification_topic_arn != cc.notification_topic_arn
        {
            fields.push("notificationTopicARN");
        }
        if params
            .preferred_maintenance_window
            .as_deref()
            .is_some_and(|desired| !window_equal(desired, cc.preferred_maintenance_window.as_deref()))
        {
            fields.push("preferredMaintenanceWindow");
        }
        if !params.security_group_ids.is_empty()
            && !string_set_equal(&params.security_group_ids, &cc.security_group_ids)
        {
            fields.push("securityGroupIds");
        }
        if !params.cache_security_group_names.is_empty()
            && !string_set_equal(
                &params.cache_security_group_names,
                &cc.cache_security_group_names,
            )
        {
            fields.push("cacheSecurityGroupNames");
        }
    }

    let mut seen = std::collections::BTreeSet::new();
    fields.retain(|f| seen.insert(*f));
    fields
}

/// Classify all drift between the desired parameters and AWS.
///
/// `observed_tags` is `None` when tags were not listed, which happens while
/// the group is not yet available.
pub fn needs_update(
    params: &ReplicationGroupParameters,
    rg: &ReplicationGroup,
    clusters: &[CacheCluster],
    observed_tags: Option<&BTreeMap<String, String>>,
) -> ReplicationGroupDiff {
    ReplicationGroupDiff {
        shard_configuration: shard_configuration_needs_update(params, rg),
        replica_count: replica_count_needs_update(params, rg),
        modified_fields: modified_fields(params, rg, clusters),
        tags: observed_tags
            .map(|observed| diff_tags(&tag_map(&params.tags), observed))
            .unwrap_or_default(),
    }
}

/// Endpoint clients should use: the configuration endpoint in cluster mode,
/// otherwise the primary endpoint of the first node group.
pub fn connection_endpoint(rg: &ReplicationGroup) -> Option<&Endpoint> {
    if rg.cluster_enabled == Some(true) {
        rg.configuration_endpoint.as_ref()
    } else {
        rg.node_groups.first()?.primary_endpoint.as_ref()
    }
}

fn endpoint_observation(e: &Endpoint) -> EndpointObservation {
    EndpointObservation {
        address: e.address.clone(),
        port: e.port,
    }
}

pub fn generate_observation(rg: &ReplicationGroup) -> ReplicationGroupObservation {
    ReplicationGroupObservation {
        arn: rg.arn.clone(),
        automatic_failover_status: rg.automatic_failover.clone(),
        cluster_enabled: rg.cluster_enabled,
        configuration_endpoint: rg.configuration_endpoint.as_ref().map(endpoint_observation),
        member_clusters: rg.member_clusters.clone(),
        multi_az: rg.multi_az.clone(),
        node_groups: rg
            .node_groups
            .iter()
            .map(|ng| NodeGroupObservation {
                node_group_id: ng.node_group_id.clone(),
                node_group_members: ng
                    .members
                    .iter()
                    .map(|m| NodeGroupMemberObservation {
                        cache_cluster_id: m.cache_cluster_id.clone(),
                        cache_node_id: m.cache_node_id.clone(),
                        current_role: m.current_role.clone(),
                        preferred_availability_zone: m.preferred_availability_zone.clone(),
                        read_endpoint: m.read_endpoint.as_ref().map(endpoint_observation),
                    })
                    .collect(),
                primary_endpoint: ng.primary_endpoint.as_ref().map(endpoint_observation),
                reader_endpoint: ng.reader_endpoint.as_ref().map(endpoint_observation),
                slots: ng.slots.clone(),
                status: ng.status.clone(),
            })
            .collect(),
        pending_modified_values: rg.pending_modified_values.as_ref().map(|p| {
            PendingModifiedValues {
                automatic_failover_status: p.automatic_failover_status.clone(),
                primary_cluster_id: p.primary_cluster_id.clone(),
            }
        }),
        status: rg.status.clone(),
    }
}

pub fn generate_create_input(
    id: &str,
    params: &ReplicationGroupParameters,
    auth_token: Option<String>,
) -> CreateReplicationGroupInput {
    CreateReplicationGroupInput {
        replication_group_id: id.to_string(),
        description: params.replication_group_description.clone(),
        at_rest_encryption_enabled: params.at_rest_encryption_enabled,
        auth_token,
        automatic_failover_enabled: params.automatic_failover_enabled,
        auto_minor_version_upgrade: params.auto_minor_version_upgrade,
        cache_node_type: (!params.cache_node_type.is_empty()).then(|| params.cache_node_type.clone()),
        cache_parameter_group_name: params.cache_parameter_group_name.clone(),
        cache_security_group_names: params.cache_security_group_names.clone(),
        cache_subnet_group_name: params.cache_subnet_group_name.clone(),
        engine: Some(
            params
                .engine
                .clone()
                .unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
        ),
        engine_version: params.engine_version.clone(),
        kms_key_id: params.kms_key_id.clone(),
        multi_az_enabled: params.multi_az_enabled,
        node_group_configuration: params
            .node_group_configuration
            .iter()
            .map(|ng| NodeGroupConfiguration {
                node_group_id: ng.node_group_id.clone(),
                primary_availability_zone: ng.primary_availability_zone.clone(),
                replica_availability_zones: ng.replica_availability_zones.clone(),
                replica_count: ng.replica_count,
                slots: ng.slots.clone(),
            })
            .collect(),
        notification_topic_arn: params.notification_topic_arn.clone(),
        num_cache_clusters: params.num_cache_clusters,
        num_node_groups: params.num_node_groups,
        port: params.port,
        preferred_cache_cluster_azs: params.preferred_cache_cluster_azs.clone(),
        preferred_maintenance_window: params.preferred_maintenance_window.clone(),
        primary_cluster_id: params.primary_cluster_id.clone(),
        replicas_per_node_group: params.replicas_per_node_group,
        security_group_ids: params.security_group_ids.clone(),
        snapshot_arns: params.snapshot_arns.clone(),
        snapshot_name: params.snapshot_name.clone(),
        snapshot_retention_limit: params.snapshot_retention_limit,
        snapshot_window: params.snapshot_window.clone(),
        tags: tag_map(&params.tags),
        transit_encryption_enabled: params.transit_encryption_enabled,
    }
}

/// Node type and engine version are only sent when they drifted: AWS rejects
/// a "change" to the current node type and patterns such as `6.x` are not
/// valid modification targets once a concrete version runs.
pub fn generate_modify_input(
    id: &str,
    params: &ReplicationGroupParameters,
    rg: &ReplicationGroup,
    clusters: &[CacheCluster],
) -> ModifyReplicationGroupInput {
    ModifyReplicationGroupInput {
        replication_group_id: id.to_string(),
        apply_immediately: params.apply_immediately,
        automatic_failover_enabled: params.automatic_failover_enabled,
        auto_minor_version_upgrade: params.auto_minor_version_upgrade,
        cache_node_type: cache_node_type_drifted(params, rg).then(|| params.cache_node_type.clone()),
        cache_parameter_group_name: params.cache_parameter_group_name.clone(),
        cache_security_group_names: params.cache_security_group_names.clone(),
        description: (!params.replication_group_description.is_empty())
            .then(|| params.replication_group_description.clone()),
        engine_version: if engine_version_drifted(params, clusters) {
            params.engine_version.clone()
        } else {
            None
        },
        multi_az_enabled: params.multi_az_enabled,
        notification_topic_arn: params.notification_topic_arn.clone(),
        notification_topic_status: params.notification_topic_status.clone(),
        preferred_maintenance_window: params.preferred_maintenance_window.clone(),
        primary_cluster_id: params.primary_cluster_id.clone(),
        security_group_ids: params.security_group_ids.clone(),
        snapshot_retention_limit: params.snapshot_retention_limit,
        snapshot_window: params.snapshot_window.clone(),
        snapshotting_cluster_id: params.snapshotting_cluster_id.clone(),
    }
}

/// Resize the group to `numNodeGroups` shards. When shrinking, the shards
/// listed in `nodeGroupsToRetain` are kept, or else the first observed ones.
pub fn generate_shard_configuration_input(
    id: &str,
    params: &ReplicationGroupParameters,
    rg: &ReplicationGroup,
) -> Option<ModifyShardConfigurationInput> {
    let count = params.num_node_groups?;
    let observed: Vec<String> = rg
        .node_groups
        .iter()
        .filter_map(|ng| ng.node_group_id.clone())
        .collect();
    let shrinking = usize::try_from(count).is_ok_and(|c| c < observed.len());

    let node_groups_to_retain = match (shrinking, params.node_groups_to_retain.is_empty()) {
        (false, _) => Vec::new(),
        (true, false) => params.node_groups_to_retain.clone(),
        (true, true) => observed
            .iter()
            .take(usize::try_from(count).unwrap_or(0))
            .cloned()
            .collect(),
    };

    Some(ModifyShardConfigurationInput {
        replication_group_id: id.to_string(),
        node_group_count: count,
        apply_immediately: true,
        node_groups_to_retain,
        node_groups_to_remove: Vec::new(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaChange {
    Increase(i32),
    Decrease(i32),
}

/// Validate a desired cluster count and derive the replica call. The new
/// replica count excludes the primary.
pub fn replica_count_change(
    desired_clusters: i32,
    current_clusters: usize,
) -> Result<ReplicaChange, &'static str> {
    if desired_clusters < MIN_CACHE_CLUSTERS {
        return Err(ERR_MIN_REPLICAS);
    }
    if desired_clusters > MAX_CACHE_CLUSTERS {
        return Err(ERR_MAX_REPLICAS);
    }
    let new_replica_count = desired_clusters - 1;
    if usize::try_from(desired_clusters).is_ok_and(|d| d > current_clusters) {
        Ok(ReplicaChange::Increase(new_replica_count))
    } else {
        Ok(ReplicaChange::Decrease(new_replica_count))
    }
}

pub fn generate_replica_count_input(id: &str, new_replica_count: i32) -> ReplicaCountInput {
    ReplicaCountInput {
        replication_group_id: id.to_string(),
        new_replica_count,
        apply_immediately: true,
    }
}
