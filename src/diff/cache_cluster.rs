//! Cache cluster late initialization and drift.

use super::tags::tag_map;
use super::{
    engine_version_matches, int_equal_default_zero, late_init, late_init_string, late_init_vec,
    string_set_equal, window_equal,
};
use crate::aws::elasticache::{CacheCluster, CreateCacheClusterInput, ModifyCacheClusterInput};
use crate::crd::elasticache::{
    CacheClusterObservation, CacheClusterParameters, CacheNodeObservation, Endpoint,
};

pub fn late_initialize(params: &mut CacheClusterParameters, cc: &CacheCluster) -> bool {
    let mut changed = false;
    changed |= late_init_string(&mut params.cache_node_type, cc.cache_node_type.as_deref());
    changed |= late_init(&mut params.engine, cc.engine.clone());
    changed |= late_init(&mut params.engine_version, cc.engine_version.clone());
    changed |= late_init(
        &mut params.cache_parameter_group_name,
        cc.cache_parameter_group_name.clone(),
    );
    changed |= late_init(&mut params.cache_subnet_group_name, cc.cache_subnet_group_name.clone());
    changed |= late_init(&mut params.notification_topic_arn, cc.notification_topic_arn.clone());
    changed |= late_init(
        &mut params.preferred_availability_zone,
        cc.preferred_availability_zone.clone(),
    );
    changed |= late_init(
        &mut params.preferred_maintenance_window,
        cc.preferred_maintenance_window.clone(),
    );
    changed |= late_init(&mut params.snapshot_retention_limit, cc.snapshot_retention_limit);
    changed |= late_init(&mut params.snapshot_window, cc.snapshot_window.clone());
    changed |= late_init_vec(&mut params.security_group_ids, &cc.security_group_ids);
    changed |= late_init_vec(
        &mut params.cache_security_group_names,
        &cc.cache_security_group_names,
    );
    if params.num_cache_nodes == 0 {
        if let Some(n) = cc.num_cache_nodes.filter(|n| *n > 0) {
            params.num_cache_nodes = n;
            changed = true;
        }
    }
    changed
}

/// Fields that differ from AWS. Empty means up to date.
pub fn drifted_fields(params: &CacheClusterParameters, cc: &CacheCluster) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if !params.cache_node_type.is_empty()
        && cc.cache_node_type.as_deref() != Some(params.cache_node_type.as_str())
    {
        fields.push("cacheNodeType");
    }
    if let (Some(desired), Some(observed)) = (&params.engine_version, &cc.engine_version) {
        if !engine_version_matches(desired, observed) {
            fields.push("engineVersion");
        }
    }
    if params.num_cache_nodes != 0 && !int_equal_default_zero(Some(params.num_cache_nodes), cc.num_cache_nodes) {
        fields.push("numCacheNodes");
    }
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
        .is_some_and(|w| !window_equal(w, cc.preferred_maintenance_window.as_deref()))
    {
        fields.push("preferredMaintenanceWindow");
    }
    if !int_equal_default_zero(params.snapshot_retention_limit, cc.snapshot_retention_limit) {
        fields.push("snapshotRetentionLimit");
    }
    if params
        .snapshot_window
        .as_deref()
        .is_some_and(|w| !window_equal(w, cc.snapshot_window.as_deref()))
    {
        fields.push("snapshotWindow");
    }
    if !params.security_group_ids.is_empty()
        && !string_set_equal(&params.security_group_ids, &cc.security_group_ids)
    {
        fields.push("securityGroupIds");
    }
    if !params.cache_security_group_names.is_empty()
        && !string_set_equal(&params.cache_security_group_names, &cc.cache_security_group_names)
    {
        fields.push("cacheSecurityGroupNames");
    }
    fields
}

pub fn is_up_to_date(params: &CacheClusterParameters, cc: &CacheCluster) -> bool {
    drifted_fields(params, cc).is_empty()
}

pub fn generate_observation(cc: &CacheCluster) -> CacheClusterObservation {
    let endpoint = |e: &crate::aws::elasticache::Endpoint| Endpoint {
        address: e.address.clone(),
        port: e.port,
    };
    CacheClusterObservation {
        arn: cc.arn.clone(),
        at_rest_encryption_enabled: cc.at_rest_encryption_enabled,
        auth_token_enabled: cc.auth_token_enabled,
        cache_cluster_status: cc.status.clone(),
        cache_nodes: cc
            .cache_nodes
            .iter()
            .map(|n| CacheNodeObservation {
                cache_node_id: n.cache_node_id.clone(),
                cache_node_status: n.status.clone(),
                endpoint: n.endpoint.as_ref().map(endpoint),
            })
            .collect(),
        client_download_landing_page: cc.client_download_landing_page.clone(),
        configuration_endpoint: cc.configuration_endpoint.as_ref().map(endpoint),
    }
}

pub fn generate_create_input(id: &str, params: &CacheClusterParameters) -> CreateCacheClusterInput {
    CreateCacheClusterInput {
        cache_cluster_id: id.to_string(),
        az_mode: params.az_mode.clone(),
        cache_node_type: (!params.cache_node_type.is_empty()).then(|| params.cache_node_type.clone()),
        cache_parameter_group_name: params.cache_parameter_group_name.clone(),
        cache_security_group_names: params.cache_security_group_names.clone(),
        cache_subnet_group_name: params.cache_subnet_group_name.clone(),
        engine: params.engine.clone(),
        engine_version: params.engine_version.clone(),
        notification_topic_arn: params.notification_topic_arn.clone(),
        num_cache_nodes: (params.num_cache_nodes > 0).then_some(params.num_cache_nodes),
        port: params.port,
        preferred_availability_zone: params.preferred_availability_zone.clone(),
        preferred_availability_zones: params.preferred_availability_zones.clone(),
        preferred_maintenance_window: params.preferred_maintenance_window.clone(),
        replication_group_id: params.replication_group_id.clone(),
        security_group_ids: params.security_group_ids.clone(),
        snapshot_arns: params.snapshot_arns.clone(),
        snapshot_name: params.snapshot_name.clone(),
        snapshot_retention_limit: params.snapshot_retention_limit,
        snapshot_window: params.snapshot_window.clone(),
        tags: tag_map(&params.tags),
    }
}

/// Node IDs to drop when shrinking: the ones named in `forProvider`, or else the
/// highest-numbered nodes.
pub fn nodes_to_remove(params: &CacheClusterParameters, cc: &CacheCluster) -> Vec<String> {
    let current = cc.num_cache_nodes.unwrap_or(0);
    if params.num_cache_nodes <= 0 || params.num_cache_nodes >= current {
        return Vec::new();
    }
    if !params.cache_node_ids_to_remove.is_empty() {
        return params.cache_node_ids_to_remove.clone();
    }
    let mut ids: Vec<String> = cc
        .cache_nodes
        .iter()
        .filter_map(|n| n.cache_node_id.clone())
        .collect();
    ids.sort();
    let surplus = usize::try_from(current - params.num_cache_nodes).unwrap_or(0);
    ids.into_iter().rev().take(surplus).collect()
}

pub fn generate_modify_input(
    id: &str,
    params: &CacheClusterParameters,
    cc: &CacheCluster,
) -> ModifyCacheClusterInput {
    let engine_version = match (&params.engine_version, &cc.engine_version) {
        (Some(desired), Some(observed)) if engine_version_matches(desired, observed) => None,
        (desired, _) => desired.clone(),
    };
    ModifyCacheClusterInput {
        cache_cluster_id: id.to_string(),
        apply_immediately: params.apply_immediately,
        cache_node_ids_to_remove: nodes_to_remove(params, cc),
        cache_node_type: (!params.cache_node_type.is_empty()
            && cc.cache_node_type.as_deref() != Some(params.cache_node_type.as_str()))
        .then(|| params.cache_node_type.clone()),
        cache_parameter_group_name: params.cache_parameter_group_name.clone(),
        cache_security_group_names: params.cache_security_group_names.clone(),
        engine_version,
        notification_topic_arn: params.notification_topic_arn.clone(),
        num_cache_nodes: (params.num_cache_nodes > 0).then_some(params.num_cache_nodes),
        preferred_maintenance_window: params.preferred_maintenance_window.clone(),
        security_group_ids: params.security_group_ids.clone(),
        snapshot_retention_limit: params.snapshot_retention_limit,
        snapshot_window: params.snapshot_window.clone(),
    }
}
