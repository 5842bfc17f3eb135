//! # ElastiCache kinds
//!
//! `ReplicationGroup`, `CacheCluster` and `CacheSubnetGroup`.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Reference, ResourceSpec, ResourceStatus, Selector, Tag};

/// ElastiCache Redis replication group, optionally cluster-mode enabled.
///
/// # Example
///
/// ```yaml
/// apiVersion: elasticache.aws.microscaler.io/v1beta1
/// kind: ReplicationGroup
/// metadata:
///   name: sessions
/// spec:
///   forProvider:
///     region: eu-west-1
///     replicationGroupDescription: session cache
///     engine: redis
///     cacheNodeType: cache.t3.micro
///     numCacheClusters: 2
///     automaticFailoverEnabled: true
///     cacheSubnetGroupNameRef:
///       name: private-subnets
///   writeConnectionSecretToRef:
///     namespace: apps
///     name: sessions-redis
/// ```
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    kind = "ReplicationGroup",
    group = "elasticache.aws.microscaler.io",
    version = "v1beta1",
    status = "ReplicationGroupStatus",
    shortname = "rg",
    category = "managed",
    category = "aws",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}, {"name":"State", "type":"string", "jsonPath":".status.atProvider.status"}, {"name":"External-Name", "type":"string", "jsonPath":".metadata.annotations.aws\\.microscaler\\.io/external-name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationGroupSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: ReplicationGroupParameters,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationGroupParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Immutable after creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_rest_encryption_enabled: Option<bool>,
    /// Generate an AUTH token at creation. Requires transit encryption. Immutable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automatic_failover_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_minor_version_upgrade: Option<bool>,
    /// Apply modifications immediately instead of in the next maintenance window
    #[serde(default)]
    pub apply_immediately: bool,
    #[serde(default)]
    pub cache_node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_parameter_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cache_security_group_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_subnet_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_subnet_group_name_ref: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_subnet_group_name_selector: Option<Selector>,
    /// Immutable. Defaults to `redis`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// Exact version or a major-version pattern such as `6.x`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    #[serde(
        rename = "multiAZEnabled",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub multi_az_enabled: Option<bool>,
    /// Immutable shard layout used at creation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_group_configuration: Vec<NodeGroupConfigurationSpec>,
    /// Shards kept when `numNodeGroups` shrinks. Defaults to the first observed shards.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_groups_to_retain: Vec<String>,
    #[serde(
        rename = "notificationTopicARN",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_topic_arn: Option<String>,
    #[serde(
        rename = "notificationTopicARNRef",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_topic_arn_ref: Option<Reference>,
    #[serde(
        rename = "notificationTopicARNSelector",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_topic_arn_selector: Option<Selector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_topic_status: Option<String>,
    /// Primary plus replicas, for groups without cluster mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_cache_clusters: Option<i32>,
    /// Shard count for cluster-mode groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_node_groups: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    #[serde(
        rename = "preferredCacheClusterAZs",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub preferred_cache_cluster_azs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_maintenance_window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas_per_node_group: Option<i32>,
    #[serde(default)]
    pub replication_group_description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_id_refs: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_group_id_selector: Option<Selector>,
    #[serde(rename = "snapshotARNs", default, skip_serializing_if = "Vec::is_empty")]
    pub snapshot_arns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_retention_limit: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshotting_cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_encryption_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroupConfigurationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_availability_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replica_availability_zones: Vec<String>,
    /// Zero is meaningful: a shard without replicas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationGroupStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,
    #[serde(default)]
    pub at_provider: ReplicationGroupObservation,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationGroupObservation {
    #[serde(rename = "arn", default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automatic_failover_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_endpoint: Option<Endpoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub member_clusters: Vec<String>,
    #[serde(rename = "multiAZ", default, skip_serializing_if = "Option::is_none")]
    pub multi_az: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_groups: Vec<NodeGroupObservation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_modified_values: Option<PendingModifiedValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct Endpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroupObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_group_members: Vec<NodeGroupMemberObservation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_endpoint: Option<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reader_endpoint: Option<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroupMemberObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_availability_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_endpoint: Option<Endpoint>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingModifiedValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automatic_failover_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_cluster_id: Option<String>,
}

/// Single ElastiCache cluster (Memcached, or Redis without replication).
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    kind = "CacheCluster",
    group = "elasticache.aws.microscaler.io",
    version = "v1alpha1",
    status = "CacheClusterStatus",
    shortname = "cc",
    category = "managed",
    category = "aws",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}, {"name":"State", "type":"string", "jsonPath":".status.atProvider.cacheClusterStatus"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CacheClusterSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: CacheClusterParameters,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheClusterParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub apply_immediately: bool,
    /// `single-az` or `cross-az` (Memcached only)
    #[serde(rename = "azMode", default, skip_serializing_if = "Option::is_none")]
    pub az_mode: Option<String>,
    pub cache_node_type: String,
    /// Nodes removed when `numCacheNodes` shrinks. Defaults to the highest-numbered nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cache_node_ids_to_remove: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_parameter_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cache_security_group_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_subnet_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_subnet_group_name_ref: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_subnet_group_name_selector: Option<Selector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    #[serde(
        rename = "notificationTopicARN",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_topic_arn: Option<String>,
    pub num_cache_nodes: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_availability_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_availability_zones: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_maintenance_window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_id_refs: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_group_id_selector: Option<Selector>,
    #[serde(rename = "snapshotARNs", default, skip_serializing_if = "Vec::is_empty")]
    pub snapshot_arns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_retention_limit: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_window: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheClusterStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,
    #[serde(default)]
    pub at_provider: CacheClusterObservation,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheClusterObservation {
    #[serde(rename = "arn", default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_rest_encryption_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_cluster_status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cache_nodes: Vec<CacheNodeObservation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_download_landing_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_endpoint: Option<Endpoint>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheNodeObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_node_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
}

/// Subnets a cache cluster or replication group is placed in.
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    kind = "CacheSubnetGroup",
    group = "elasticache.aws.microscaler.io",
    version = "v1beta1",
    status = "CacheSubnetGroupStatus",
    shortname = "csg",
    category = "managed",
    category = "aws",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}, {"name":"VPC", "type":"string", "jsonPath":".status.atProvider.vpcId"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CacheSubnetGroupSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: CacheSubnetGroupParameters,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheSubnetGroupParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnet_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnet_id_refs: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id_selector: Option<Selector>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheSubnetGroupStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,
    #[serde(default)]
    pub at_provider: CacheSubnetGroupObservation,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheSubnetGroupObservation {
    #[serde(rename = "arn", default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
}
