//! # ElastiCache gateway

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_elasticache::types as sdk;
use aws_sdk_elasticache::Client;
use std::collections::BTreeMap;

use super::{observe_call, AwsError};

const SERVICE: &str = "elasticache";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    pub address: Option<String>,
    pub port: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeGroupMember {
    pub cache_cluster_id: Option<String>,
    pub cache_node_id: Option<String>,
    pub current_role: Option<String>,
    pub preferred_availability_zone: Option<String>,
    pub read_endpoint: Option<Endpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeGroup {
    pub node_group_id: Option<String>,
    pub status: Option<String>,
    pub primary_endpoint: Option<Endpoint>,
    pub reader_endpoint: Option<Endpoint>,
    pub slots: Option<String>,
    pub members: Vec<NodeGroupMember>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingModifiedValues {
    pub automatic_failover_status: Option<String>,
    pub primary_cluster_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationGroup {
    pub replication_group_id: String,
    pub arn: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub cluster_enabled: Option<bool>,
    pub configuration_endpoint: Option<Endpoint>,
    pub member_clusters: Vec<String>,
    pub node_groups: Vec<NodeGroup>,
    /// `enabled`, `disabled`, `enabling` or `disabling`
    pub automatic_failover: Option<String>,
    /// `enabled` or `disabled`
    pub multi_az: Option<String>,
    pub cache_node_type: Option<String>,
    pub snapshot_retention_limit: Option<i32>,
    pub snapshot_window: Option<String>,
    pub snapshotting_cluster_id: Option<String>,
    pub at_rest_encryption_enabled: Option<bool>,
    pub transit_encryption_enabled: Option<bool>,
    pub auth_token_enabled: Option<bool>,
    pub kms_key_id: Option<String>,
    pub auto_minor_version_upgrade: Option<bool>,
    pub pending_modified_values: Option<PendingModifiedValues>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheNode {
    pub cache_node_id: Option<String>,
    pub status: Option<String>,
    pub endpoint: Option<Endpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheCluster {
    pub cache_cluster_id: String,
    pub arn: Option<String>,
    pub status: Option<String>,
    pub cache_node_type: Option<String>,
    pub engine: Option<String>,
    pub engine_version: Option<String>,
    pub num_cache_nodes: Option<i32>,
    pub cache_parameter_group_name: Option<String>,
    pub cache_subnet_group_name: Option<String>,
    pub notification_topic_arn: Option<String>,
    pub notification_topic_status: Option<String>,
    pub preferred_availability_zone: Option<String>,
    pub preferred_maintenance_window: Option<String>,
    pub security_group_ids: Vec<String>,
    pub cache_security_group_names: Vec<String>,
    pub snapshot_retention_limit: Option<i32>,
    pub snapshot_window: Option<String>,
    pub at_rest_encryption_enabled: Option<bool>,
    pub auth_token_enabled: Option<bool>,
    pub configuration_endpoint: Option<Endpoint>,
    pub client_download_landing_page: Option<String>,
    pub cache_nodes: Vec<CacheNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSubnetGroup {
    pub name: String,
    pub arn: Option<String>,
    pub description: Option<String>,
    pub vpc_id: Option<String>,
    pub subnet_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeGroupConfiguration {
    pub node_group_id: Option<String>,
    pub primary_availability_zone: Option<String>,
    pub replica_availability_zones: Vec<String>,
    pub replica_count: Option<i32>,
    pub slots: Option<String>,
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct CreateReplicationGroupInput {
    pub replication_group_id: String,
    pub description: String,
    pub at_rest_encryption_enabled: Option<bool>,
    pub auth_token: Option<String>,
    pub automatic_failover_enabled: Option<bool>,
    pub auto_minor_version_upgrade: Option<bool>,
    pub cache_node_type: Option<String>,
    pub cache_parameter_group_name: Option<String>,
    pub cache_security_group_names: Vec<String>,
    pub cache_subnet_group_name: Option<String>,
    pub engine: Option<String>,
    pub engine_version: Option<String>,
    pub kms_key_id: Option<String>,
    pub multi_az_enabled: Option<bool>,
    pub node_group_configuration: Vec<NodeGroupConfiguration>,
    pub notification_topic_arn: Option<String>,
    pub num_cache_clusters: Option<i32>,
    pub num_node_groups: Option<i32>,
    pub port: Option<i32>,
    pub preferred_cache_cluster_azs: Vec<String>,
    pub preferred_maintenance_window: Option<String>,
    pub primary_cluster_id: Option<String>,
    pub replicas_per_node_group: Option<i32>,
    pub security_group_ids: Vec<String>,
    pub snapshot_arns: Vec<String>,
    pub snapshot_name: Option<String>,
    pub snapshot_retention_limit: Option<i32>,
    pub snapshot_window: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub transit_encryption_enabled: Option<bool>,
}

// The auth token must never reach logs.
impl std::fmt::Debug for CreateReplicationGroupInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateReplicationGroupInput")
            .field("replication_group_id", &self.replication_group_id)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<REDACTED>"))
            .field("cache_node_type", &self.cache_node_type)
            .field("engine", &self.engine)
            .field("num_cache_clusters", &self.num_cache_clusters)
            .field("num_node_groups", &self.num_node_groups)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifyReplicationGroupInput {
    pub replication_group_id: String,
    pub apply_immediately: bool,
    pub automatic_failover_enabled: Option<bool>,
    pub auto_minor_version_upgrade: Option<bool>,
    pub cache_node_type: Option<String>,
    pub cache_parameter_group_name: Option<String>,
    pub cache_security_group_names: Vec<String>,
    pub description: Option<String>,
    pub engine_version: Option<String>,
    pub multi_az_enabled: Option<bool>,
    pub notification_topic_arn: Option<String>,
    pub notification_topic_status: Option<String>,
    pub preferred_maintenance_window: Option<String>,
    pub primary_cluster_id: Option<String>,
    pub security_group_ids: Vec<String>,
    pub snapshot_retention_limit: Option<i32>,
    pub snapshot_window: Option<String>,
    pub snapshotting_cluster_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifyShardConfigurationInput {
    pub replication_group_id: String,
    pub node_group_count: i32,
    pub apply_immediately: bool,
    pub node_groups_to_retain: Vec<String>,
    pub node_groups_to_remove: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicaCountInput {
    pub replication_group_id: String,
    pub new_replica_count: i32,
    pub apply_immediately: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateCacheClusterInput {
    pub cache_cluster_id: String,
    pub az_mode: Option<String>,
    pub cache_node_type: Option<String>,
    pub cache_parameter_group_name: Option<String>,
    pub cache_security_group_names: Vec<String>,
    pub cache_subnet_group_name: Option<String>,
    pub engine: Option<String>,
    pub engine_version: Option<String>,
    pub notification_topic_arn: Option<String>,
    pub num_cache_nodes: Option<i32>,
    pub port: Option<i32>,
    pub preferred_availability_zone: Option<String>,
    pub preferred_availability_zones: Vec<String>,
    pub preferred_maintenance_window: Option<String>,
    pub replication_group_id: Option<String>,
    pub security_group_ids: Vec<String>,
    pub snapshot_arns: Vec<String>,
    pub snapshot_name: Option<String>,
    pub snapshot_retention_limit: Option<i32>,
    pub snapshot_window: Option<String>,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifyCacheClusterInput {
    pub cache_cluster_id: String,
    pub apply_immediately: bool,
    pub cache_node_ids_to_remove: Vec<String>,
    pub cache_node_type: Option<String>,
    pub cache_parameter_group_name: Option<String>,
    pub cache_security_group_names: Vec<String>,
    pub engine_version: Option<String>,
    pub notification_topic_arn: Option<String>,
    pub num_cache_nodes: Option<i32>,
    pub preferred_maintenance_window: Option<String>,
    pub security_group_ids: Vec<String>,
    pub snapshot_retention_limit: Option<i32>,
    pub snapshot_window: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSubnetGroupInput {
    pub name: String,
    pub description: String,
    pub subnet_ids: Vec<String>,
    pub tags: BTreeMap<String, String>,
}

/// ElastiCache operations used by the replication group, cache cluster and
/// cache subnet group reconcilers.
///
/// Describe calls return an error of kind `NotFound` when the resource is absent.
#[async_trait]
pub trait ElastiCacheGateway: Send + Sync {
    async fn describe_replication_group(&self, id: &str) -> Result<ReplicationGroup, AwsError>;
    async fn create_replication_group(
        &self,
        input: CreateReplicationGroupInput,
    ) -> Result<(), AwsError>;
    async fn modify_replication_group(
        &self,
        input: ModifyReplicationGroupInput,
    ) -> Result<(), AwsError>;
    async fn modify_replication_group_shard_configuration(
        &self,
        input: ModifyShardConfigurationInput,
    ) -> Result<(), AwsError>;
    async fn increase_replica_count(&self, input: ReplicaCountInput) -> Result<(), AwsError>;
    async fn decrease_replica_count(&self, input: ReplicaCountInput) -> Result<(), AwsError>;
    async fn delete_replication_group(&self, id: &str) -> Result<(), AwsError>;

    async fn describe_cache_cluster(&self, id: &str) -> Result<CacheCluster, AwsError>;
    async fn create_cache_cluster(&self, input: CreateCacheClusterInput) -> Result<(), AwsError>;
    async fn modify_cache_cluster(&self, input: ModifyCacheClusterInput) -> Result<(), AwsError>;
    async fn delete_cache_cluster(&self, id: &str) -> Result<(), AwsError>;

    async fn describe_cache_subnet_group(&self, name: &str)
        -> Result<CacheSubnetGroup, AwsError>;
    async fn create_cache_subnet_group(&self, input: CacheSubnetGroupInput)
        -> Result<(), AwsError>;
    async fn modify_cache_subnet_group(&self, input: CacheSubnetGroupInput)
        -> Result<(), AwsError>;
    async fn delete_cache_subnet_group(&self, name: &str) -> Result<(), AwsError>;

    async fn list_tags(&self, arn: &str) -> Result<BTreeMap<String, String>, AwsError>;
    async fn add_tags(&self, arn: &str, tags: &BTreeMap<String, String>) -> Result<(), AwsError>;
    async fn remove_tags(&self, arn: &str, keys: &[String]) -> Result<(), AwsError>;
}

/// [`ElastiCacheGateway`] backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct SdkElastiCache {
    client: Client,
}

impl SdkElastiCache {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

fn sdk_tags(tags: &BTreeMap<String, String>) -> Option<Vec<sdk::Tag>> {
    (!tags.is_empty()).then(|| {
        tags.iter()
            .map(|(k, v)| sdk::Tag::builder().key(k).value(v).build())
            .collect()
    })
}

fn endpoint(e: &sdk::Endpoint) -> Endpoint {
    Endpoint {
        address: e.address().map(str::to_string),
        port: e.port(),
    }
}

fn replication_group(rg: &sdk::ReplicationGroup) -> ReplicationGroup {
    ReplicationGroup {
        replication_group_id: rg.replication_group_id().unwrap_or_default().to_string(),
        arn: rg.arn().map(str::to_string),
        description: rg.description().map(str::to_string),
        status: rg.status().map(str::to_string),
        cluster_enabled: rg.cluster_enabled(),
        configuration_endpoint: rg.configuration_endpoint().map(endpoint),
        member_clusters: rg.member_clusters().to_vec(),
        node_groups: rg
            .node_groups()
            .iter()
            .map(|ng| NodeGroup {
                node_group_id: ng.node_group_id().map(str::to_string),
                status: ng.status().map(str::to_string),
                primary_endpoint: ng.primary_endpoint().map(endpoint),
                reader_endpoint: ng.reader_endpoint().map(endpoint),
                slots: ng.slots().map(str::to_string),
                members: ng
                    .node_group_members()
                    .iter()
                    .map(|m| NodeGroupMember {
                        cache_cluster_id: m.cache_cluster_id().map(str::to_string),
                        cache_node_id: m.cache_node_id().map(str::to_string),
                        current_role: m.current_role().map(str::to_string),
                        preferred_availability_zone: m
                            .preferred_availability_zone()
                            .map(str::to_string),
                        read_endpoint: m.read_endpoint().map(endpoint),
                    })
                    .collect(),
            })
            .collect(),
        automatic_failover: rg.automatic_failover().map(|s| s.as_str().to_string()),
        multi_az: rg.multi_az().map(|s| s.as_str().to_string()),
        cache_node_type: rg.cache_node_type().map(str::to_string),
        snapshot_retention_limit: rg.snapshot_retention_limit(),
        snapshot_window: rg.snapshot_window().map(str::to_string),
        snapshotting_cluster_id: rg.snapshotting_cluster_id().map(str::to_string),
        at_rest_encryption_enabled: rg.at_rest_encryption_enabled(),
        transit_encryption_enabled: rg.transit_encryption_enabled(),
        auth_token_enabled: rg.auth_token_enabled(),
        kms_key_id: rg.kms_key_id().map(str::to_string),
        auto_minor_version_upgrade: rg.auto_minor_version_upgrade(),
        pending_modified_values: rg.pending_modified_values().map(|p| PendingModifiedValues {
            automatic_failover_status: p.automatic_failover_status().map(|s| s.as_str().to_string()),
            primary_cluster_id: p.primary_cluster_id().map(str::to_string),
        }),
    }
}

fn cache_cluster(cc: &sdk::CacheCluster) -> CacheCluster {
    CacheCluster {
        cache_cluster_id: cc.cache_cluster_id().unwrap_or_default().to_string(),
        arn: cc.arn().map(str::to_string),
        status: cc.cache_cluster_status().map(str::to_string),
        cache_node_type: cc.cache_node_type().map(str::to_string),
        engine: cc.engine().map(str::to_string),
        engine_version: cc.engine_version().map(str::to_string),
        num_cache_nodes: cc.num_cache_nodes(),
        cache_parameter_group_name: cc
            .cache_parameter_group()
            .and_then(|g| g.cache_parameter_group_name())
            .map(str::to_string),
        cache_subnet_group_name: cc.cache_subnet_group_name().map(str::to_string),
        notification_topic_arn: cc
            .notification_configuration()
            .and_then(|n| n.topic_arn())
            .map(str::to_string),
        notification_topic_status: cc
            .notification_configuration()
            .and_then(|n| n.topic_status())
            .map(str::to_string),
        preferred_availability_zone: cc.preferred_availability_zone().map(str::to_string),
        preferred_maintenance_window: cc.preferred_maintenance_window().map(str::to_string),
        security_group_ids: cc
            .security_groups()
            .iter()
            .filter_map(|m| m.security_group_id().map(str::to_string))
            .collect(),
        cache_security_group_names: cc
            .cache_security_groups()
            .iter()
            .filter_map(|m| m.cache_security_group_name().map(str::to_string))
            .collect(),
        snapshot_retention_limit: cc.snapshot_retention_limit(),
        snapshot_window: cc.snapshot_window().map(str::to_string),
        at_rest_encryption_enabled: cc.at_rest_encryption_enabled(),
        auth_token_enabled: cc.auth_token_enabled(),
        configuration_endpoint: cc.configuration_endpoint().map(endpoint),
        client_download_landing_page: cc.client_download_landing_page().map(str::to_string),
        cache_nodes: cc
            .cache_nodes()
            .iter()
            .map(|n| CacheNode {
                cache_node_id: n.cache_node_id().map(str::to_string),
                status: n.cache_node_status().map(str::to_string),
                endpoint: n.endpoint().map(endpoint),
            })
            .collect(),
    }
}

#[async_trait]
impl ElastiCacheGateway for SdkElastiCache {
    async fn describe_replication_group(&self, id: &str) -> Result<ReplicationGroup, AwsError> {
        let output = observe_call(
            SERVICE,
            "DescribeReplicationGroups",
            self.client
                .describe_replication_groups()
                .replication_group_id(id)
                .send()
                .await,
        )?;
        output
            .replication_groups()
            .first()
            .map(replication_group)
            .ok_or_else(|| AwsError::not_found(format!("replication group {id} not found")))
    }

    async fn create_replication_group(
        &self,
        input: CreateReplicationGroupInput,
    ) -> Result<(), AwsError> {
        let node_groups = (!input.node_group_configuration.is_empty()).then(|| {
            input
                .node_group_configuration
                .iter()
                .map(|ng| {
                    sdk::NodeGroupConfiguration::builder()
                        .set_node_group_id(ng.node_group_id.clone())
                        .set_primary_availability_zone(ng.primary_availability_zone.clone())
                        .set_replica_availability_zones(non_empty(&ng.replica_availability_zones))
                        .set_replica_count(ng.replica_count)
                        .set_slots(ng.slots.clone())
                        .build()
                })
                .collect()
        });

        observe_call(
            SERVICE,
            "CreateReplicationGroup",
            self.client
                .create_replication_group()
                .replication_group_id(&input.replication_group_id)
                .replication_group_description(&input.description)
                .set_at_rest_encryption_enabled(input.at_rest_encryption_enabled)
                .set_auth_token(input.auth_token.clone())
                .set_automatic_failover_enabled(input.automatic_failover_enabled)
                .set_auto_minor_version_upgrade(input.auto_minor_version_upgrade)
                .set_cache_node_type(input.cache_node_type.clone())
                .set_cache_parameter_group_name(input.cache_parameter_group_name.clone())
                .set_cache_security_group_names(non_empty(&input.cache_security_group_names))
                .set_cache_subnet_group_name(input.cache_subnet_group_name.clone())
                .set_engine(input.engine.clone())
                .set_engine_version(input.engine_version.clone())
                .set_kms_key_id(input.kms_key_id.clone())
                .set_multi_az_enabled(input.multi_az_enabled)
                .set_node_group_configuration(node_groups)
                .set_notification_topic_arn(input.notification_topic_arn.clone())
                .set_num_cache_clusters(input.num_cache_clusters)
                .set_num_node_groups(input.num_node_groups)
                .set_port(input.port)
                .set_preferred_cache_cluster_azs(non_empty(&input.preferred_cache_cluster_azs))
                .set_preferred_maintenance_window(input.preferred_maintenance_window.clone())
                .set_primary_cluster_id(input.primary_cluster_id.clone())
                .set_replicas_per_node_group(input.replicas_per_node_group)
                .set_security_group_ids(non_empty(&input.security_group_ids))
                .set_snapshot_arns(non_empty(&input.snapshot_arns))
                .set_snapshot_name(input.snapshot_name.clone())
                .set_snapshot_retention_limit(input.snapshot_retention_limit)
                .set_snapshot_window(input.snapshot_window.clone())
                .set_tags(sdk_tags(&input.tags))
                .set_transit_encryption_enabled(input.transit_encryption_enabled)
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn modify_replication_group(
        &self,
        input: ModifyReplicationGroupInput,
    ) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "ModifyReplicationGroup",
            self.client
                .modify_replication_group()
                .replication_group_id(&input.replication_group_id)
                .apply_immediately(input.apply_immediately)
                .set_automatic_failover_enabled(input.automatic_failover_enabled)
                .set_auto_minor_version_upgrade(input.auto_minor_version_upgrade)
                .set_cache_node_type(input.cache_node_type)
                .set_cache_parameter_group_name(input.cache_parameter_group_name)
                .set_cache_security_group_names(non_empty(&input.cache_security_group_names))
                .set_replication_group_description(input.description)
                .set_engine_version(input.engine_version)
                .set_multi_az_enabled(input.multi_az_enabled)
                .set_notification_topic_arn(input.notification_topic_arn)
                .set_notification_topic_status(input.notification_topic_status)
                .set_preferred_maintenance_window(input.preferred_maintenance_window)
                .set_primary_cluster_id(input.primary_cluster_id)
                .set_security_group_ids(non_empty(&input.security_group_ids))
                .set_snapshot_retention_limit(input.snapshot_retention_limit)
                .set_snapshot_window(input.snapshot_window)
                .set_snapshotting_cluster_id(input.snapshotting_cluster_id)
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn modify_replication_group_shard_configuration(
        &self,
        input: ModifyShardConfigurationInput,
    ) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "ModifyReplicationGroupShardConfiguration",
            self.client
                .modify_replication_group_shard_configuration()
                .replication_group_id(&input.replication_group_id)
                .node_group_count(input.node_group_count)
                .apply_immediately(input.apply_immediately)
                .set_node_groups_to_retain(non_empty(&input.node_groups_to_retain))
                .set_node_groups_to_remove(non_empty(&input.node_groups_to_remove))
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn increase_replica_count(&self, input: ReplicaCountInput) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "IncreaseReplicaCount",
            self.client
                .increase_replica_count()
                .replication_group_id(&input.replication_group_id)
                .new_replica_count(input.new_replica_count)
                .apply_immediately(input.apply_immediately)
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn decrease_replica_count(&self, input: ReplicaCountInput) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "DecreaseReplicaCount",
            self.client
                .decrease_replica_count()
                .replication_group_id(&input.replication_group_id)
                .new_replica_count(input.new_replica_count)
                .apply_immediately(input.apply_immediately)
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn delete_replication_group(&self, id: &str) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "DeleteReplicationGroup",
            self.client
                .delete_replication_group()
                .replication_group_id(id)
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn describe_cache_cluster(&self, id: &str) -> Result<CacheCluster, AwsError> {
        let output = observe_call(
            SERVICE,
            "DescribeCacheClusters",
            self.client
                .describe_cache_clusters()
                .cache_cluster_id(id)
                .show_cache_node_info(true)
                .send()
                .await,
        )?;
        output
            .cache_clusters()
            .first()
            .map(cache_cluster)
            .ok_or_else(|| AwsError::not_found(format!("cache cluster {id} not found")))
    }

    async fn create_cache_cluster(&self, input: CreateCacheClusterInput) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "CreateCacheCluster",
            self.client
                .create_cache_cluster()
                .cache_cluster_id(&input.cache_cluster_id)
                .set_az_mode(input.az_mode.as_deref().map(sdk::AzMode::from))
                .set_cache_node_type(input.cache_node_type)
                .set_cache_parameter_group_name(input.cache_parameter_group_name)
                .set_cache_security_group_names(non_empty(&input.cache_security_group_names))
                .set_cache_subnet_group_name(input.cache_subnet_group_name)
                .set_engine(input.engine)
                .set_engine_version(input.engine_version)
                .set_notification_topic_arn(input.notification_topic_arn)
                .set_num_cache_nodes(input.num_cache_nodes)
                .set_port(input.port)
                .set_preferred_availability_zone(input.preferred_availability_zone)
                .set_preferred_availability_zones(non_empty(&input.preferred_availability_zones))
                .set_preferred_maintenance_window(input.preferred_maintenance_window)
                .set_replication_group_id(input.replication_group_id)
                .set_security_group_ids(non_empty(&input.security_group_ids))
                .set_snapshot_arns(non_empty(&input.snapshot_arns))
                .set_snapshot_name(input.snapshot_name)
                .set_snapshot_retention_limit(input.snapshot_retention_limit)
                .set_snapshot_window(input.snapshot_window)
                .set_tags(sdk_tags(&input.tags))
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn modify_cache_cluster(&self, input: ModifyCacheClusterInput) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "ModifyCacheCluster",
            self.client
                .modify_cache_cluster()
                .cache_cluster_id(&input.cache_cluster_id)
                .apply_immediately(input.apply_immediately)
                .set_cache_node_ids_to_remove(non_empty(&input.cache_node_ids_to_remove))
                .set_cache_node_type(input.cache_node_type)
                .set_cache_parameter_group_name(input.cache_parameter_group_name)
                .set_cache_security_group_names(non_empty(&input.cache_security_group_names))
                .set_engine_version(input.engine_version)
                .set_notification_topic_arn(input.notification_topic_arn)
                .set_num_cache_nodes(input.num_cache_nodes)
                .set_preferred_maintenance_window(input.preferred_maintenance_window)
                .set_security_group_ids(non_empty(&input.security_group_ids))
                .set_snapshot_retention_limit(input.snapshot_retention_limit)
                .set_snapshot_window(input.snapshot_window)
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn delete_cache_cluster(&self, id: &str) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "DeleteCacheCluster",
            self.client
                .delete_cache_cluster()
                .cache_cluster_id(id)
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn describe_cache_subnet_group(
        &self,
        name: &str,
    ) -> Result<CacheSubnetGroup, AwsError> {
        let output = observe_call(
            SERVICE,
            "DescribeCacheSubnetGroups",
            self.client
                .describe_cache_subnet_groups()
                .cache_subnet_group_name(name)
                .send()
                .await,
        )?;
        output
            .cache_subnet_groups()
            .first()
            .map(|g| CacheSubnetGroup {
                name: g.cache_subnet_group_name().unwrap_or(name).to_string(),
                arn: g.arn().map(str::to_string),
                description: g.cache_subnet_group_description().map(str::to_string),
                vpc_id: g.vpc_id().map(str::to_string),
                subnet_ids: g
                    .subnets()
                    .iter()
                    .filter_map(|s| s.subnet_identifier().map(str::to_string))
                    .collect(),
            })
            .ok_or_else(|| AwsError::not_found(format!("cache subnet group {name} not found")))
    }

    async fn create_cache_subnet_group(
        &self,
        input: CacheSubnetGroupInput,
    ) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "CreateCacheSubnetGroup",
            self.client
                .create_cache_subnet_group()
                .cache_subnet_group_name(&input.name)
                .cache_subnet_group_description(&input.description)
                .set_subnet_ids(Some(input.subnet_ids.clone()))
                .set_tags(sdk_tags(&input.tags))
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn modify_cache_subnet_group(
        &self,
        input: CacheSubnetGroupInput,
    ) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "ModifyCacheSubnetGroup",
            self.client
                .modify_cache_subnet_group()
                .cache_subnet_group_name(&input.name)
                .cache_subnet_group_description(&input.description)
                .set_subnet_ids(Some(input.subnet_ids))
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn delete_cache_subnet_group(&self, name: &str) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "DeleteCacheSubnetGroup",
            self.client
                .delete_cache_subnet_group()
                .cache_subnet_group_name(name)
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn list_tags(&self, arn: &str) -> Result<BTreeMap<String, String>, AwsError> {
        let output = observe_call(
            SERVICE,
            "ListTagsForResource",
            self.client
                .list_tags_for_resource()
                .resource_name(arn)
                .send()
                .await,
        )?;
        Ok(output
            .tag_list()
            .iter()
            .filter_map(|t| Some((t.key()?.to_string(), t.value().unwrap_or_default().to_string())))
            .collect())
    }

    async fn add_tags(&self, arn: &str, tags: &BTreeMap<String, String>) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "AddTagsToResource",
            self.client
                .add_tags_to_resource()
                .resource_name(arn)
                .set_tags(sdk_tags(tags))
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn remove_tags(&self, arn: &str, keys: &[String]) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "RemoveTagsFromResource",
            self.client
                .remove_tags_from_resource()
                .resource_name(arn)
                .set_tag_keys(Some(keys.to_vec()))
                .send()
                .await,
        )
        .map(|_| ())
    }
}
