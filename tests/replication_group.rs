//! # Replication Group Client Tests
//!
//! Exercises the ElastiCache replication group client against an in-memory
//! gateway.
//!
//! These tests verify:
//! - Connection details come from the configuration endpoint in cluster mode
//! - Only the first drifted update class is applied per pass
//! - Replica count bounds and direction
//! - Tag additions and removals
//! - The AUTH token is published once, on the create that generated it

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use common::FakeElastiCache;
use provider_aws::aws::elasticache::{Endpoint, NodeGroup, ReplicationGroup as AwsReplicationGroup};
use provider_aws::aws::AwsError;
use provider_aws::controller::elasticache::replication_group::ReplicationGroupClient;
use provider_aws::crd::elasticache::ReplicationGroupSpec;
use provider_aws::crd::{ConditionReason, ReplicationGroup, Tag, CONDITION_READY};
use provider_aws::diff::replication_group::{ERR_MAX_REPLICAS, ERR_MIN_REPLICAS};
use provider_aws::managed::{ExternalClient, Managed, ReconcileError};

const GROUP_ID: &str = "cache";
const GROUP_ARN: &str = "arn:aws:elasticache:us-east-1:123456789012:replicationgroup:cache";

fn group(status: &str) -> AwsReplicationGroup {
    AwsReplicationGroup {
        replication_group_id: GROUP_ID.to_string(),
        status: Some(status.to_string()),
        ..AwsReplicationGroup::default()
    }
}

fn node_group(id: &str) -> NodeGroup {
    NodeGroup {
        node_group_id: Some(id.to_string()),
        status: Some("available".to_string()),
        ..NodeGroup::default()
    }
}

fn managed(spec: ReplicationGroupSpec) -> ReplicationGroup {
    let mut mr = ReplicationGroup::new(GROUP_ID, spec);
    mr.metadata = common::meta(GROUP_ID);
    mr
}

fn client(fake: &Arc<FakeElastiCache>) -> ReplicationGroupClient {
    ReplicationGroupClient::new(Arc::clone(fake) as _)
}

fn ready_reason(mr: &ReplicationGroup) -> Option<String> {
    mr.resource_status()
        .and_then(|s| s.condition(CONDITION_READY))
        .and_then(|c| c.reason.clone())
}

#[tokio::test]
async fn test_cluster_mode_publishes_configuration_endpoint() {
    let fake = Arc::new(FakeElastiCache::with_group(AwsReplicationGroup {
        cluster_enabled: Some(true),
        configuration_endpoint: Some(Endpoint {
            address: Some("coolhost".to_string()),
            port: Some(6379),
        }),
        ..group("available")
    }));
    let mut mr = managed(ReplicationGroupSpec::default());

    let observation = client(&fake).observe(&mut mr).await.unwrap();

    assert!(observation.resource_exists);
    assert!(observation.resource_up_to_date);
    assert!(!observation.pending);
    assert_eq!(
        observation.connection_details.get("endpoint"),
        Some(&b"coolhost".to_vec())
    );
    assert_eq!(
        observation.connection_details.get("port"),
        Some(&b"6379".to_vec())
    );
    assert_eq!(ready_reason(&mr).as_deref(), Some(ConditionReason::Available.as_str()));
    let at_provider = &mr.status.as_ref().unwrap().at_provider;
    assert_eq!(at_provider.cluster_enabled, Some(true));
    assert_eq!(at_provider.status.as_deref(), Some("available"));
}

#[tokio::test]
async fn test_non_cluster_mode_publishes_primary_endpoint() {
    let fake = Arc::new(FakeElastiCache::with_group(AwsReplicationGroup {
        cluster_enabled: Some(false),
        node_groups: vec![NodeGroup {
            primary_endpoint: Some(Endpoint {
                address: Some("primary.local".to_string()),
                port: Some(6380),
            }),
            ..node_group("0001")
        }],
        ..group("available")
    }));
    let mut mr = managed(ReplicationGroupSpec::default());

    let observation = client(&fake).observe(&mut mr).await.unwrap();

    assert_eq!(
        observation.connection_details.get("endpoint"),
        Some(&b"primary.local".to_vec())
    );
    assert_eq!(
        observation.connection_details.get("port"),
        Some(&b"6380".to_vec())
    );
}

#[tokio::test]
async fn test_missing_group_is_reported_absent() {
    let fake = Arc::new(FakeElastiCache::default());
    let mut mr = managed(ReplicationGroupSpec::default());

    let observation = client(&fake).observe(&mut mr).await.unwrap();

    assert!(!observation.resource_exists);
    assert!(fake.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_unavailable_group_is_up_to_date_but_pending() {
    let fake = Arc::new(FakeElastiCache::with_group(AwsReplicationGroup {
        arn: Some(GROUP_ARN.to_string()),
        node_groups: vec![node_group("0001")],
        ..group("creating")
    }));
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.num_node_groups = Some(3);
    let mut mr = managed(spec);

    let observation = client(&fake).observe(&mut mr).await.unwrap();

    assert!(observation.resource_up_to_date);
    assert!(observation.pending);
    assert_eq!(ready_reason(&mr).as_deref(), Some(ConditionReason::Creating.as_str()));
    // Tags cannot be listed until the group is available
    assert!(!fake.calls().iter().any(|c| c == "ListTagsForResource"));
}

#[tokio::test]
async fn test_shard_drift_is_applied_alone() {
    let fake = Arc::new(FakeElastiCache::with_group(AwsReplicationGroup {
        cluster_enabled: Some(true),
        cache_node_type: Some("cache.t3.small".to_string()),
        node_groups: vec![node_group("0001"), node_group("0002")],
        ..group("available")
    }));
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.num_node_groups = Some(3);
    spec.for_provider.cache_node_type = "cache.m5.large".to_string();
    let mut mr = managed(spec);
    let client = client(&fake);

    let observation = client.observe(&mut mr).await.unwrap();
    assert!(!observation.resource_up_to_date);
    assert!(observation.diff.contains("numNodeGroups"));
    assert!(observation.diff.contains("cacheNodeType"));

    client.update(&mut mr).await.unwrap();

    assert_eq!(
        fake.mutating_calls(),
        vec!["ModifyReplicationGroupShardConfiguration"]
    );
    let resharded = fake.resharded.lock().unwrap();
    assert_eq!(resharded[0].node_group_count, 3);
    assert!(resharded[0].node_groups_to_retain.is_empty());
    assert!(resharded[0].apply_immediately);
}

#[tokio::test]
async fn test_shrinking_retains_the_first_shards() {
    let fake = Arc::new(FakeElastiCache::with_group(AwsReplicationGroup {
        cluster_enabled: Some(true),
        node_groups: vec![node_group("0001"), node_group("0002"), node_group("0003")],
        ..group("available")
    }));
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.num_node_groups = Some(2);
    let mut mr = managed(spec);

    client(&fake).update(&mut mr).await.unwrap();

    let resharded = fake.resharded.lock().unwrap();
    assert_eq!(resharded[0].node_group_count, 2);
    assert_eq!(resharded[0].node_groups_to_retain, vec!["0001", "0002"]);
}

fn replica_group() -> AwsReplicationGroup {
    AwsReplicationGroup {
        cluster_enabled: Some(false),
        member_clusters: vec![
            "cache-001".to_string(),
            "cache-002".to_string(),
            "cache-003".to_string(),
        ],
        ..group("available")
    }
}

async fn update_with_clusters(num_cache_clusters: i32) -> (Arc<FakeElastiCache>, Result<(), ReconcileError>) {
    let fake = Arc::new(FakeElastiCache::with_group(replica_group()));
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.num_cache_clusters = Some(num_cache_clusters);
    let mut mr = managed(spec);
    let result = client(&fake).update(&mut mr).await.map(|_| ());
    (fake, result)
}

#[tokio::test]
async fn test_replica_count_increase() {
    let (fake, result) = update_with_clusters(4).await;

    result.unwrap();
    assert_eq!(fake.mutating_calls(), vec!["IncreaseReplicaCount"]);
    let changes = fake.replica_changes.lock().unwrap();
    assert_eq!(changes[0].replication_group_id, GROUP_ID);
    assert_eq!(changes[0].new_replica_count, 3);
}

#[tokio::test]
async fn test_replica_count_decrease() {
    let (fake, result) = update_with_clusters(2).await;

    result.unwrap();
    assert_eq!(fake.mutating_calls(), vec!["DecreaseReplicaCount"]);
    assert_eq!(fake.replica_changes.lock().unwrap()[0].new_replica_count, 1);
}

#[tokio::test]
async fn test_replica_count_below_minimum_is_rejected() {
    let (fake, result) = update_with_clusters(0).await;

    let err = result.unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidSpec(_)));
    assert_eq!(err.to_string(), ERR_MIN_REPLICAS);
    assert!(fake.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_replica_count_above_maximum_is_rejected() {
    let (fake, result) = update_with_clusters(7).await;

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), ERR_MAX_REPLICAS);
    assert!(fake.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_tag_drift_adds_and_removes() {
    let fake = Arc::new(FakeElastiCache::with_group(AwsReplicationGroup {
        arn: Some(GROUP_ARN.to_string()),
        ..group("available")
    }));
    *fake.tags.lock().unwrap() = BTreeMap::from([
        ("key".to_string(), "val".to_string()),
        ("test".to_string(), "one".to_string()),
    ]);
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.tags = vec![Tag::new("key", "val"), Tag::new("another", "tag")];
    let mut mr = managed(spec);
    let client = client(&fake);

    let observation = client.observe(&mut mr).await.unwrap();
    assert!(!observation.resource_up_to_date);
    assert_eq!(observation.diff, "tags");

    client.update(&mut mr).await.unwrap();

    assert_eq!(
        fake.mutating_calls(),
        vec!["AddTagsToResource", "RemoveTagsFromResource"]
    );
    assert_eq!(
        fake.added_tags.lock().unwrap()[0],
        BTreeMap::from([("another".to_string(), "tag".to_string())])
    );
    assert_eq!(fake.removed_tags.lock().unwrap()[0], vec!["test".to_string()]);
}

#[tokio::test]
async fn test_matching_tags_are_up_to_date() {
    let fake = Arc::new(FakeElastiCache::with_group(AwsReplicationGroup {
        arn: Some(GROUP_ARN.to_string()),
        ..group("available")
    }));
    *fake.tags.lock().unwrap() = BTreeMap::from([("team".to_string(), "platform".to_string())]);
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.tags = vec![Tag::new("team", "platform")];
    let mut mr = managed(spec);

    let observation = client(&fake).observe(&mut mr).await.unwrap();

    assert!(observation.resource_up_to_date);
}

#[tokio::test]
async fn test_late_initialization_fills_unset_parameters() {
    let fake = Arc::new(FakeElastiCache::with_group(AwsReplicationGroup {
        automatic_failover: Some("enabled".to_string()),
        cache_node_type: Some("cache.t3.small".to_string()),
        snapshot_retention_limit: Some(5),
        ..group("available")
    }));
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.snapshot_retention_limit = Some(1);
    let mut mr = managed(spec);

    let observation = client(&fake).observe(&mut mr).await.unwrap();

    assert!(observation.resource_late_initialized);
    let params = &mr.spec.for_provider;
    assert_eq!(params.automatic_failover_enabled, Some(true));
    assert_eq!(params.cache_node_type, "cache.t3.small");
    // Desired values are never overwritten
    assert_eq!(params.snapshot_retention_limit, Some(1));
    assert!(observation.diff.contains("snapshotRetentionLimit"));
}

#[tokio::test]
async fn test_auth_token_is_published_on_create() {
    let fake = Arc::new(FakeElastiCache::default());
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.auth_enabled = Some(true);
    spec.for_provider.replication_group_description = "cache".to_string();
    let mut mr = managed(spec);

    let creation = client(&fake).create(&mut mr).await.unwrap();

    let password = creation.connection_details.get("password").unwrap();
    assert!(!password.is_empty());
    let created = fake.created.lock().unwrap();
    assert_eq!(created[0].replication_group_id, GROUP_ID);
    assert_eq!(
        created[0].auth_token.as_deref().map(str::as_bytes),
        Some(password.as_slice())
    );
}

#[tokio::test]
async fn test_existing_group_publishes_no_auth_token() {
    let fake = Arc::new(FakeElastiCache::default());
    *fake.create_error.lock().unwrap() = Some(AwsError::from_code(
        "ReplicationGroupAlreadyExists",
        "Replication group cache already exists",
    ));
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.auth_enabled = Some(true);
    let mut mr = managed(spec);

    let creation = client(&fake).create(&mut mr).await.unwrap();

    assert!(creation.connection_details.is_empty());
}

#[tokio::test]
async fn test_create_without_auth_has_no_token() {
    let fake = Arc::new(FakeElastiCache::default());
    let mut mr = managed(ReplicationGroupSpec::default());

    let creation = client(&fake).create(&mut mr).await.unwrap();

    assert!(creation.connection_details.is_empty());
    assert_eq!(fake.created.lock().unwrap()[0].auth_token, None);
}

#[tokio::test]
async fn test_delete_is_skipped_while_deleting() {
    let fake = Arc::new(FakeElastiCache::with_group(group("deleting")));
    let mut mr = managed(ReplicationGroupSpec::default());
    client(&fake).observe(&mut mr).await.unwrap();

    client(&fake).delete(&mut mr).await.unwrap();

    assert!(fake.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_delete_tolerates_missing_group() {
    let fake = Arc::new(FakeElastiCache::default());
    let mut mr = managed(ReplicationGroupSpec::default());

    client(&fake).delete(&mut mr).await.unwrap();

    assert_eq!(fake.mutating_calls(), vec!["DeleteReplicationGroup"]);
}
