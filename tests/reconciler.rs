//! # Managed Reconciler Tests
//!
//! Full reconciliation passes for a replication group, with the Kubernetes
//! API and ElastiCache replaced by in-memory fakes.
//!
//! These tests verify:
//! - The first pass names, tags, finalizes and creates the resource
//! - Create is idempotent and guarded by the create-pending annotations
//! - Unresolved references stop the pass before any AWS call
//! - Deletion honours the deletion policy and waits for AWS
//! - Failures are recorded on the Synced condition
//! - Late initialization is written back only when management policies allow it
//! - A generated password reaches the secret even if recording the creation fails

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{FakeConnector, FakeControlPlane, FakeElastiCache, FakeReferences};
use kube::ResourceExt;
use kube_runtime::controller::Action;
use provider_aws::aws::elasticache::{Endpoint, NodeGroup, ReplicationGroup as AwsReplicationGroup};
use provider_aws::aws::AwsError;
use provider_aws::config::ControllerConfig;
use provider_aws::constants::{
    ANNOTATION_EXTERNAL_CREATE_PENDING, ANNOTATION_EXTERNAL_CREATE_SUCCEEDED,
    ANNOTATION_EXTERNAL_NAME, FINALIZER,
};
use provider_aws::controller::elasticache::replication_group::ReplicationGroupClient;
use provider_aws::crd::elasticache::{ReplicationGroupSpec, ReplicationGroupStatus};
use provider_aws::crd::{
    ConditionReason, DeletionPolicy, ManagementAction, Reference, ReplicationGroup,
    CONDITION_READY, CONDITION_SYNCED,
};
use provider_aws::managed::{ExternalClient, ReconcileError, Reconciler};
use provider_aws::reference::{targets, Candidate, ReferenceError};

const NAME: &str = "cache";

struct Harness {
    aws: Arc<FakeElastiCache>,
    control_plane: Arc<FakeControlPlane<ReplicationGroup>>,
    connector: Arc<FakeConnector<ReplicationGroup>>,
    reconciler: Reconciler<ReplicationGroup>,
    config: ControllerConfig,
}

impl Harness {
    fn new(aws: FakeElastiCache, references: FakeReferences) -> Self {
        let aws = Arc::new(aws);
        let gateway = Arc::clone(&aws);
        let connector = Arc::new(FakeConnector::new(move || {
            Box::new(ReplicationGroupClient::new(Arc::clone(&gateway) as _))
                as Box<dyn ExternalClient<ReplicationGroup>>
        }));
        let control_plane = Arc::new(FakeControlPlane::default());
        let config = common::test_config();
        let reconciler = Reconciler::new(
            Arc::clone(&connector) as _,
            Arc::clone(&control_plane) as _,
            Arc::new(references),
            config.clone(),
        );
        Self {
            aws,
            control_plane,
            connector,
            reconciler,
            config,
        }
    }

    async fn reconcile(&self, mr: &ReplicationGroup) -> Result<Action, ReconcileError> {
        self.reconciler.reconcile(Arc::new(mr.clone())).await
    }

    /// The object as the API server would hold it after the last pass
    fn stored(&self, fallback: &ReplicationGroup) -> ReplicationGroup {
        let mut mr = self
            .control_plane
            .last_update()
            .unwrap_or_else(|| fallback.clone());
        if let Some(status) = self.control_plane.last_status() {
            if status.get("atProvider").is_some() {
                mr.status = Some(serde_json::from_value::<ReplicationGroupStatus>(status).unwrap());
            }
        }
        mr
    }

    fn synced(&self) -> serde_json::Value {
        let status = self.control_plane.last_status().unwrap();
        status["conditions"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["type"] == CONDITION_SYNCED)
            .cloned()
            .unwrap()
    }
}

fn managed(spec: ReplicationGroupSpec) -> ReplicationGroup {
    let mut mr = ReplicationGroup::new(NAME, spec);
    mr.metadata = common::meta(NAME);
    mr
}

fn available_group() -> AwsReplicationGroup {
    AwsReplicationGroup {
        replication_group_id: NAME.to_string(),
        status: Some("available".to_string()),
        cluster_enabled: Some(false),
        node_groups: vec![NodeGroup {
            node_group_id: Some("0001".to_string()),
            primary_endpoint: Some(Endpoint {
                address: Some("cache.local".to_string()),
                port: Some(6379),
            }),
            ..NodeGroup::default()
        }],
        ..AwsReplicationGroup::default()
    }
}

/// Mark `mr` as being deleted by the API server.
fn deleting(mut mr: ReplicationGroup) -> ReplicationGroup {
    mr.metadata = serde_json::from_value(serde_json::json!({
        "name": NAME,
        "uid": format!("uid-{NAME}"),
        "resourceVersion": "7",
        "deletionTimestamp": "2026-01-01T00:00:00Z",
        "finalizers": [FINALIZER],
        "annotations": { ANNOTATION_EXTERNAL_NAME: NAME },
    }))
    .unwrap();
    mr
}

#[tokio::test]
async fn test_first_pass_creates_the_resource() {
    let h = Harness::new(FakeElastiCache::default(), FakeReferences::default());
    let mr = managed(ReplicationGroupSpec::default());

    let action = h.reconcile(&mr).await.unwrap();

    assert_eq!(action, Action::requeue(h.config.short_wait));
    assert_eq!(h.aws.mutating_calls(), vec!["CreateReplicationGroup"]);

    let stored = h.stored(&mr);
    assert_eq!(stored.annotations().get(ANNOTATION_EXTERNAL_NAME).map(String::as_str), Some(NAME));
    assert!(stored.annotations().contains_key(ANNOTATION_EXTERNAL_CREATE_PENDING));
    assert!(stored.annotations().contains_key(ANNOTATION_EXTERNAL_CREATE_SUCCEEDED));
    assert!(stored.finalizers().iter().any(|f| f == FINALIZER));

    // Provider-managed tags are sent with the create call
    let created = h.aws.created.lock().unwrap();
    assert_eq!(created[0].tags.get("managed-by").map(String::as_str), Some("provider-aws"));
    assert_eq!(
        created[0].tags.get("provider-kind").map(String::as_str),
        Some("ReplicationGroup")
    );
    assert_eq!(created[0].tags.get("external-name").map(String::as_str), Some(NAME));
}

#[tokio::test]
async fn test_already_existing_resource_is_adopted() {
    let aws = FakeElastiCache::default();
    *aws.create_error.lock().unwrap() = Some(AwsError::from_code(
        "ReplicationGroupAlreadyExists",
        "Replication group cache already exists",
    ));
    let h = Harness::new(aws, FakeReferences::default());
    let mr = managed(ReplicationGroupSpec::default());

    let action = h.reconcile(&mr).await.unwrap();
    assert_eq!(action, Action::requeue(h.config.short_wait));

    // The next pass observes the existing group
    *h.aws.group.lock().unwrap() = Some(available_group());
    let stored = h.stored(&mr);
    let action = h.reconcile(&stored).await.unwrap();

    assert_eq!(action, Action::requeue(h.config.poll_interval));
    assert_eq!(h.aws.mutating_calls(), vec!["CreateReplicationGroup"]);
    assert_eq!(h.synced()["reason"], ConditionReason::ReconcileSuccess.as_str());
    assert_eq!(
        h.control_plane.secret().get("endpoint"),
        Some(&b"cache.local".to_vec())
    );
}

#[tokio::test]
async fn test_password_is_published_once() {
    let h = Harness::new(FakeElastiCache::default(), FakeReferences::default());
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.auth_enabled = Some(true);
    let mr = managed(spec);

    h.reconcile(&mr).await.unwrap();
    let password = h.control_plane.secret().get("password").cloned().unwrap();

    *h.aws.group.lock().unwrap() = Some(AwsReplicationGroup {
        auth_token_enabled: Some(true),
        ..available_group()
    });
    let stored = h.stored(&mr);
    h.reconcile(&stored).await.unwrap();
    h.reconcile(&h.stored(&stored)).await.unwrap();

    let published_passwords = h
        .control_plane
        .published
        .lock()
        .unwrap()
        .iter()
        .filter(|d| d.contains_key("password"))
        .count();
    assert_eq!(published_passwords, 1);
    assert_eq!(h.control_plane.secret().get("password"), Some(&password));
    assert_eq!(h.aws.created.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_password_survives_failed_create_bookkeeping() {
    let h = Harness::new(FakeElastiCache::default(), FakeReferences::default());
    h.control_plane
        .reject_create_succeeded
        .store(true, Ordering::SeqCst);
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.auth_enabled = Some(true);
    let mr = managed(spec);

    let err = h.reconcile(&mr).await.unwrap_err();

    assert!(matches!(err, ReconcileError::Kube { .. }));
    assert_eq!(h.aws.created.lock().unwrap().len(), 1);
    let token = h.aws.created.lock().unwrap()[0].auth_token.clone().unwrap();
    assert_eq!(
        h.control_plane.secret().get("password"),
        Some(&token.into_bytes())
    );
}

#[tokio::test]
async fn test_incomplete_create_is_not_retried() {
    let h = Harness::new(FakeElastiCache::default(), FakeReferences::default());
    let mut mr = managed(ReplicationGroupSpec::default());
    mr.annotations_mut().insert(
        ANNOTATION_EXTERNAL_CREATE_PENDING.to_string(),
        "2026-01-01T00:00:00Z".to_string(),
    );

    let err = h.reconcile(&mr).await.unwrap_err();

    assert!(matches!(err, ReconcileError::CreateIncomplete));
    assert!(h.aws.mutating_calls().is_empty());
    let synced = h.synced();
    assert_eq!(synced["status"], "False");
    assert_eq!(synced["reason"], ConditionReason::ReconcileError.as_str());
}

#[tokio::test]
async fn test_unresolved_reference_blocks_aws_calls() {
    let h = Harness::new(FakeElastiCache::default(), FakeReferences::default());
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.cache_subnet_group_name_ref = Some(Reference {
        name: "private".to_string(),
    });
    let mr = managed(spec);

    let err = h.reconcile(&mr).await.unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::References(ReferenceError::NotFound { kind: "CacheSubnetGroup", .. })
    ));
    assert_eq!(h.connector.connects(), 0);
    assert!(h.aws.calls().is_empty());
    assert!(h.control_plane.updates.lock().unwrap().is_empty());
    assert_eq!(
        h.synced()["message"],
        "cannot resolve references: referenced CacheSubnetGroup private not found"
    );
}

#[tokio::test]
async fn test_unready_reference_blocks_aws_calls() {
    let references = FakeReferences::default().with(
        &targets::CACHE_SUBNET_GROUP,
        Candidate {
            name: "private".to_string(),
            ready: false,
            value: Some("private-subnets".to_string()),
            controller_uid: None,
        },
    );
    let h = Harness::new(FakeElastiCache::default(), references);
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.cache_subnet_group_name_ref = Some(Reference {
        name: "private".to_string(),
    });

    let err = h.reconcile(&managed(spec)).await.unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::References(ReferenceError::NotReady { .. })
    ));
    assert_eq!(h.connector.connects(), 0);
}

#[tokio::test]
async fn test_resolved_reference_is_written_back_and_used() {
    let references = FakeReferences::default().with(
        &targets::CACHE_SUBNET_GROUP,
        Candidate {
            name: "private".to_string(),
            ready: true,
            value: Some("private-subnets".to_string()),
            controller_uid: None,
        },
    );
    let h = Harness::new(FakeElastiCache::default(), references);
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.cache_subnet_group_name_ref = Some(Reference {
        name: "private".to_string(),
    });
    let mr = managed(spec);

    h.reconcile(&mr).await.unwrap();

    let first_update = h.control_plane.updates.lock().unwrap()[0].clone();
    assert_eq!(
        first_update.spec.for_provider.cache_subnet_group_name.as_deref(),
        Some("private-subnets")
    );
    assert_eq!(
        h.aws.created.lock().unwrap()[0].cache_subnet_group_name.as_deref(),
        Some("private-subnets")
    );
}

#[tokio::test]
async fn test_orphan_releases_without_deleting() {
    let h = Harness::new(
        FakeElastiCache::with_group(available_group()),
        FakeReferences::default(),
    );
    let mut spec = ReplicationGroupSpec::default();
    spec.resource.deletion_policy = DeletionPolicy::Orphan;
    let mr = deleting(managed(spec));

    let action = h.reconcile(&mr).await.unwrap();

    assert_eq!(action, Action::await_change());
    assert_eq!(h.connector.connects(), 0);
    assert!(h.aws.calls().is_empty());
    assert!(h.stored(&mr).finalizers().is_empty());
}

#[tokio::test]
async fn test_delete_waits_for_aws_before_releasing() {
    let h = Harness::new(
        FakeElastiCache::with_group(available_group()),
        FakeReferences::default(),
    );
    let mr = deleting(managed(ReplicationGroupSpec::default()));

    let action = h.reconcile(&mr).await.unwrap();
    assert_eq!(action, Action::requeue(h.config.short_wait));
    assert_eq!(h.aws.mutating_calls(), vec!["DeleteReplicationGroup"]);
    let status = h.control_plane.last_status().unwrap();
    let ready = status["conditions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["type"] == CONDITION_READY)
        .cloned()
        .unwrap();
    assert_eq!(ready["reason"], ConditionReason::Deleting.as_str());

    // AWS is deleting: no second delete call
    h.aws.group.lock().unwrap().as_mut().unwrap().status = Some("deleting".to_string());
    h.reconcile(&mr).await.unwrap();
    assert_eq!(h.aws.mutating_calls(), vec!["DeleteReplicationGroup"]);

    // Gone: the finalizer is released
    *h.aws.group.lock().unwrap() = None;
    let action = h.reconcile(&mr).await.unwrap();
    assert_eq!(action, Action::await_change());
    assert!(h.stored(&mr).finalizers().is_empty());
}

#[tokio::test]
async fn test_observe_only_policy_ignores_drift() {
    let h = Harness::new(
        FakeElastiCache::with_group(available_group()),
        FakeReferences::default(),
    );
    let mut spec = ReplicationGroupSpec::default();
    spec.resource.management_policies = vec![ManagementAction::Observe];
    spec.for_provider.num_node_groups = Some(2);
    let mr = managed(spec);

    let action = h.reconcile(&mr).await.unwrap();

    assert_eq!(action, Action::requeue(h.config.poll_interval));
    assert!(h.aws.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_observe_only_policy_skips_late_initialization() {
    let h = Harness::new(
        FakeElastiCache::with_group(AwsReplicationGroup {
            cache_node_type: Some("cache.t3.micro".to_string()),
            ..available_group()
        }),
        FakeReferences::default(),
    );
    let mut spec = ReplicationGroupSpec::default();
    spec.resource.management_policies = vec![ManagementAction::Observe];
    let mr = managed(spec);

    h.reconcile(&mr).await.unwrap();

    let stored = h.control_plane.last_update().unwrap();
    assert!(stored.finalizers().iter().any(|f| f == FINALIZER));
    assert!(stored.spec.for_provider.cache_node_type.is_empty());
    assert!(h.control_plane.last_status().unwrap().get("atProvider").is_some());
}

#[tokio::test]
async fn test_default_policies_write_back_late_initialization() {
    let h = Harness::new(
        FakeElastiCache::with_group(AwsReplicationGroup {
            cache_node_type: Some("cache.t3.micro".to_string()),
            ..available_group()
        }),
        FakeReferences::default(),
    );
    let mr = managed(ReplicationGroupSpec::default());

    h.reconcile(&mr).await.unwrap();

    let stored = h.control_plane.last_update().unwrap();
    assert_eq!(stored.spec.for_provider.cache_node_type, "cache.t3.micro");
}

#[tokio::test]
async fn test_drift_is_updated_and_requeued_soon() {
    let h = Harness::new(
        FakeElastiCache::with_group(available_group()),
        FakeReferences::default(),
    );
    let mut spec = ReplicationGroupSpec::default();
    spec.for_provider.num_node_groups = Some(2);
    let mr = managed(spec);

    let action = h.reconcile(&mr).await.unwrap();

    assert_eq!(action, Action::requeue(h.config.short_wait));
    assert_eq!(
        h.aws.mutating_calls(),
        vec!["ModifyReplicationGroupShardConfiguration"]
    );
}

#[tokio::test]
async fn test_changing_group_is_polled_at_short_wait() {
    let h = Harness::new(
        FakeElastiCache::with_group(AwsReplicationGroup {
            status: Some("modifying".to_string()),
            ..available_group()
        }),
        FakeReferences::default(),
    );

    let action = h.reconcile(&managed(ReplicationGroupSpec::default())).await.unwrap();

    assert_eq!(action, Action::requeue(h.config.short_wait));
    assert!(h.aws.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_aws_failure_is_reported_on_synced() {
    let aws = FakeElastiCache::default();
    *aws.create_error.lock().unwrap() = Some(AwsError::from_code(
        "InvalidParameterValue",
        "Invalid cache node type",
    ));
    let h = Harness::new(aws, FakeReferences::default());

    let err = h
        .reconcile(&managed(ReplicationGroupSpec::default()))
        .await
        .unwrap_err();

    assert!(!err.is_transient());
    let synced = h.synced();
    assert_eq!(synced["status"], "False");
    assert!(synced["message"]
        .as_str()
        .unwrap()
        .starts_with("cannot create replication group"));
}
