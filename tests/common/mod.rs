//! Shared fakes for the integration tests: in-memory AWS gateways, a
//! recording control plane, a counting connector and a static reference
//! reader.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use provider_aws::aws::elasticache::{
    CacheCluster, CacheSubnetGroup, CacheSubnetGroupInput, CreateCacheClusterInput,
    CreateReplicationGroupInput, ModifyCacheClusterInput, ModifyReplicationGroupInput,
    ModifyShardConfigurationInput, ReplicaCountInput, ReplicationGroup,
};
use provider_aws::aws::servicecatalog::{
    ProductView, ProvisionProductInput, ProvisionedProductDetail, RecordDetail, RecordOutput,
    UpdateProvisionedProductInput,
};
use provider_aws::aws::{AwsError, ElastiCacheGateway, S3Gateway, ServiceCatalogGateway};
use provider_aws::config::ControllerConfig;
use provider_aws::constants::ANNOTATION_EXTERNAL_CREATE_SUCCEEDED;
use provider_aws::crd::s3::{CorsRule, ServerSideEncryptionRule};
use provider_aws::managed::{ConnectionDetails, Connector, ControlPlane, ExternalClient, Managed, ReconcileError};
use provider_aws::reference::{Candidate, ReferenceError, ReferenceReader, Target};

/// Calls recorded by a fake, in order
pub type CallLog = Arc<Mutex<Vec<String>>>;

fn record(log: &CallLog, call: impl Into<String>) {
    log.lock().unwrap().push(call.into());
}

/// Object metadata of a freshly applied cluster-scoped object
pub fn meta(name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        uid: Some(format!("uid-{name}")),
        resource_version: Some("1".to_string()),
        ..ObjectMeta::default()
    }
}

pub fn test_config() -> ControllerConfig {
    ControllerConfig::default()
}

// ElastiCache

#[derive(Default)]
pub struct FakeElastiCache {
    pub calls: CallLog,
    pub group: Mutex<Option<ReplicationGroup>>,
    pub clusters: Mutex<BTreeMap<String, CacheCluster>>,
    pub tags: Mutex<BTreeMap<String, String>>,
    pub create_error: Mutex<Option<AwsError>>,
    pub created: Mutex<Vec<CreateReplicationGroupInput>>,
    pub modified: Mutex<Vec<ModifyReplicationGroupInput>>,
    pub resharded: Mutex<Vec<ModifyShardConfigurationInput>>,
    pub replica_changes: Mutex<Vec<ReplicaCountInput>>,
    pub added_tags: Mutex<Vec<BTreeMap<String, String>>>,
    pub removed_tags: Mutex<Vec<Vec<String>>>,
}

impl FakeElastiCache {
    pub fn with_group(group: ReplicationGroup) -> Self {
        let fake = Self::default();
        *fake.group.lock().unwrap() = Some(group);
        fake
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that change AWS state
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("Describe") && !c.starts_with("ListTags"))
            .collect()
    }
}

#[async_trait]
impl ElastiCacheGateway for FakeElastiCache {
    async fn describe_replication_group(&self, id: &str) -> Result<ReplicationGroup, AwsError> {
        record(&self.calls, "DescribeReplicationGroups");
        self.group
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AwsError::not_found(format!("replication group {id} not found")))
    }

    async fn create_replication_group(
        &self,
        input: CreateReplicationGroupInput,
    ) -> Result<(), AwsError> {
        record(&self.calls, "CreateReplicationGroup");
        self.created.lock().unwrap().push(input);
        self.create_error.lock().unwrap().take().map_or(Ok(()), Err)
    }

    async fn modify_replication_group(
        &self,
        input: ModifyReplicationGroupInput,
    ) -> Result<(), AwsError> {
        record(&self.calls, "ModifyReplicationGroup");
        self.modified.lock().unwrap().push(input);
        Ok(())
    }

    async fn modify_replication_group_shard_configuration(
        &self,
        input: ModifyShardConfigurationInput,
    ) -> Result<(), AwsError> {
        record(&self.calls, "ModifyReplicationGroupShardConfiguration");
        self.resharded.lock().unwrap().push(input);
        Ok(())
    }

    async fn increase_replica_count(&self, input: ReplicaCountInput) -> Result<(), AwsError> {
        record(&self.calls, "IncreaseReplicaCount");
        self.replica_changes.lock().unwrap().push(input);
        Ok(())
    }

    async fn decrease_replica_count(&self, input: ReplicaCountInput) -> Result<(), AwsError> {
        record(&self.calls, "DecreaseReplicaCount");
        self.replica_changes.lock().unwrap().push(input);
        Ok(())
    }

    async fn delete_replication_group(&self, id: &str) -> Result<(), AwsError> {
        record(&self.calls, "DeleteReplicationGroup");
        if self.group.lock().unwrap().is_none() {
            return Err(AwsError::not_found(format!("replication group {id} not found")));
        }
        Ok(())
    }

    async fn describe_cache_cluster(&self, id: &str) -> Result<CacheCluster, AwsError> {
        record(&self.calls, "DescribeCacheClusters");
        self.clusters
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| AwsError::not_found(format!("cache cluster {id} not found")))
    }

    async fn create_cache_cluster(&self, _input: CreateCacheClusterInput) -> Result<(), AwsError> {
        record(&self.calls, "CreateCacheCluster");
        Ok(())
    }

    async fn modify_cache_cluster(&self, _input: ModifyCacheClusterInput) -> Result<(), AwsError> {
        record(&self.calls, "ModifyCacheCluster");
        Ok(())
    }

    async fn delete_cache_cluster(&self, _id: &str) -> Result<(), AwsError> {
        record(&self.calls, "DeleteCacheCluster");
        Ok(())
    }

    async fn describe_cache_subnet_group(&self, name: &str) -> Result<CacheSubnetGroup, AwsError> {
        record(&self.calls, "DescribeCacheSubnetGroups");
        Err(AwsError::not_found(format!("cache subnet group {name} not found")))
    }

    async fn create_cache_subnet_group(&self, _input: CacheSubnetGroupInput) -> Result<(), AwsError> {
        record(&self.calls, "CreateCacheSubnetGroup");
        Ok(())
    }

    async fn modify_cache_subnet_group(&self, _input: CacheSubnetGroupInput) -> Result<(), AwsError> {
        record(&self.calls, "ModifyCacheSubnetGroup");
        Ok(())
    }

    async fn delete_cache_subnet_group(&self, _name: &str) -> Result<(), AwsError> {
        record(&self.calls, "DeleteCacheSubnetGroup");
        Ok(())
    }

    async fn list_tags(&self, _arn: &str) -> Result<BTreeMap<String, String>, AwsError> {
        record(&self.calls, "ListTagsForResource");
        Ok(self.tags.lock().unwrap().clone())
    }

    async fn add_tags(&self, _arn: &str, tags: &BTreeMap<String, String>) -> Result<(), AwsError> {
        record(&self.calls, "AddTagsToResource");
        self.added_tags.lock().unwrap().push(tags.clone());
        Ok(())
    }

    async fn remove_tags(&self, _arn: &str, keys: &[String]) -> Result<(), AwsError> {
        record(&self.calls, "RemoveTagsFromResource");
        self.removed_tags.lock().unwrap().push(keys.to_vec());
        Ok(())
    }
}

// Service Catalog

#[derive(Default)]
pub struct FakeServiceCatalog {
    pub calls: CallLog,
    pub detail: Mutex<Option<ProvisionedProductDetail>>,
    pub record_type: Mutex<Option<String>>,
    pub outputs: Mutex<Vec<RecordOutput>>,
    pub stack_parameters: Mutex<BTreeMap<String, String>>,
    pub product: Mutex<ProductView>,
    pub provisioned: Mutex<Vec<ProvisionProductInput>>,
    pub updated: Mutex<Vec<UpdateProvisionedProductInput>>,
    pub terminate_tokens: Mutex<Vec<String>>,
}

impl FakeServiceCatalog {
    pub fn with_detail(detail: ProvisionedProductDetail) -> Self {
        let fake = Self::default();
        *fake.detail.lock().unwrap() = Some(detail);
        fake
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceCatalogGateway for FakeServiceCatalog {
    async fn describe_provisioned_product(
        &self,
        name: &str,
        _accept_language: Option<&str>,
    ) -> Result<ProvisionedProductDetail, AwsError> {
        record(&self.calls, "DescribeProvisionedProduct");
        self.detail
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AwsError::not_found(format!("provisioned product {name} not found")))
    }

    async fn describe_record(
        &self,
        record_id: &str,
        _accept_language: Option<&str>,
    ) -> Result<RecordDetail, AwsError> {
        record(&self.calls, "DescribeRecord");
        Ok(RecordDetail {
            record_id: Some(record_id.to_string()),
            record_type: self.record_type.lock().unwrap().clone(),
            ..RecordDetail::default()
        })
    }

    async fn describe_product(
        &self,
        _product_id: Option<&str>,
        _product_name: Option<&str>,
        _accept_language: Option<&str>,
    ) -> Result<ProductView, AwsError> {
        record(&self.calls, "DescribeProduct");
        Ok(self.product.lock().unwrap().clone())
    }

    async fn get_provisioned_product_outputs(
        &self,
        _provisioned_product_id: &str,
        _accept_language: Option<&str>,
    ) -> Result<Vec<RecordOutput>, AwsError> {
        record(&self.calls, "GetProvisionedProductOutputs");
        Ok(self.outputs.lock().unwrap().clone())
    }

    async fn provision_product(&self, input: ProvisionProductInput) -> Result<RecordDetail, AwsError> {
        record(&self.calls, "ProvisionProduct");
        let name = input.provisioned_product_name.clone();
        self.provisioned.lock().unwrap().push(input);
        Ok(RecordDetail {
            record_type: Some("PROVISION_PRODUCT".to_string()),
            provisioned_product_name: Some(name),
            ..RecordDetail::default()
        })
    }

    async fn update_provisioned_product(
        &self,
        input: UpdateProvisionedProductInput,
    ) -> Result<RecordDetail, AwsError> {
        record(&self.calls, "UpdateProvisionedProduct");
        self.updated.lock().unwrap().push(input);
        Ok(RecordDetail::default())
    }

    async fn terminate_provisioned_product(
        &self,
        _name: &str,
        terminate_token: &str,
        _accept_language: Option<&str>,
    ) -> Result<RecordDetail, AwsError> {
        record(&self.calls, "TerminateProvisionedProduct");
        self.terminate_tokens
            .lock()
            .unwrap()
            .push(terminate_token.to_string());
        Ok(RecordDetail::default())
    }

    async fn stack_parameters(&self, _stack_arn: &str) -> Result<BTreeMap<String, String>, AwsError> {
        record(&self.calls, "DescribeStacks");
        Ok(self.stack_parameters.lock().unwrap().clone())
    }
}

// S3

/// A single bucket held in memory
#[derive(Default)]
pub struct FakeS3 {
    pub calls: CallLog,
    pub exists: Mutex<bool>,
    pub accelerate: Mutex<Option<String>>,
    pub cors: Mutex<Vec<CorsRule>>,
    pub payer: Mutex<Option<String>>,
    pub encryption: Mutex<Vec<ServerSideEncryptionRule>>,
    pub tagging: Mutex<BTreeMap<String, String>>,
    pub versioning: Mutex<Option<String>>,
}

impl FakeS3 {
    pub fn existing() -> Self {
        let fake = Self::default();
        *fake.exists.lock().unwrap() = true;
        *fake.payer.lock().unwrap() = Some("BucketOwner".to_string());
        fake
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("Put") || c.starts_with("Delete") || c.starts_with("Create"))
            .collect()
    }
}

#[async_trait]
impl S3Gateway for FakeS3 {
    async fn head_bucket(&self, bucket: &str) -> Result<(), AwsError> {
        record(&self.calls, "HeadBucket");
        if *self.exists.lock().unwrap() {
            Ok(())
        } else {
            Err(AwsError::not_found(format!("bucket {bucket} not found")))
        }
    }

    async fn create_bucket(
        &self,
        _bucket: &str,
        location_constraint: Option<&str>,
        _acl: Option<&str>,
    ) -> Result<(), AwsError> {
        record(
            &self.calls,
            format!("CreateBucket {}", location_constraint.unwrap_or("-")),
        );
        *self.exists.lock().unwrap() = true;
        Ok(())
    }

    async fn delete_bucket(&self, _bucket: &str) -> Result<(), AwsError> {
        record(&self.calls, "DeleteBucket");
        *self.exists.lock().unwrap() = false;
        Ok(())
    }

    async fn get_bucket_accelerate(&self, _bucket: &str) -> Result<Option<String>, AwsError> {
        record(&self.calls, "GetBucketAccelerateConfiguration");
        Ok(self.accelerate.lock().unwrap().clone())
    }

    async fn put_bucket_accelerate(&self, _bucket: &str, status: &str) -> Result<(), AwsError> {
        record(&self.calls, format!("PutBucketAccelerateConfiguration {status}"));
        *self.accelerate.lock().unwrap() = Some(status.to_string());
        Ok(())
    }

    async fn get_bucket_cors(&self, _bucket: &str) -> Result<Vec<CorsRule>, AwsError> {
        record(&self.calls, "GetBucketCors");
        Ok(self.cors.lock().unwrap().clone())
    }

    async fn put_bucket_cors(&self, _bucket: &str, rules: &[CorsRule]) -> Result<(), AwsError> {
        record(&self.calls, "PutBucketCors");
        *self.cors.lock().unwrap() = rules.to_vec();
        Ok(())
    }

    async fn delete_bucket_cors(&self, _bucket: &str) -> Result<(), AwsError> {
        record(&self.calls, "DeleteBucketCors");
        self.cors.lock().unwrap().clear();
        Ok(())
    }

    async fn get_bucket_request_payment(&self, _bucket: &str) -> Result<Option<String>, AwsError> {
        record(&self.calls, "GetBucketRequestPayment");
        Ok(self.payer.lock().unwrap().clone())
    }

    async fn put_bucket_request_payment(&self, _bucket: &str, payer: &str) -> Result<(), AwsError> {
        record(&self.calls, format!("PutBucketRequestPayment {payer}"));
        *self.payer.lock().unwrap() = Some(payer.to_string());
        Ok(())
    }

    async fn get_bucket_encryption(
        &self,
        _bucket: &str,
    ) -> Result<Vec<ServerSideEncryptionRule>, AwsError> {
        record(&self.calls, "GetBucketEncryption");
        Ok(self.encryption.lock().unwrap().clone())
    }

    async fn put_bucket_encryption(
        &self,
        _bucket: &str,
        rules: &[ServerSideEncryptionRule],
    ) -> Result<(), AwsError> {
        record(&self.calls, "PutBucketEncryption");
        *self.encryption.lock().unwrap() = rules.to_vec();
        Ok(())
    }

    async fn delete_bucket_encryption(&self, _bucket: &str) -> Result<(), AwsError> {
        record(&self.calls, "DeleteBucketEncryption");
        self.encryption.lock().unwrap().clear();
        Ok(())
    }

    async fn get_bucket_tagging(&self, _bucket: &str) -> Result<BTreeMap<String, String>, AwsError> {
        record(&self.calls, "GetBucketTagging");
        Ok(self.tagging.lock().unwrap().clone())
    }

    async fn put_bucket_tagging(
        &self,
        _bucket: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), AwsError> {
        record(&self.calls, "PutBucketTagging");
        *self.tagging.lock().unwrap() = tags.clone();
        Ok(())
    }

    async fn delete_bucket_tagging(&self, _bucket: &str) -> Result<(), AwsError> {
        record(&self.calls, "DeleteBucketTagging");
        self.tagging.lock().unwrap().clear();
        Ok(())
    }

    async fn get_bucket_versioning(&self, _bucket: &str) -> Result<Option<String>, AwsError> {
        record(&self.calls, "GetBucketVersioning");
        Ok(self.versioning.lock().unwrap().clone())
    }

    async fn put_bucket_versioning(&self, _bucket: &str, status: &str) -> Result<(), AwsError> {
        record(&self.calls, format!("PutBucketVersioning {status}"));
        *self.versioning.lock().unwrap() = Some(status.to_string());
        Ok(())
    }
}

// Control plane

/// Records every write back to the Kubernetes API
pub struct FakeControlPlane<R> {
    pub updates: Mutex<Vec<R>>,
    pub status_patches: Mutex<Vec<serde_json::Value>>,
    pub published: Mutex<Vec<ConnectionDetails>>,
    /// Fail every update that records a successful creation
    pub reject_create_succeeded: AtomicBool,
}

impl<R> Default for FakeControlPlane<R> {
    fn default() -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            status_patches: Mutex::new(Vec::new()),
            published: Mutex::new(Vec::new()),
            reject_create_succeeded: AtomicBool::new(false),
        }
    }
}

impl<R: Clone> FakeControlPlane<R> {
    pub fn last_update(&self) -> Option<R> {
        self.updates.lock().unwrap().last().cloned()
    }

    pub fn last_status(&self) -> Option<serde_json::Value> {
        self.status_patches.lock().unwrap().last().cloned()
    }

    /// Every published key, merged in publish order
    pub fn secret(&self) -> ConnectionDetails {
        let mut merged = ConnectionDetails::new();
        for details in self.published.lock().unwrap().iter() {
            merged.extend(details.clone());
        }
        merged
    }
}

#[async_trait]
impl<R: Managed> ControlPlane<R> for FakeControlPlane<R> {
    async fn update(&self, mr: &R) -> Result<R, kube::Error> {
        if self.reject_create_succeeded.load(Ordering::SeqCst)
            && mr.annotations().contains_key(ANNOTATION_EXTERNAL_CREATE_SUCCEEDED)
        {
            let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
            return Err(kube::Error::SerdeError(err));
        }
        let mut updates = self.updates.lock().unwrap();
        let mut stored = mr.clone();
        stored.meta_mut().resource_version = Some((updates.len() + 2).to_string());
        updates.push(stored.clone());
        Ok(stored)
    }

    async fn patch_status(&self, _mr: &R, status: serde_json::Value) -> Result<(), kube::Error> {
        self.status_patches.lock().unwrap().push(status);
        Ok(())
    }

    async fn publish_connection_details(
        &self,
        _mr: &R,
        details: &ConnectionDetails,
    ) -> Result<bool, kube::Error> {
        self.published.lock().unwrap().push(details.clone());
        Ok(true)
    }
}

// Connector

type ClientFactory<R> = dyn Fn() -> Box<dyn ExternalClient<R>> + Send + Sync;

/// Hands out clients from a factory and counts connections
pub struct FakeConnector<R: Managed> {
    factory: Box<ClientFactory<R>>,
    pub connects: AtomicUsize,
}

impl<R: Managed> FakeConnector<R> {
    pub fn new(factory: impl Fn() -> Box<dyn ExternalClient<R>> + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<R: Managed> Connector<R> for FakeConnector<R> {
    async fn connect(&self, _mr: &R) -> Result<Box<dyn ExternalClient<R>>, ReconcileError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok((self.factory)())
    }
}

// References

/// Referenceable objects keyed by kind and name
#[derive(Default)]
pub struct FakeReferences {
    pub objects: Mutex<BTreeMap<(String, String), Candidate>>,
}

impl FakeReferences {
    pub fn with(self, target: &Target, candidate: Candidate) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert((target.kind.to_string(), candidate.name.clone()), candidate);
        self
    }
}

#[async_trait]
impl ReferenceReader for FakeReferences {
    async fn get(&self, target: &Target, name: &str) -> Result<Option<Candidate>, ReferenceError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(&(target.kind.to_string(), name.to_string()))
            .cloned())
    }

    async fn list(
        &self,
        target: &Target,
        _labels: &BTreeMap<String, String>,
    ) -> Result<Vec<Candidate>, ReferenceError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|((kind, _), _)| kind == target.kind)
            .map(|(_, c)| c.clone())
            .collect())
    }
}
