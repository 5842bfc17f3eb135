//! # Cache Cluster
//!
//! Generated client for standalone ElastiCache clusters.

use async_trait::async_trait;
use std::sync::Arc;

use super::STATUS_AVAILABLE;
use crate::aws::elasticache::CacheCluster as AwsCacheCluster;
use crate::aws::{AwsError, CredentialResolver, ElastiCacheGateway, SdkElastiCache};
use crate::crd::elasticache::CacheClusterStatus;
use crate::crd::{CacheCluster, Tag};
use crate::diff::cache_cluster as diff;
use crate::managed::connection::endpoint_details;
use crate::managed::generated::{CrudApi, ErrorContext, GeneratedClient, Hooks};
use crate::managed::{
    managed_envelope, meta, ConnectionDetails, ExternalClient, ExternalObservation, Managed,
    ReconcileError, SdkConnector,
};
use crate::reference::{targets, ReferenceError, Resolver};

const STATUS_DELETING: &str = "deleting";

#[async_trait]
impl Managed for CacheCluster {
    managed_envelope!(CacheClusterStatus);

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
        Ok(changed)
    }
}

pub fn connector(credentials: Arc<CredentialResolver>) -> SdkConnector<CacheCluster> {
    SdkConnector::new(credentials, |config| {
        Box::new(client(Arc::new(SdkElastiCache::new(config))))
            as Box<dyn ExternalClient<CacheCluster>>
    })
}

pub fn client(gateway: Arc<dyn ElastiCacheGateway>) -> GeneratedClient<CacheCluster, CacheClusterApi> {
    GeneratedClient::new(CacheClusterApi { gateway })
}

pub struct CacheClusterApi {
    gateway: Arc<dyn ElastiCacheGateway>,
}

impl std::fmt::Debug for CacheClusterApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClusterApi").finish_non_exhaustive()
    }
}

fn available(cc: &AwsCacheCluster) -> bool {
    cc.status.as_deref() == Some(STATUS_AVAILABLE)
}

#[async_trait]
impl CrudApi<CacheCluster> for CacheClusterApi {
    type Observed = AwsCacheCluster;

    const CONTEXT: ErrorContext = ErrorContext {
        describe: "cannot describe cache cluster",
        create: "cannot create cache cluster",
        update: "cannot modify cache cluster",
        delete: "cannot delete cache cluster",
    };

    async fn describe(&self, mr: &CacheCluster) -> Result<AwsCacheCluster, AwsError> {
        self.gateway
            .describe_cache_cluster(&meta::external_name_or_name(mr))
            .await
    }

    async fn create(&self, mr: &CacheCluster) -> Result<(), AwsError> {
        let input = diff::generate_create_input(&meta::external_name_or_name(mr), &mr.spec.for_provider);
        self.gateway.create_cache_cluster(input).await
    }

    async fn update(&self, mr: &CacheCluster, observed: &AwsCacheCluster) -> Result<(), AwsError> {
        let input = diff::generate_modify_input(
            &meta::external_name_or_name(mr),
            &mr.spec.for_provider,
            observed,
        );
        self.gateway.modify_cache_cluster(input).await
    }

    async fn delete(&self, mr: &CacheCluster) -> Result<(), AwsError> {
        self.gateway
            .delete_cache_cluster(&meta::external_name_or_name(mr))
            .await
    }

    fn status(&self, observed: &AwsCacheCluster) -> Option<String> {
        observed.status.clone()
    }

    fn set_observation(&self, mr: &mut CacheCluster, observed: &AwsCacheCluster) {
        mr.status.get_or_insert_with(Default::default).at_provider =
            diff::generate_observation(observed);
    }
}

#[async_trait]
impl Hooks<CacheCluster> for CacheClusterApi {
    fn post_observe(
        &self,
        _mr: &mut CacheCluster,
        observed: &AwsCacheCluster,
        mut observation: ExternalObservation,
    ) -> Result<ExternalObservation, ReconcileError> {
        observation.pending = !available(observed);
        Ok(observation)
    }

    async fn pre_delete(&self, mr: &mut CacheCluster) -> Result<bool, ReconcileError> {
        let status = mr
            .status
            .as_ref()
            .and_then(|s| s.at_provider.cache_cluster_status.as_deref());
        Ok(status != Some(STATUS_DELETING))
    }

    fn late_initialize(&self, mr: &mut CacheCluster, observed: &AwsCacheCluster) -> bool {
        diff::late_initialize(&mut mr.spec.for_provider, observed)
    }

    fn is_up_to_date(&self, mr: &CacheCluster, observed: &AwsCacheCluster) -> Result<bool, ReconcileError> {
        // Modifications are rejected until the cluster is available again
        Ok(!available(observed) || diff::is_up_to_date(&mr.spec.for_provider, observed))
    }

    fn diff(&self, mr: &CacheCluster, observed: &AwsCacheCluster) -> String {
        diff::drifted_fields(&mr.spec.for_provider, observed).join(", ")
    }

    fn connection_details(&self, _mr: &CacheCluster, observed: &AwsCacheCluster) -> ConnectionDetails {
        let endpoint = observed
            .configuration_endpoint
            .as_ref()
            .or_else(|| observed.cache_nodes.first().and_then(|n| n.endpoint.as_ref()));
        endpoint_details(
            endpoint.and_then(|e| e.address.as_deref()),
            endpoint.and_then(|e| e.port),
        )
    }
}
