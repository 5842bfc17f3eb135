//! # Cache Subnet Group
//!
//! Generated client for ElastiCache subnet groups. Subnet groups have no
//! lifecycle status; an existing group is available.

use async_trait::async_trait;
use std::sync::Arc;

use crate::aws::elasticache::CacheSubnetGroup as AwsCacheSubnetGroup;
use crate::aws::{AwsError, CredentialResolver, ElastiCacheGateway, SdkElastiCache};
use crate::crd::elasticache::CacheSubnetGroupStatus;
use crate::crd::{CacheSubnetGroup, Tag};
use crate::diff::cache_subnet_group as diff;
use crate::managed::generated::{CrudApi, ErrorContext, GeneratedClient, Hooks};
use crate::managed::{managed_envelope, meta, ExternalClient, Managed, ReconcileError, SdkConnector};
use crate::reference::{targets, ReferenceError, Resolver};

#[async_trait]
impl Managed for CacheSubnetGroup {
    managed_envelope!(CacheSubnetGroupStatus);

    fn region(&self) -> Option<&str> {
        self.spec.for_provider.region.as_deref()
    }

    fn tags_mut(&mut self) -> Option<&mut Vec<Tag>> {
        Some(&mut self.spec.for_provider.tags)
    }

    async fn resolve_references(&mut self, resolver: &Resolver<'_>) -> Result<bool, ReferenceError> {
        let p = &mut self.spec.for_provider;
        resolver
            .resolve_list_field(
                &targets::SUBNET,
                &mut p.subnet_ids,
                &p.subnet_id_refs,
                p.subnet_id_selector.as_ref(),
            )
            .await
    }
}

pub fn connector(credentials: Arc<CredentialResolver>) -> SdkConnector<CacheSubnetGroup> {
    SdkConnector::new(credentials, |config| {
        Box::new(client(Arc::new(SdkElastiCache::new(config))))
            as Box<dyn ExternalClient<CacheSubnetGroup>>
    })
}

pub fn client(
    gateway: Arc<dyn ElastiCacheGateway>,
) -> GeneratedClient<CacheSubnetGroup, CacheSubnetGroupApi> {
    GeneratedClient::new(CacheSubnetGroupApi { gateway })
}

pub struct CacheSubnetGroupApi {
    gateway: Arc<dyn ElastiCacheGateway>,
}

impl std::fmt::Debug for CacheSubnetGroupApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSubnetGroupApi").finish_non_exhaustive()
    }
}

#[async_trait]
impl CrudApi<CacheSubnetGroup> for CacheSubnetGroupApi {
    type Observed = AwsCacheSubnetGroup;

    const CONTEXT: ErrorContext = ErrorContext {
        describe: "cannot describe cache subnet group",
        create: "cannot create cache subnet group",
        update: "cannot modify cache subnet group",
        delete: "cannot delete cache subnet group",
    };

    async fn describe(&self, mr: &CacheSubnetGroup) -> Result<AwsCacheSubnetGroup, AwsError> {
        self.gateway
            .describe_cache_subnet_group(&meta::external_name_or_name(mr))
            .await
    }

    async fn create(&self, mr: &CacheSubnetGroup) -> Result<(), AwsError> {
        let input = diff::generate_input(&meta::external_name_or_name(mr), &mr.spec.for_provider);
        self.gateway.create_cache_subnet_group(input).await
    }

    async fn update(&self, mr: &CacheSubnetGroup, _observed: &AwsCacheSubnetGroup) -> Result<(), AwsError> {
        let input = diff::generate_input(&meta::external_name_or_name(mr), &mr.spec.for_provider);
        self.gateway.modify_cache_subnet_group(input).await
    }

    async fn delete(&self, mr: &CacheSubnetGroup) -> Result<(), AwsError> {
        self.gateway
            .delete_cache_subnet_group(&meta::external_name_or_name(mr))
            .await
    }

    fn status(&self, _observed: &AwsCacheSubnetGroup) -> Option<String> {
        Some(super::STATUS_AVAILABLE.to_string())
    }

    fn set_observation(&self, mr: &mut CacheSubnetGroup, observed: &AwsCacheSubnetGroup) {
        mr.status.get_or_insert_with(Default::default).at_provider =
            diff::generate_observation(observed);
    }
}

impl Hooks<CacheSubnetGroup> for CacheSubnetGroupApi {
    fn late_initialize(&self, mr: &mut CacheSubnetGroup, observed: &AwsCacheSubnetGroup) -> bool {
        diff::late_initialize(&mut mr.spec.for_provider, observed)
    }

    fn is_up_to_date(
        &self,
        mr: &CacheSubnetGroup,
        observed: &AwsCacheSubnetGroup,
    ) -> Result<bool, ReconcileError> {
        Ok(diff::is_up_to_date(&mr.spec.for_provider, observed))
    }

    fn diff(&self, _mr: &CacheSubnetGroup, _observed: &AwsCacheSubnetGroup) -> String {
        "description, subnetIds".to_string()
    }
}
