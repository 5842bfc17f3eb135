//! Connects managed objects to AWS with per-pass credentials.

use async_trait::async_trait;
use aws_config::SdkConfig;
use std::sync::Arc;

use super::{Connector, ExternalClient, Managed, ReconcileError};
use crate::aws::CredentialResolver;

type ClientBuilder<R> = dyn Fn(&SdkConfig) -> Box<dyn ExternalClient<R>> + Send + Sync;

/// [`Connector`] resolving credentials from the object's ProviderConfig and
/// handing the resulting SDK config to a per-kind client builder.
pub struct SdkConnector<R: Managed> {
    credentials: Arc<CredentialResolver>,
    build: Arc<ClientBuilder<R>>,
}

impl<R: Managed> std::fmt::Debug for SdkConnector<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkConnector")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl<R: Managed> SdkConnector<R> {
    pub fn new(
        credentials: Arc<CredentialResolver>,
        build: impl Fn(&SdkConfig) -> Box<dyn ExternalClient<R>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            credentials,
            build: Arc::new(build),
        }
    }
}

#[async_trait]
impl<R: Managed> Connector<R> for SdkConnector<R> {
    async fn connect(&self, mr: &R) -> Result<Box<dyn ExternalClient<R>>, ReconcileError> {
        let config = self
            .credentials
            .resolve(mr.resource_spec(), mr.region(), R::region_scope())
            .await?;
        Ok((self.build)(&config))
    }
}
