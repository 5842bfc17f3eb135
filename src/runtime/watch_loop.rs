//! # Watch Loop
//!
//! One kube-runtime controller per managed kind, all sharing the
//! Kubernetes client, credential resolver and reference reader.

use anyhow::Result;
use futures::StreamExt;
use kube::{Api, Client, ResourceExt};
use kube_runtime::controller::{self, Action, Controller};
use kube_runtime::watcher;
use std::sync::Arc;
use tracing::{debug, info};

use super::backoff::BackoffTracker;
use super::error_policy::{error_policy, log_controller_error};
use crate::aws::CredentialResolver;
use crate::config::ControllerConfig;
use crate::controller::{elasticache, s3, servicecatalog};
use crate::crd::{Bucket, CacheCluster, CacheSubnetGroup, ProvisionedProduct, ReplicationGroup};
use crate::managed::{Connector, ControlPlane, KubeControlPlane, Managed, ReconcileError, Reconciler};
use crate::reference::{KubeReferenceReader, ReferenceReader};

/// State handed to every reconcile and error-policy call of one kind.
#[derive(Debug)]
pub struct ControllerContext<R: Managed> {
    pub reconciler: Reconciler<R>,
    pub backoff: BackoffTracker,
}

impl<R: Managed> ControllerContext<R> {
    pub fn new(reconciler: Reconciler<R>) -> Self {
        let config = reconciler.config();
        let backoff = BackoffTracker::new(config.backoff_min, config.backoff_max);
        Self {
            reconciler,
            backoff,
        }
    }
}

async fn reconcile<R: Managed>(
    obj: Arc<R>,
    ctx: Arc<ControllerContext<R>>,
) -> Result<Action, ReconcileError> {
    let name = obj.name_any();
    let action = ctx.reconciler.reconcile(obj).await?;
    ctx.backoff.reset(&name);
    Ok(action)
}

/// Dependencies shared by the controllers of every kind
struct Shared {
    client: Client,
    control_plane: Arc<KubeControlPlane>,
    references: Arc<dyn ReferenceReader>,
    config: ControllerConfig,
}

async fn run_kind<R: Managed>(shared: &Shared, connector: Arc<dyn Connector<R>>) {
    let kind = R::kind(&()).to_string();
    let reconciler = Reconciler::new(
        connector,
        Arc::clone(&shared.control_plane) as Arc<dyn ControlPlane<R>>,
        Arc::clone(&shared.references),
        shared.config.clone(),
    );
    let ctx = Arc::new(ControllerContext::new(reconciler));
    let api: Api<R> = Api::all(shared.client.clone());

    info!(
        resource.kind = %kind,
        concurrency = shared.config.max_reconcile_rate,
        "Starting controller"
    );
    Controller::new(api, watcher::Config::default().any_semantic())
        .with_config(controller::Config::default().concurrency(shared.config.max_reconcile_rate))
        .shutdown_on_signal()
        .run(reconcile::<R>, error_policy::<R>, ctx)
        .for_each(|result| {
            match result {
                Ok((obj, action)) => debug!(resource.kind = %kind, resource.name = %obj.name, ?action, "Reconciled"),
                Err(e) => log_controller_error(&kind, &e),
            }
            futures::future::ready(())
        })
        .await;
    info!(resource.kind = %kind, "Controller stopped");
}

/// Run the controllers of every managed kind until a shutdown signal.
pub async fn run_watch_loop(client: Client, config: ControllerConfig) -> Result<()> {
    let credentials = Arc::new(CredentialResolver::new(
        client.clone(),
        config.default_provider_config.clone(),
    ));
    let shared = Shared {
        control_plane: Arc::new(KubeControlPlane::new(client.clone(), config.provider_name.clone())),
        references: Arc::new(KubeReferenceReader::new(client.clone())),
        client,
        config,
    };
    let provider_name = shared.config.provider_name.clone();

    futures::join!(
        run_kind::<ReplicationGroup>(
            &shared,
            Arc::new(elasticache::replication_group::connector(Arc::clone(&credentials))),
        ),
        run_kind::<CacheCluster>(
            &shared,
            Arc::new(elasticache::cache_cluster::connector(Arc::clone(&credentials))),
        ),
        run_kind::<CacheSubnetGroup>(
            &shared,
            Arc::new(elasticache::cache_subnet_group::connector(Arc::clone(&credentials))),
        ),
        run_kind::<ProvisionedProduct>(
            &shared,
            Arc::new(servicecatalog::provisioned_product::connector(
                Arc::clone(&credentials),
                provider_name,
            )),
        ),
        run_kind::<Bucket>(&shared, Arc::new(s3::bucket::connector(credentials))),
    );

    info!("All controllers stopped");
    Ok(())
}
