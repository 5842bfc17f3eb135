//! # Managed Reconciler
//!
//! One pass over one managed object:
//!
//! 1. Deleting with `Orphan` (or Delete not permitted): release the finalizer
//! 2. Default the external name and inject provider tags
//! 3. Resolve references; unresolved references stop the pass before any AWS call
//! 4. Connect with fresh credentials
//! 5. Observe; late-initialized fields are dropped unless policies allow them
//! 6. Deleting: delete until AWS reports not-found, then release the finalizer
//! 7. Publish observed connection details
//! 8. Add the finalizer
//! 9. Not found: create, guarded by the create-pending annotations; created
//!    connection details are published before the outcome is recorded
//! 10. Write back late-initialized spec fields
//! 11. Up to date: requeue after the poll interval
//! 12. Drifted: update, then requeue after the short wait
//!
//! The kube-runtime controller serializes passes per object, so a pass never
//! races another pass for the same object.

use chrono::Utc;
use kube::{Resource, ResourceExt};
use kube_runtime::controller::Action;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

use super::{meta, ConnectionDetails, Connector, ControlPlane, Managed, ReconcileError};
use crate::config::ControllerConfig;
use crate::crd::{Condition, ConditionReason, DeletionPolicy, ManagementAction, CONDITION_READY};
use crate::diff::tags::{merge_provider_tags, provider_tags};
use crate::observability::metrics;
use crate::reference::{ReferenceReader, Resolver};

pub struct Reconciler<R: Managed> {
    connector: Arc<dyn Connector<R>>,
    control_plane: Arc<dyn ControlPlane<R>>,
    references: Arc<dyn ReferenceReader>,
    config: ControllerConfig,
}

impl<R: Managed> std::fmt::Debug for Reconciler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("kind", &R::kind(&()))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn status_value<R: Managed>(mr: &R) -> Result<Value, ReconcileError> {
    Ok(serde_json::to_value(mr)?
        .get("status")
        .cloned()
        .unwrap_or(Value::Null))
}

fn spec_value<R: Managed>(mr: &R) -> Result<Value, ReconcileError> {
    Ok(serde_json::to_value(mr)?
        .get("spec")
        .cloned()
        .unwrap_or(Value::Null))
}

/// Put back `spec` as it was before Observe, keeping metadata and status.
fn restore_spec<R: Managed>(mr: &mut R, spec: Value) -> Result<(), ReconcileError> {
    let mut value = serde_json::to_value(&*mr)?;
    value["spec"] = spec;
    *mr = serde_json::from_value(value)?;
    Ok(())
}

impl<R: Managed> Reconciler<R> {
    pub fn new(
        connector: Arc<dyn Connector<R>>,
        control_plane: Arc<dyn ControlPlane<R>>,
        references: Arc<dyn ReferenceReader>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            connector,
            control_plane,
            references,
            config,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Run one pass, bounded by the reconcile timeout. Failures are recorded
    /// on the `Synced` condition before being returned.
    pub async fn reconcile(&self, original: Arc<R>) -> Result<Action, ReconcileError> {
        let kind = R::kind(&()).to_string();
        let span = info_span!(
            "controller.reconcile",
            resource.kind = %kind,
            resource.name = %original.name_any(),
            external_name = tracing::field::Empty,
        );
        if let Some(name) = meta::external_name(original.as_ref()) {
            span.record("external_name", name);
        }

        metrics::increment_reconciliations(&kind);
        let start = Instant::now();
        let timeout = self.config.reconcile_timeout;
        let result = async {
            tokio::time::timeout(timeout, self.run(original.as_ref().clone(), &kind))
                .await
                .unwrap_or_else(|_| Err(ReconcileError::Timeout(timeout)))
        }
        .instrument(span.clone())
        .await;
        metrics::observe_reconciliation_duration(&kind, start.elapsed().as_secs_f64());

        if let Err(err) = &result {
            self.report_error(&original, &kind, err).instrument(span).await;
        }
        result
    }

    async fn run(&self, mut mr: R, kind: &str) -> Result<Action, ReconcileError> {
        let spec = mr.resource_spec().clone();
        let deleting = meta::is_deleting(&mr);
        let initial_status = status_value(&mr)?;

        if deleting
            && (spec.deletion_policy == DeletionPolicy::Orphan
                || !spec.allows(ManagementAction::Delete))
        {
            info!("Releasing managed resource without deleting the external resource");
            self.release(&mut mr).await?;
            return Ok(Action::await_change());
        }

        if !deleting {
            let mut changed = meta::init_external_name(&mut mr);
            let managed_tags = provider_tags(
                &self.config.provider_name,
                kind,
                &meta::external_name_or_name(&mr),
            );
            if let Some(tags) = mr.tags_mut() {
                changed |= merge_provider_tags(tags, &managed_tags);
            }

            let controller_uid = meta::controller_uid(&mr).map(str::to_string);
            let resolver = Resolver::new(self.references.as_ref(), controller_uid.as_deref());
            changed |= mr.resolve_references(&resolver).await?;

            if changed {
                self.persist(&mut mr).await?;
            }
        }

        let client = self.connector.connect(&mr).await?;
        let pristine_spec = (!spec.allows(ManagementAction::LateInitialize))
            .then(|| spec_value(&mr))
            .transpose()?;
        let observation = client.observe(&mut mr).await?;
        if let Some(pristine) = pristine_spec {
            if observation.resource_late_initialized {
                debug!("Discarding late-initialized parameters, management policies do not allow it");
            }
            restore_spec(&mut mr, pristine)?;
        }
        if let Some(name) = meta::external_name(&mr) {
            Span::current().record("external_name", name);
        }

        if deleting {
            if !observation.resource_exists {
                info!("External resource no longer exists, releasing finalizer");
                self.release(&mut mr).await?;
                return Ok(Action::await_change());
            }
            let already_deleting = mr
                .resource_status()
                .and_then(|s| s.condition(CONDITION_READY))
                .is_some_and(|c| c.has_reason(ConditionReason::Deleting));
            if already_deleting {
                debug!("External resource is already being deleted");
            } else {
                client.delete(&mut mr).await?;
                metrics::record_external_operation(kind, "delete");
                info!("Requested deletion of external resource");
            }
            mr.set_conditions([Condition::deleting(), Condition::reconcile_success()]);
            self.write_status(&mr, &initial_status).await?;
            return Ok(self.requeue(kind, "deleting", self.config.short_wait));
        }

        self.publish(&mr, &observation.connection_details).await?;

        if meta::add_finalizer(&mut mr) {
            self.persist(&mut mr).await?;
        }

        if !observation.resource_exists {
            return self.create(client.as_ref(), mr, kind, &initial_status).await;
        }

        if observation.resource_late_initialized && spec.allows(ManagementAction::LateInitialize) {
            debug!("Writing back late-initialized parameters");
            self.persist(&mut mr).await?;
        }

        if observation.resource_up_to_date {
            mr.set_conditions([Condition::reconcile_success()]);
            self.write_status(&mr, &initial_status).await?;
            return Ok(if observation.pending {
                self.requeue(kind, "pending", self.config.short_wait)
            } else {
                self.requeue(kind, "poll", self.config.poll_interval)
            });
        }

        if !spec.allows(ManagementAction::Update) {
            debug!(diff = %observation.diff, "Drift ignored, management policies do not allow updates");
            mr.set_conditions([Condition::reconcile_success()]);
            self.write_status(&mr, &initial_status).await?;
            return Ok(self.requeue(kind, "poll", self.config.poll_interval));
        }

        info!(diff = %observation.diff, "External resource drifted, updating");
        let update = client.update(&mut mr).await?;
        metrics::record_external_operation(kind, "update");
        self.publish(&mr, &update.connection_details).await?;
        mr.set_conditions([Condition::reconcile_success()]);
        self.write_status(&mr, &initial_status).await?;
        Ok(self.requeue(kind, "updated", self.config.short_wait))
    }

    async fn create(
        &self,
        client: &dyn super::ExternalClient<R>,
        mut mr: R,
        kind: &str,
        initial_status: &Value,
    ) -> Result<Action, ReconcileError> {
        if !mr.resource_spec().allows(ManagementAction::Create) {
            return Err(ReconcileError::InvalidSpec(
                "external resource does not exist and the management policies do not allow creating it"
                    .to_string(),
            ));
        }
        if meta::create_incomplete(&mr) {
            return Err(ReconcileError::CreateIncomplete);
        }

        // Recorded before the call so a crash mid-create blocks a second one
        meta::set_create_pending(&mut mr, Utc::now());
        self.persist(&mut mr).await?;

        let creation = match client.create(&mut mr).await {
            Ok(creation) => creation,
            Err(err) => {
                meta::set_create_failed(&mut mr, Utc::now());
                if let Err(persist_err) = self.persist(&mut mr).await {
                    warn!(error = %persist_err, "Cannot record failed creation");
                }
                return Err(err);
            }
        };
        metrics::record_external_operation(kind, "create");
        info!(external_name = ?meta::external_name(&mr), "Created external resource");

        // Generated credentials exist only in this response
        self.publish(&mr, &creation.connection_details).await?;
        meta::set_create_succeeded(&mut mr, Utc::now());
        self.persist(&mut mr).await?;

        mr.set_conditions([Condition::creating(), Condition::reconcile_success()]);
        self.write_status(&mr, initial_status).await?;
        Ok(self.requeue(kind, "created", self.config.short_wait))
    }

    /// Persist spec and metadata, keeping the in-memory status.
    async fn persist(&self, mr: &mut R) -> Result<(), ReconcileError> {
        let stored = self
            .control_plane
            .update(mr)
            .await
            .map_err(ReconcileError::kube("cannot update managed resource"))?;
        mr.meta_mut().resource_version = stored.meta().resource_version.clone();
        Ok(())
    }

    async fn release(&self, mr: &mut R) -> Result<(), ReconcileError> {
        if meta::remove_finalizer(mr) {
            self.persist(mr).await?;
        }
        Ok(())
    }

    async fn publish(&self, mr: &R, details: &ConnectionDetails) -> Result<(), ReconcileError> {
        if details.is_empty() {
            return Ok(());
        }
        let changed = self
            .control_plane
            .publish_connection_details(mr, details)
            .await
            .map_err(ReconcileError::kube("cannot publish connection details"))?;
        if changed {
            debug!(keys = ?details.keys().collect::<Vec<_>>(), "Published connection details");
        }
        Ok(())
    }

    /// Patch the status only when it changed during the pass.
    async fn write_status(&self, mr: &R, initial: &Value) -> Result<(), ReconcileError> {
        let status = status_value(mr)?;
        if status == *initial {
            return Ok(());
        }
        self.control_plane
            .patch_status(mr, status)
            .await
            .map_err(ReconcileError::kube("cannot update managed resource status"))
    }

    fn requeue(&self, kind: &str, reason: &str, after: Duration) -> Action {
        metrics::increment_requeues(kind, reason);
        Action::requeue(after)
    }

    /// Record a failed pass on `Synced`. Observed state is left as it was.
    async fn report_error(&self, original: &R, kind: &str, err: &ReconcileError) {
        metrics::increment_reconciliation_errors(kind, err.is_transient());
        if err.is_transient() {
            warn!(error = %err, class = err.class(), "Reconciliation failed, will retry");
        } else {
            error!(error = %err, class = err.class(), "Reconciliation failed");
        }

        let mut status = original.resource_status().cloned().unwrap_or_default();
        status.set_conditions([Condition::reconcile_error(err)]);
        if original.resource_status() == Some(&status) {
            return;
        }
        if let Err(e) = self
            .control_plane
            .patch_status(original, json!({ "conditions": status.conditions }))
            .await
        {
            debug!(error = %e, "Cannot record reconciliation error on status");
        }
    }
}
