//! # Error Policy
//!
//! Requeue decisions for failed reconciliation passes and logging of
//! controller stream errors.

use kube::ResourceExt;
use kube_runtime::controller::{self, Action};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::watch_loop::ControllerContext;
use crate::managed::{Managed, ReconcileError};
use crate::observability::metrics;

/// Transient errors retry with per-resource exponential backoff; permanent
/// ones wait for the poll interval, since only a spec change can fix them.
pub fn error_policy<R: Managed>(
    obj: Arc<R>,
    error: &ReconcileError,
    ctx: Arc<ControllerContext<R>>,
) -> Action {
    let kind = R::kind(&());
    let name = obj.name_any();

    if !error.is_transient() {
        let delay = ctx.reconciler.config().poll_interval;
        info!(
            resource.kind = %kind,
            resource.name = %name,
            error.class = error.class(),
            "Permanent error, retrying in {}s",
            delay.as_secs()
        );
        metrics::increment_requeues(&kind, "error-permanent");
        return Action::requeue(delay);
    }

    let (delay, attempts) = ctx.backoff.next(&name);
    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
    info!(
        resource.kind = %kind,
        resource.name = %name,
        error.class = error.class(),
        attempts,
        "Retrying with backoff: {}s, next retry at {}",
        delay.as_secs(),
        next_trigger_time.to_rfc3339()
    );
    metrics::increment_requeues(&kind, "error-backoff");
    Action::requeue(delay)
}

/// Log an error surfaced by a controller stream. Reconcile failures have
/// already been reported by the reconciler.
pub fn log_controller_error(kind: &str, err: &controller::Error<ReconcileError, kube_runtime::watcher::Error>) {
    match err {
        controller::Error::ReconcilerFailed(e, obj) => {
            debug!(resource.kind = kind, resource.name = %obj.name, error = %e, "Reconciliation failed");
        }
        controller::Error::ObjectNotFound(obj) => {
            debug!(resource.kind = kind, resource.name = %obj.name, "Object deleted before reconciliation");
        }
        controller::Error::QueueError(e) => {
            let message = e.to_string();
            if message.contains("401") || message.contains("Unauthorized") {
                error!(resource.kind = kind, error = %e, "Watch authentication failed, RBAC may have been revoked");
            } else if message.contains("410") || message.contains("too old resource version") {
                warn!(resource.kind = kind, "Watch resource version expired, watch will restart");
            } else {
                error!(resource.kind = kind, error = %e, "Controller watch error");
            }
        }
        other => {
            error!(resource.kind = kind, error = %other, "Controller error");
        }
    }
}
