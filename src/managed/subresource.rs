//! # Sub-resources
//!
//! Some AWS resources are configured through several independent APIs (a
//! bucket's versioning, CORS, encryption...). Each configuration is reconciled
//! by its own [`SubresourceClient`]; the owning kind's client observes them in
//! order and applies at most one per update.

use async_trait::async_trait;
use tracing::debug;

use super::{Managed, ReconcileError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubresourceState {
    Updated,
    /// Desired configuration differs from AWS
    NeedsUpdate,
    /// AWS carries a configuration `forProvider` no longer asks for
    NeedsDeletion,
}

#[async_trait]
pub trait SubresourceClient<R: Managed>: Send + Sync {
    fn name(&self) -> &'static str;
    async fn observe(&self, mr: &R) -> Result<SubresourceState, ReconcileError>;
    async fn create_or_update(&self, mr: &R) -> Result<(), ReconcileError>;
    async fn delete(&self, mr: &R) -> Result<(), ReconcileError>;

    /// Fill unset desired configuration from AWS. Returns whether `mr` changed.
    async fn late_initialize(&self, _mr: &mut R) -> Result<bool, ReconcileError> {
        Ok(false)
    }
}

pub type Subresources<R> = Vec<Box<dyn SubresourceClient<R>>>;

/// First handler, in declaration order, that is not up to date.
pub async fn first_pending<'a, R: Managed>(
    handlers: &'a [Box<dyn SubresourceClient<R>>],
    mr: &R,
) -> Result<Option<(&'a dyn SubresourceClient<R>, SubresourceState)>, ReconcileError> {
    for handler in handlers {
        let state = handler.observe(mr).await?;
        if state != SubresourceState::Updated {
            debug!(subresource = handler.name(), ?state, "Sub-resource is not up to date");
            return Ok(Some((handler.as_ref(), state)));
        }
    }
    Ok(None)
}

/// Apply the first pending handler. Returns its name, or `None` when every
/// handler is up to date.
pub async fn apply_first<R: Managed>(
    handlers: &[Box<dyn SubresourceClient<R>>],
    mr: &R,
) -> Result<Option<&'static str>, ReconcileError> {
    let Some((handler, state)) = first_pending(handlers, mr).await? else {
        return Ok(None);
    };
    match state {
        SubresourceState::NeedsUpdate => handler.create_or_update(mr).await?,
        SubresourceState::NeedsDeletion => handler.delete(mr).await?,
        SubresourceState::Updated => {}
    }
    Ok(Some(handler.name()))
}

/// Late-initialize every handler. Returns whether any changed `mr`.
pub async fn late_initialize_all<R: Managed>(
    handlers: &[Box<dyn SubresourceClient<R>>],
    mr: &mut R,
) -> Result<bool, ReconcileError> {
    let mut changed = false;
    for handler in handlers {
        changed |= handler.late_initialize(mr).await?;
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::s3::BucketSpec;
    use crate::crd::Bucket;
    use std::sync::{Arc, Mutex};

    struct Fake {
        name: &'static str,
        state: SubresourceState,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl SubresourceClient<Bucket> for Fake {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn observe(&self, _mr: &Bucket) -> Result<SubresourceState, ReconcileError> {
            self.log.lock().unwrap().push(format!("observe {}", self.name));
            Ok(self.state)
        }

        async fn create_or_update(&self, _mr: &Bucket) -> Result<(), ReconcileError> {
            self.log.lock().unwrap().push(format!("put {}", self.name));
            Ok(())
        }

        async fn delete(&self, _mr: &Bucket) -> Result<(), ReconcileError> {
            self.log.lock().unwrap().push(format!("delete {}", self.name));
            Ok(())
        }
    }

    fn handlers(states: &[(&'static str, SubresourceState)]) -> (Subresources<Bucket>, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handlers = states
            .iter()
            .map(|(name, state)| {
                Box::new(Fake {
                    name,
                    state: *state,
                    log: Arc::clone(&log),
                }) as Box<dyn SubresourceClient<Bucket>>
            })
            .collect();
        (handlers, log)
    }

    #[tokio::test]
    async fn applies_only_the_first_pending_handler() {
        let (handlers, log) = handlers(&[
            ("accelerate", SubresourceState::Updated),
            ("cors", SubresourceState::NeedsDeletion),
            ("versioning", SubresourceState::NeedsUpdate),
        ]);
        let bucket = Bucket::new("b", BucketSpec::default());

        let applied = apply_first(&handlers, &bucket).await.unwrap();
        assert_eq!(applied, Some("cors"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["observe accelerate", "observe cors", "delete cors"]
        );
    }

    #[tokio::test]
    async fn nothing_applied_when_all_updated() {
        let (handlers, log) = handlers(&[
            ("accelerate", SubresourceState::Updated),
            ("versioning", SubresourceState::Updated),
        ]);
        let bucket = Bucket::new("b", BucketSpec::default());

        assert_eq!(apply_first(&handlers, &bucket).await.unwrap(), None);
        assert_eq!(log.lock().unwrap().len(), 2);
    }
}
