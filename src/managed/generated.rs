//! # Generated Client
//!
//! [`ExternalClient`] for kinds that map one-to-one onto a describe, create,
//! update and delete call. A kind supplies the calls through [`CrudApi`] and
//! customizes the flow through the optional [`Hooks`].

use async_trait::async_trait;
use std::marker::PhantomData;
use tracing::debug;

use super::{
    condition_for_status, ConnectionDetails, ExternalClient, ExternalCreation, ExternalObservation,
    ExternalUpdate, Managed, ReconcileError,
};
use crate::aws::AwsError;

/// Error context for each call, e.g. "cannot describe cache cluster".
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext {
    pub describe: &'static str,
    pub create: &'static str,
    pub update: &'static str,
    pub delete: &'static str,
}

/// The AWS calls of a plain CRUD kind. Describe reports an absent resource
/// as a `NotFound` error.
#[async_trait]
pub trait CrudApi<R: Managed>: Send + Sync {
    type Observed: Send + Sync;

    const CONTEXT: ErrorContext;

    async fn describe(&self, mr: &R) -> Result<Self::Observed, AwsError>;
    async fn create(&self, mr: &R) -> Result<(), AwsError>;
    async fn update(&self, mr: &R, observed: &Self::Observed) -> Result<(), AwsError>;
    async fn delete(&self, mr: &R) -> Result<(), AwsError>;

    /// AWS lifecycle status, mapped onto `Ready`
    fn status(&self, observed: &Self::Observed) -> Option<String>;

    fn status_message(&self, _observed: &Self::Observed) -> Option<String> {
        None
    }

    /// Write `status.atProvider`.
    fn set_observation(&self, mr: &mut R, observed: &Self::Observed);
}

/// Customization points around the [`CrudApi`] calls. Every hook defaults
/// to a no-op.
#[async_trait]
pub trait Hooks<R: Managed>: CrudApi<R> {
    async fn pre_observe(&self, _mr: &R) -> Result<(), ReconcileError> {
        Ok(())
    }

    fn post_observe(
        &self,
        _mr: &mut R,
        _observed: &Self::Observed,
        observation: ExternalObservation,
    ) -> Result<ExternalObservation, ReconcileError> {
        Ok(observation)
    }

    async fn pre_create(&self, _mr: &mut R) -> Result<(), ReconcileError> {
        Ok(())
    }

    fn post_create(
        &self,
        _mr: &mut R,
        creation: ExternalCreation,
    ) -> Result<ExternalCreation, ReconcileError> {
        Ok(creation)
    }

    async fn pre_update(&self, _mr: &mut R) -> Result<(), ReconcileError> {
        Ok(())
    }

    fn post_update(&self, _mr: &mut R, update: ExternalUpdate) -> Result<ExternalUpdate, ReconcileError> {
        Ok(update)
    }

    /// Returning `false` skips the delete call.
    async fn pre_delete(&self, _mr: &mut R) -> Result<bool, ReconcileError> {
        Ok(true)
    }

    fn post_delete(&self, _mr: &mut R) -> Result<(), ReconcileError> {
        Ok(())
    }

    fn late_initialize(&self, _mr: &mut R, _observed: &Self::Observed) -> bool {
        false
    }

    fn is_up_to_date(&self, _mr: &R, _observed: &Self::Observed) -> Result<bool, ReconcileError> {
        Ok(true)
    }

    /// Drift summary for logs, only asked for when not up to date
    fn diff(&self, _mr: &R, _observed: &Self::Observed) -> String {
        String::new()
    }

    fn connection_details(&self, _mr: &R, _observed: &Self::Observed) -> ConnectionDetails {
        ConnectionDetails::new()
    }
}

pub struct GeneratedClient<R, A> {
    api: A,
    _kind: PhantomData<fn() -> R>,
}

impl<R, A: std::fmt::Debug> std::fmt::Debug for GeneratedClient<R, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedClient").field("api", &self.api).finish()
    }
}

impl<R: Managed, A: Hooks<R>> GeneratedClient<R, A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            _kind: PhantomData,
        }
    }
}

#[async_trait]
impl<R, A> ExternalClient<R> for GeneratedClient<R, A>
where
    R: Managed,
    A: Hooks<R> + 'static,
{
    async fn observe(&self, mr: &mut R) -> Result<ExternalObservation, ReconcileError> {
        self.api.pre_observe(mr).await?;
        let observed = match self.api.describe(mr).await {
            Ok(observed) => observed,
            Err(e) if e.is_not_found() => return Ok(ExternalObservation::absent()),
            Err(e) => return Err(ReconcileError::aws(A::CONTEXT.describe)(e)),
        };

        self.api.set_observation(mr, &observed);
        let status = self.api.status(&observed);
        let message = self.api.status_message(&observed);
        mr.set_conditions([condition_for_status(status.as_deref(), message.as_deref())]);

        let late_initialized = self.api.late_initialize(mr, &observed);
        let up_to_date = self.api.is_up_to_date(mr, &observed)?;
        let observation = ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date,
            resource_late_initialized: late_initialized,
            pending: false,
            connection_details: self.api.connection_details(mr, &observed),
            diff: if up_to_date {
                String::new()
            } else {
                self.api.diff(mr, &observed)
            },
        };
        self.api.post_observe(mr, &observed, observation)
    }

    async fn create(&self, mr: &mut R) -> Result<ExternalCreation, ReconcileError> {
        self.api.pre_create(mr).await?;
        match self.api.create(mr).await {
            Ok(()) => {}
            Err(e) if e.is_already_exists() => debug!("External resource already exists"),
            Err(e) => return Err(ReconcileError::aws(A::CONTEXT.create)(e)),
        }
        self.api.post_create(mr, ExternalCreation::default())
    }

    async fn update(&self, mr: &mut R) -> Result<ExternalUpdate, ReconcileError> {
        self.api.pre_update(mr).await?;
        let observed = self
            .api
            .describe(mr)
            .await
            .map_err(ReconcileError::aws(A::CONTEXT.describe))?;
        self.api
            .update(mr, &observed)
            .await
            .map_err(ReconcileError::aws(A::CONTEXT.update))?;
        self.api.post_update(mr, ExternalUpdate::default())
    }

    async fn delete(&self, mr: &mut R) -> Result<(), ReconcileError> {
        if !self.api.pre_delete(mr).await? {
            return Ok(());
        }
        match self.api.delete(mr).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => debug!("External resource already gone"),
            Err(e) => return Err(ReconcileError::aws(A::CONTEXT.delete)(e)),
        }
        self.api.post_delete(mr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::ErrorKind;
    use crate::crd::elasticache::CacheSubnetGroupSpec;
    use crate::crd::{CacheSubnetGroup, ConditionReason, CONDITION_READY};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        observed: Mutex<Option<Result<String, AwsError>>>,
        create_result: Mutex<Option<AwsError>>,
        delete_result: Mutex<Option<AwsError>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeApi {
        fn with_status(status: &str) -> Self {
            let api = Self::default();
            *api.observed.lock().unwrap() = Some(Ok(status.to_string()));
            api
        }

        fn absent() -> Self {
            let api = Self::default();
            *api.observed.lock().unwrap() = Some(Err(AwsError::not_found("gone")));
            api
        }
    }

    #[async_trait]
    impl CrudApi<CacheSubnetGroup> for FakeApi {
        type Observed = String;

        const CONTEXT: ErrorContext = ErrorContext {
            describe: "cannot describe thing",
            create: "cannot create thing",
            update: "cannot update thing",
            delete: "cannot delete thing",
        };

        async fn describe(&self, _mr: &CacheSubnetGroup) -> Result<String, AwsError> {
            self.calls.lock().unwrap().push("describe");
            self.observed
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(AwsError::not_found("unset")))
        }

        async fn create(&self, _mr: &CacheSubnetGroup) -> Result<(), AwsError> {
            self.calls.lock().unwrap().push("create");
            self.create_result.lock().unwrap().take().map_or(Ok(()), Err)
        }

        async fn update(&self, _mr: &CacheSubnetGroup, _observed: &String) -> Result<(), AwsError> {
            self.calls.lock().unwrap().push("update");
            Ok(())
        }

        async fn delete(&self, _mr: &CacheSubnetGroup) -> Result<(), AwsError> {
            self.calls.lock().unwrap().push("delete");
            self.delete_result.lock().unwrap().take().map_or(Ok(()), Err)
        }

        fn status(&self, observed: &String) -> Option<String> {
            Some(observed.clone())
        }

        fn set_observation(&self, mr: &mut CacheSubnetGroup, observed: &String) {
            mr.status.get_or_insert_with(Default::default).at_provider.vpc_id = Some(observed.clone());
        }
    }

    impl Hooks<CacheSubnetGroup> for FakeApi {
        fn is_up_to_date(&self, mr: &CacheSubnetGroup, _observed: &String) -> Result<bool, ReconcileError> {
            Ok(mr.spec.for_provider.description == "current")
        }

        fn diff(&self, _mr: &CacheSubnetGroup, _observed: &String) -> String {
            "description".to_string()
        }
    }

    fn object(description: &str) -> CacheSubnetGroup {
        let mut spec = CacheSubnetGroupSpec::default();
        spec.for_provider.description = description.to_string();
        CacheSubnetGroup::new("private", spec)
    }

    #[tokio::test]
    async fn not_found_is_absent() {
        let client = GeneratedClient::new(FakeApi::absent());
        let mut mr = object("current");
        let observation = client.observe(&mut mr).await.unwrap();
        assert!(!observation.resource_exists);
        assert!(mr.status.is_none());
    }

    #[tokio::test]
    async fn observe_sets_ready_and_reports_drift() {
        let client = GeneratedClient::new(FakeApi::with_status("available"));
        let mut mr = object("stale");
        let observation = client.observe(&mut mr).await.unwrap();

        assert!(observation.resource_exists);
        assert!(!observation.resource_up_to_date);
        assert_eq!(observation.diff, "description");
        let status = mr.status.as_ref().unwrap();
        assert_eq!(status.at_provider.vpc_id.as_deref(), Some("available"));
        assert!(status
            .resource
            .condition(CONDITION_READY)
            .unwrap()
            .has_reason(ConditionReason::Available));
    }

    #[tokio::test]
    async fn create_tolerates_already_exists() {
        let api = FakeApi::absent();
        *api.create_result.lock().unwrap() =
            Some(AwsError::from_code("CacheSubnetGroupAlreadyExists", "exists"));
        let client = GeneratedClient::new(api);
        let mut mr = object("current");
        client.create(&mut mr).await.unwrap();
    }

    #[tokio::test]
    async fn create_wraps_errors_with_context() {
        let api = FakeApi::absent();
        *api.create_result.lock().unwrap() =
            Some(AwsError::from_code("InvalidParameterValue", "bad subnet"));
        let client = GeneratedClient::new(api);
        let mut mr = object("current");
        let err = client.create(&mut mr).await.unwrap_err();
        assert_eq!(err.to_string(), "cannot create thing: InvalidParameterValue: bad subnet");
        assert_eq!(err.aws_error().map(|e| e.kind), Some(ErrorKind::InvalidParameter));
    }

    #[tokio::test]
    async fn delete_tolerates_not_found() {
        let api = FakeApi::with_status("available");
        *api.delete_result.lock().unwrap() = Some(AwsError::not_found("gone"));
        let client = GeneratedClient::new(api);
        let mut mr = object("current");
        client.delete(&mut mr).await.unwrap();
    }

    #[tokio::test]
    async fn update_describes_before_modifying() {
        let client = GeneratedClient::new(FakeApi::with_status("available"));
        let mut mr = object("stale");
        client.update(&mut mr).await.unwrap();
        assert_eq!(*client.api.calls.lock().unwrap(), vec!["describe", "update"]);
    }
}
