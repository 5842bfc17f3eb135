//! # Provisioned Product Client Tests
//!
//! Exercises the Service Catalog provisioned product client against an
//! in-memory gateway.
//!
//! These tests verify:
//! - Products under change are reported up to date and pending
//! - Updates are refused while a change is in flight
//! - Drift comes from the product, artifact and stack parameters only
//! - Idempotency tokens are fresh per call

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use common::FakeServiceCatalog;
use provider_aws::aws::servicecatalog::{
    ProductView, ProvisionedProductDetail, ProvisioningArtifact, RecordOutput,
};
use provider_aws::controller::servicecatalog::provisioned_product::{
    ProvisionedProductClient, MSG_UPDATE_PENDING, MSG_UPDATING, RECORD_UPDATE,
    STATUS_AVAILABLE, STATUS_UNDER_CHANGE,
};
use provider_aws::crd::servicecatalog::{ProvisionedProductSpec, ProvisioningParameter};
use provider_aws::crd::{ConditionReason, ProvisionedProduct, CONDITION_READY};
use provider_aws::managed::{ExternalClient, Managed, ReconcileError};

const NAME: &str = "network";
const STACK_ARN: &str = "arn:aws:cloudformation:us-east-1:123456789012:stack/SC-network/1";

fn detail(status: &str) -> ProvisionedProductDetail {
    ProvisionedProductDetail {
        id: Some("pp-123".to_string()),
        name: Some(NAME.to_string()),
        status: Some(status.to_string()),
        product_id: Some("prod-abc".to_string()),
        provisioning_artifact_id: Some("pa-1".to_string()),
        last_record_id: Some("rec-1".to_string()),
        ..ProvisionedProductDetail::default()
    }
}

fn spec() -> ProvisionedProductSpec {
    let mut spec = ProvisionedProductSpec::default();
    spec.for_provider.product_id = Some("prod-abc".to_string());
    spec.for_provider.provisioning_artifact_name = Some("v1".to_string());
    spec.for_provider.provisioning_parameters = vec![ProvisioningParameter::new("CidrBlock", "10.0.0.0/16")];
    spec
}

fn managed(spec: ProvisionedProductSpec) -> ProvisionedProduct {
    let mut mr = ProvisionedProduct::new(NAME, spec);
    mr.metadata = common::meta(NAME);
    mr
}

/// An available product whose stack matches [`spec`]
fn available() -> FakeServiceCatalog {
    let fake = FakeServiceCatalog::with_detail(detail(STATUS_AVAILABLE));
    *fake.outputs.lock().unwrap() = vec![
        RecordOutput {
            key: "CloudformationStackARN".to_string(),
            value: Some(STACK_ARN.to_string()),
            description: None,
        },
        RecordOutput {
            key: "VpcId".to_string(),
            value: Some("vpc-1".to_string()),
            description: None,
        },
    ];
    *fake.stack_parameters.lock().unwrap() = BTreeMap::from([
        ("CidrBlock".to_string(), "10.0.0.0/16".to_string()),
        ("EnableDns".to_string(), "true".to_string()),
    ]);
    *fake.product.lock().unwrap() = ProductView {
        product_id: Some("prod-abc".to_string()),
        name: Some("Network".to_string()),
        artifacts: vec![
            ProvisioningArtifact {
                id: Some("pa-1".to_string()),
                name: Some("v1".to_string()),
            },
            ProvisioningArtifact {
                id: Some("pa-2".to_string()),
                name: Some("v2".to_string()),
            },
        ],
    };
    fake
}

fn client(fake: &Arc<FakeServiceCatalog>) -> ProvisionedProductClient {
    ProvisionedProductClient::new(Arc::clone(fake) as _, "provider-aws")
}

#[tokio::test]
async fn test_under_change_update_is_available_and_pending() {
    let fake = Arc::new(FakeServiceCatalog::with_detail(detail(STATUS_UNDER_CHANGE)));
    *fake.record_type.lock().unwrap() = Some(RECORD_UPDATE.to_string());
    let mut mr = managed(spec());

    let observation = client(&fake).observe(&mut mr).await.unwrap();

    assert!(observation.resource_exists);
    assert!(observation.resource_up_to_date);
    assert!(observation.pending);
    let ready = mr
        .resource_status()
        .and_then(|s| s.condition(CONDITION_READY))
        .cloned()
        .unwrap();
    assert!(ready.has_reason(ConditionReason::Available));
    assert_eq!(ready.message.as_deref(), Some(MSG_UPDATING));
    let at_provider = &mr.status.as_ref().unwrap().at_provider;
    assert_eq!(at_provider.last_record_type.as_deref(), Some(RECORD_UPDATE));
    // No drift detection while the stack is changing
    assert!(!fake.calls().iter().any(|c| c == "DescribeStacks"));
}

#[tokio::test]
async fn test_under_change_keeps_previous_outputs() {
    let fake = Arc::new(available());
    let mut mr = managed(spec());
    client(&fake).observe(&mut mr).await.unwrap();

    *fake.detail.lock().unwrap() = Some(detail(STATUS_UNDER_CHANGE));
    *fake.record_type.lock().unwrap() = Some(RECORD_UPDATE.to_string());
    client(&fake).observe(&mut mr).await.unwrap();

    let at_provider = &mr.status.as_ref().unwrap().at_provider;
    assert_eq!(at_provider.status.as_deref(), Some(STATUS_UNDER_CHANGE));
    assert_eq!(at_provider.outputs.get("VpcId").map(String::as_str), Some("vpc-1"));
    assert_eq!(at_provider.cloudformation_stack_arn.as_deref(), Some(STACK_ARN));
}

#[tokio::test]
async fn test_update_is_refused_while_under_change() {
    let fake = Arc::new(FakeServiceCatalog::with_detail(detail(STATUS_UNDER_CHANGE)));
    *fake.record_type.lock().unwrap() = Some(RECORD_UPDATE.to_string());
    let mut mr = managed(spec());
    let client = client(&fake);
    client.observe(&mut mr).await.unwrap();

    let err = client.update(&mut mr).await.unwrap_err();

    assert!(matches!(err, ReconcileError::UpdatePending(_)));
    assert_eq!(err.to_string(), MSG_UPDATE_PENDING);
    assert!(!fake.calls().iter().any(|c| c == "UpdateProvisionedProduct"));
}

#[tokio::test]
async fn test_update_is_refused_before_first_observation() {
    let fake = Arc::new(available());
    let mut mr = managed(spec());

    let err = client(&fake).update(&mut mr).await.unwrap_err();

    assert_eq!(err.to_string(), MSG_UPDATE_PENDING);
}

#[tokio::test]
async fn test_matching_stack_is_up_to_date() {
    let fake = Arc::new(available());
    let mut mr = managed(spec());

    let observation = client(&fake).observe(&mut mr).await.unwrap();

    // EnableDns only exists on the stack and is not drift
    assert!(observation.resource_up_to_date);
    assert!(!observation.pending);
    assert!(observation.resource_late_initialized);
    assert_eq!(mr.spec.for_provider.accept_language.as_deref(), Some("en"));
    let at_provider = &mr.status.as_ref().unwrap().at_provider;
    assert_eq!(at_provider.cloudformation_stack_arn.as_deref(), Some(STACK_ARN));
    assert_eq!(at_provider.id.as_deref(), Some("pp-123"));
}

#[tokio::test]
async fn test_changed_parameter_is_drift() {
    let fake = Arc::new(available());
    let mut spec = spec();
    spec.for_provider.provisioning_parameters = vec![ProvisioningParameter::new("CidrBlock", "10.1.0.0/16")];
    let mut mr = managed(spec);

    let observation = client(&fake).observe(&mut mr).await.unwrap();

    assert!(!observation.resource_up_to_date);
    assert_eq!(observation.diff, "provisioningParameters");
}

#[tokio::test]
async fn test_changed_artifact_is_drift_and_updates() {
    let fake = Arc::new(available());
    let mut spec = spec();
    spec.for_provider.provisioning_artifact_name = Some("v2".to_string());
    let mut mr = managed(spec);
    let client = client(&fake);

    let observation = client.observe(&mut mr).await.unwrap();
    assert!(!observation.resource_up_to_date);
    assert_eq!(observation.diff, "product");

    client.update(&mut mr).await.unwrap();
    let updated = fake.updated.lock().unwrap();
    assert_eq!(updated[0].provisioned_product_name, NAME);
    assert_eq!(updated[0].provisioning_artifact_name.as_deref(), Some("v2"));
    assert!(updated[0].update_token.starts_with("provider-aws-"));
}

#[tokio::test]
async fn test_missing_product_is_absent() {
    let fake = Arc::new(FakeServiceCatalog::default());
    let mut mr = managed(spec());

    let observation = client(&fake).observe(&mut mr).await.unwrap();

    assert!(!observation.resource_exists);
}

#[tokio::test]
async fn test_create_uses_fresh_tokens() {
    let fake = Arc::new(FakeServiceCatalog::default());
    let client = client(&fake);
    let mut first = managed(spec());
    let mut second = managed(spec());

    client.create(&mut first).await.unwrap();
    client.create(&mut second).await.unwrap();

    let provisioned = fake.provisioned.lock().unwrap();
    assert_eq!(provisioned.len(), 2);
    assert_eq!(provisioned[0].provisioned_product_name, NAME);
    assert!(provisioned[0].provision_token.starts_with("provider-aws-"));
    assert_ne!(provisioned[0].provision_token, provisioned[1].provision_token);
}

#[tokio::test]
async fn test_delete_is_skipped_while_under_change() {
    let fake = Arc::new(FakeServiceCatalog::with_detail(detail(STATUS_UNDER_CHANGE)));
    let mut mr = managed(spec());
    let client = client(&fake);
    client.observe(&mut mr).await.unwrap();

    client.delete(&mut mr).await.unwrap();

    assert!(fake.terminate_tokens.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_terminates_available_product() {
    let fake = Arc::new(available());
    let mut mr = managed(spec());
    let client = client(&fake);
    client.observe(&mut mr).await.unwrap();

    client.delete(&mut mr).await.unwrap();

    let tokens = fake.terminate_tokens.lock().unwrap();
    assert_eq!(tokens.len(), 1);
    assert!(tokens[0].starts_with("provider-aws-"));
}
