//! # S3 gateway
//!
//! Bucket lifecycle plus the sub-configurations reconciled independently of
//! the bucket. Getters return the empty value when a sub-configuration is not
//! set on the bucket.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::types as sdk;
use aws_sdk_s3::Client;
use std::collections::BTreeMap;

use super::{observe_call, AwsError, ErrorKind};
use crate::crd::s3::{CorsRule, ServerSideEncryptionByDefault, ServerSideEncryptionRule};
use crate::observability::metrics;

const SERVICE: &str = "s3";

#[async_trait]
pub trait S3Gateway: Send + Sync {
    /// `NotFound` when the bucket does not exist
    async fn head_bucket(&self, bucket: &str) -> Result<(), AwsError>;
    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
        acl: Option<&str>,
    ) -> Result<(), AwsError>;
    async fn delete_bucket(&self, bucket: &str) -> Result<(), AwsError>;

    async fn get_bucket_accelerate(&self, bucket: &str) -> Result<Option<String>, AwsError>;
    async fn put_bucket_accelerate(&self, bucket: &str, status: &str) -> Result<(), AwsError>;

    async fn get_bucket_cors(&self, bucket: &str) -> Result<Vec<CorsRule>, AwsError>;
    async fn put_bucket_cors(&self, bucket: &str, rules: &[CorsRule]) -> Result<(), AwsError>;
    async fn delete_bucket_cors(&self, bucket: &str) -> Result<(), AwsError>;

    async fn get_bucket_request_payment(&self, bucket: &str) -> Result<Option<String>, AwsError>;
    async fn put_bucket_request_payment(&self, bucket: &str, payer: &str)
        -> Result<(), AwsError>;

    async fn get_bucket_encryption(
        &self,
        bucket: &str,
    ) -> Result<Vec<ServerSideEncryptionRule>, AwsError>;
    async fn put_bucket_encryption(
        &self,
        bucket: &str,
        rules: &[ServerSideEncryptionRule],
    ) -> Result<(), AwsError>;
    async fn delete_bucket_encryption(&self, bucket: &str) -> Result<(), AwsError>;

    async fn get_bucket_tagging(&self, bucket: &str)
        -> Result<BTreeMap<String, String>, AwsError>;
    async fn put_bucket_tagging(
        &self,
        bucket: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), AwsError>;
    async fn delete_bucket_tagging(&self, bucket: &str) -> Result<(), AwsError>;

    async fn get_bucket_versioning(&self, bucket: &str) -> Result<Option<String>, AwsError>;
    async fn put_bucket_versioning(&self, bucket: &str, status: &str) -> Result<(), AwsError>;
}

/// [`S3Gateway`] backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct SdkS3 {
    client: Client,
}

impl SdkS3 {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

fn build_error(e: &aws_sdk_s3::error::BuildError) -> AwsError {
    AwsError::new(ErrorKind::InvalidParameter, None, e.to_string())
}

/// Missing sub-configurations surface as `NotFound`; the getters report them as empty.
fn absent_as_default<T: Default>(result: Result<T, AwsError>) -> Result<T, AwsError> {
    match result {
        Err(e) if e.is_not_found() => Ok(T::default()),
        other => other,
    }
}

#[async_trait]
impl S3Gateway for SdkS3 {
    async fn head_bucket(&self, bucket: &str) -> Result<(), AwsError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Err(e) if e.as_service_error().is_some_and(HeadBucketError::is_not_found) => {
                metrics::record_aws_call(SERVICE, "HeadBucket", ErrorKind::NotFound.as_str());
                Err(AwsError::not_found(format!("bucket {bucket} not found")))
            }
            result => observe_call(SERVICE, "HeadBucket", result).map(|_| ()),
        }
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
        acl: Option<&str>,
    ) -> Result<(), AwsError> {
        let configuration = location_constraint.map(|region| {
            sdk::CreateBucketConfiguration::builder()
                .location_constraint(sdk::BucketLocationConstraint::from(region))
                .build()
        });
        observe_call(
            SERVICE,
            "CreateBucket",
            self.client
                .create_bucket()
                .bucket(bucket)
                .set_create_bucket_configuration(configuration)
                .set_acl(acl.map(sdk::BucketCannedAcl::from))
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "DeleteBucket",
            self.client.delete_bucket().bucket(bucket).send().await,
        )
        .map(|_| ())
    }

    async fn get_bucket_accelerate(&self, bucket: &str) -> Result<Option<String>, AwsError> {
        let output = observe_call(
            SERVICE,
            "GetBucketAccelerateConfiguration",
            self.client
                .get_bucket_accelerate_configuration()
                .bucket(bucket)
                .send()
                .await,
        )?;
        Ok(output.status().map(|s| s.as_str().to_string()))
    }

    async fn put_bucket_accelerate(&self, bucket: &str, status: &str) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "PutBucketAccelerateConfiguration",
            self.client
                .put_bucket_accelerate_configuration()
                .bucket(bucket)
                .accelerate_configuration(
                    sdk::AccelerateConfiguration::builder()
                        .status(sdk::BucketAccelerateStatus::from(status))
                        .build(),
                )
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn get_bucket_cors(&self, bucket: &str) -> Result<Vec<CorsRule>, AwsError> {
        let output = absent_as_default(
            observe_call(
                SERVICE,
                "GetBucketCors",
                self.client.get_bucket_cors().bucket(bucket).send().await,
            )
            .map(Some),
        )?;
        Ok(output
            .map(|o| {
                o.cors_rules()
                    .iter()
                    .map(|r| CorsRule {
                        allowed_headers: r.allowed_headers().to_vec(),
                        allowed_methods: r.allowed_methods().to_vec(),
                        allowed_origins: r.allowed_origins().to_vec(),
                        expose_headers: r.expose_headers().to_vec(),
                        max_age_seconds: r.max_age_seconds(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put_bucket_cors(&self, bucket: &str, rules: &[CorsRule]) -> Result<(), AwsError> {
        let rules = rules
            .iter()
            .map(|r| {
                sdk::CorsRule::builder()
                    .set_allowed_headers(Some(r.allowed_headers.clone()))
                    .set_allowed_methods(Some(r.allowed_methods.clone()))
                    .set_allowed_origins(Some(r.allowed_origins.clone()))
                    .set_expose_headers(Some(r.expose_headers.clone()))
                    .set_max_age_seconds(r.max_age_seconds)
                    .build()
                    .map_err(|e| build_error(&e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let configuration = sdk::CorsConfiguration::builder()
            .set_cors_rules(Some(rules))
            .build()
            .map_err(|e| build_error(&e))?;
        observe_call(
            SERVICE,
            "PutBucketCors",
            self.client
                .put_bucket_cors()
                .bucket(bucket)
                .cors_configuration(configuration)
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn delete_bucket_cors(&self, bucket: &str) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "DeleteBucketCors",
            self.client.delete_bucket_cors().bucket(bucket).send().await,
        )
        .map(|_| ())
    }

    async fn get_bucket_request_payment(&self, bucket: &str) -> Result<Option<String>, AwsError> {
        let output = observe_call(
            SERVICE,
            "GetBucketRequestPayment",
            self.client
                .get_bucket_request_payment()
                .bucket(bucket)
                .send()
                .await,
        )?;
        Ok(output.payer().map(|p| p.as_str().to_string()))
    }

    async fn put_bucket_request_payment(
        &self,
        bucket: &str,
        payer: &str,
    ) -> Result<(), AwsError> {
        let configuration = sdk::RequestPaymentConfiguration::builder()
            .payer(sdk::Payer::from(payer))
            .build()
            .map_err(|e| build_error(&e))?;
        observe_call(
            SERVICE,
            "PutBucketRequestPayment",
            self.client
                .put_bucket_request_payment()
                .bucket(bucket)
                .request_payment_configuration(configuration)
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn get_bucket_encryption(
        &self,
        bucket: &str,
    ) -> Result<Vec<ServerSideEncryptionRule>, AwsError> {
        let output = absent_as_default(
            observe_call(
                SERVICE,
                "GetBucketEncryption",
                self.client.get_bucket_encryption().bucket(bucket).send().await,
            )
            .map(Some),
        )?;
        Ok(output
            .as_ref()
            .and_then(|o| o.server_side_encryption_configuration())
            .map(|c| {
                c.rules()
                    .iter()
                    .filter_map(|r| {
                        let default = r.apply_server_side_encryption_by_default()?;
                        Some(ServerSideEncryptionRule {
                            apply_server_side_encryption_by_default: ServerSideEncryptionByDefault {
                                sse_algorithm: default.sse_algorithm().as_str().to_string(),
                                kms_master_key_id: default.kms_master_key_id().map(str::to_string),
                            },
                            bucket_key_enabled: r.bucket_key_enabled(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put_bucket_encryption(
        &self,
        bucket: &str,
        rules: &[ServerSideEncryptionRule],
    ) -> Result<(), AwsError> {
        let rules = rules
            .iter()
            .map(|r| {
                let default = &r.apply_server_side_encryption_by_default;
                let by_default = sdk::ServerSideEncryptionByDefault::builder()
                    .sse_algorithm(sdk::ServerSideEncryption::from(default.sse_algorithm.as_str()))
                    .set_kms_master_key_id(default.kms_master_key_id.clone())
                    .build()
                    .map_err(|e| build_error(&e))?;
                Ok(sdk::ServerSideEncryptionRule::builder()
                    .apply_server_side_encryption_by_default(by_default)
                    .set_bucket_key_enabled(r.bucket_key_enabled)
                    .build())
            })
            .collect::<Result<Vec<_>, AwsError>>()?;
        let configuration = sdk::ServerSideEncryptionConfiguration::builder()
            .set_rules(Some(rules))
            .build()
            .map_err(|e| build_error(&e))?;
        observe_call(
            SERVICE,
            "PutBucketEncryption",
            self.client
                .put_bucket_encryption()
                .bucket(bucket)
                .server_side_encryption_configuration(configuration)
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn delete_bucket_encryption(&self, bucket: &str) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "DeleteBucketEncryption",
            self.client
                .delete_bucket_encryption()
                .bucket(bucket)
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn get_bucket_tagging(
        &self,
        bucket: &str,
    ) -> Result<BTreeMap<String, String>, AwsError> {
        let output = absent_as_default(
            observe_call(
                SERVICE,
                "GetBucketTagging",
                self.client.get_bucket_tagging().bucket(bucket).send().await,
            )
            .map(Some),
        )?;
        Ok(output
            .map(|o| {
                o.tag_set()
                    .iter()
                    .map(|t| (t.key().to_string(), t.value().to_string()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put_bucket_tagging(
        &self,
        bucket: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), AwsError> {
        let tag_set = tags
            .iter()
            .map(|(k, v)| {
                sdk::Tag::builder()
                    .key(k)
                    .value(v)
                    .build()
                    .map_err(|e| build_error(&e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let tagging = sdk::Tagging::builder()
            .set_tag_set(Some(tag_set))
            .build()
            .map_err(|e| build_error(&e))?;
        observe_call(
            SERVICE,
            "PutBucketTagging",
            self.client
                .put_bucket_tagging()
                .bucket(bucket)
                .tagging(tagging)
                .send()
                .await,
        )
        .map(|_| ())
    }

    async fn delete_bucket_tagging(&self, bucket: &str) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "DeleteBucketTagging",
            self.client.delete_bucket_tagging().bucket(bucket).send().await,
        )
        .map(|_| ())
    }

    async fn get_bucket_versioning(&self, bucket: &str) -> Result<Option<String>, AwsError> {
        let output = observe_call(
            SERVICE,
            "GetBucketVersioning",
            self.client.get_bucket_versioning().bucket(bucket).send().await,
        )?;
        Ok(output.status().map(|s| s.as_str().to_string()))
    }

    async fn put_bucket_versioning(&self, bucket: &str, status: &str) -> Result<(), AwsError> {
        observe_call(
            SERVICE,
            "PutBucketVersioning",
            self.client
                .put_bucket_versioning()
                .bucket(bucket)
                .versioning_configuration(
                    sdk::VersioningConfiguration::builder()
                        .status(sdk::BucketVersioningStatus::from(status))
                        .build(),
                )
                .send()
                .await,
        )
        .map(|_| ())
    }
}
