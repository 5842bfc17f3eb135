//! # AWS Gateway
//!
//! Narrow per-service traits over crate-owned request and response shapes.
//! The `Sdk*` types implement them with the official AWS SDK clients; tests
//! inject in-memory fakes.
//!
//! Every SDK error is classified once, here, into an [`AwsError`].

pub mod credentials;
pub mod elasticache;
mod error;
pub mod s3;
pub mod servicecatalog;

pub use credentials::{CredentialResolver, CredentialsError, RegionScope};
pub use elasticache::{ElastiCacheGateway, SdkElastiCache};
pub use error::{AwsError, ErrorKind};
pub use s3::{S3Gateway, SdkS3};
pub use servicecatalog::{SdkServiceCatalog, ServiceCatalogGateway};

use crate::observability::metrics;

/// Classify an SDK result and record the call outcome.
pub(crate) fn observe_call<T, E, R>(
    service: &'static str,
    operation: &'static str,
    result: Result<T, aws_sdk_elasticache::error::SdkError<E, R>>,
) -> Result<T, AwsError>
where
    E: aws_sdk_elasticache::error::ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match result {
        Ok(output) => {
            metrics::record_aws_call(service, operation, "success");
            Ok(output)
        }
        Err(e) => {
            let err = AwsError::from_sdk(&e);
            metrics::record_aws_call(service, operation, err.kind.as_str());
            tracing::debug!(service, operation, code = ?err.code, "AWS call failed: {}", err.message);
            Err(err)
        }
    }
}
