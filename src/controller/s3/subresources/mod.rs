//! Bucket sub-configurations, each observed and applied on its own.
//!
//! Handlers are ordered; a bucket update applies the first one that is not
//! up to date.

/// Handler boilerplate: a struct over the gateway with a constructor and a
/// `Debug` that skips the gateway.
macro_rules! handler {
    ($name:ident) => {
        pub struct $name {
            gateway: std::sync::Arc<dyn $crate::aws::S3Gateway>,
        }

        impl $name {
            pub fn new(gateway: std::sync::Arc<dyn $crate::aws::S3Gateway>) -> Self {
                Self { gateway }
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name)).finish_non_exhaustive()
            }
        }
    };
}
use handler;

mod accelerate;
mod cors;
mod encryption;
mod payment;
mod tagging;
mod versioning;

use std::sync::Arc;

pub use accelerate::AccelerateClient;
pub use cors::CorsClient;
pub use encryption::EncryptionClient;
pub use payment::PaymentClient;
pub use tagging::TaggingClient;
pub use versioning::VersioningClient;

use crate::aws::S3Gateway;
use crate::crd::Bucket;
use crate::managed::subresource::{SubresourceClient, Subresources};

pub const STATUS_ENABLED: &str = "Enabled";
pub const STATUS_SUSPENDED: &str = "Suspended";
pub const PAYER_BUCKET_OWNER: &str = "BucketOwner";

/// Every handler, in the order they are applied.
pub fn all(gateway: &Arc<dyn S3Gateway>) -> Subresources<Bucket> {
    let handlers: [Box<dyn SubresourceClient<Bucket>>; 6] = [
        Box::new(AccelerateClient::new(Arc::clone(gateway))),
        Box::new(CorsClient::new(Arc::clone(gateway))),
        Box::new(PaymentClient::new(Arc::clone(gateway))),
        Box::new(EncryptionClient::new(Arc::clone(gateway))),
        Box::new(TaggingClient::new(Arc::clone(gateway))),
        Box::new(VersioningClient::new(Arc::clone(gateway))),
    ];
    handlers.into()
}

/// Bucket name in AWS
pub(crate) fn bucket_name(mr: &Bucket) -> String {
    crate::managed::meta::external_name_or_name(mr)
}
