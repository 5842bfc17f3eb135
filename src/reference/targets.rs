//! Kinds that managed resources reference, and how their value is read.

use super::Extractor;

/// A referenceable kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub extractor: Extractor,
}

pub const CACHE_SUBNET_GROUP: Target = Target {
    group: "elasticache.aws.microscaler.io",
    version: "v1beta1",
    kind: "CacheSubnetGroup",
    extractor: Extractor::ExternalName,
};

pub const SECURITY_GROUP: Target = Target {
    group: "ec2.aws.microscaler.io",
    version: "v1beta1",
    kind: "SecurityGroup",
    extractor: Extractor::ExternalName,
};

pub const SUBNET: Target = Target {
    group: "ec2.aws.microscaler.io",
    version: "v1beta1",
    kind: "Subnet",
    extractor: Extractor::ExternalName,
};

pub const SNS_TOPIC: Target = Target {
    group: "sns.aws.microscaler.io",
    version: "v1beta1",
    kind: "Topic",
    extractor: Extractor::AtProviderField("arn"),
};
