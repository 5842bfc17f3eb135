//! # Credential Resolver
//!
//! Turns a managed resource's ProviderConfig into an [`SdkConfig`].
//!
//! Nothing is cached across reconciliations: every pass re-reads the
//! ProviderConfig and, for `Secret` sources, the credentials secret.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crd::{CredentialsSource, ProviderConfig, ProviderConfigSpec, ResourceSpec};

const DEFAULT_PROFILE: &str = "default";
const DEFAULT_PARTITION: &str = "aws";
const DEFAULT_SESSION_NAME: &str = "provider-aws";
const KEY_ACCESS_KEY_ID: &str = "aws_access_key_id";
const KEY_SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
const KEY_SESSION_TOKEN: &str = "aws_session_token";

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("cannot get ProviderConfig {name}: {source}")]
    ProviderConfig {
        name: String,
        #[source]
        source: kube::Error,
    },
    #[error("ProviderConfig {0} not found")]
    ProviderConfigNotFound(String),
    #[error("credentials source Secret requires spec.credentials.secretRef")]
    MissingSecretRef,
    #[error("cannot get credentials secret {namespace}/{name}: {source}")]
    Secret {
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },
    #[error("credentials secret {namespace}/{name} has no key {key}")]
    MissingSecretKey {
        namespace: String,
        name: String,
        key: String,
    },
    #[error("cannot parse credentials file: {0}")]
    Parse(String),
    #[error("profile {0} not found in credentials file")]
    ProfileNotFound(String),
    #[error("profile {profile} has no {key}")]
    MissingKey { profile: String, key: &'static str },
    #[error("no region configured: set forProvider.region or the ProviderConfig region")]
    MissingRegion,
    #[error("unknown partition {0}")]
    UnknownPartition(String),
}

impl CredentialsError {
    /// API server hiccups are worth retrying; configuration mistakes are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ProviderConfig { .. } | Self::Secret { .. })
    }
}

/// Static credentials parsed from a shared credentials file. Wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<REDACTED>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

impl AwsCredentials {
    fn to_sdk(&self) -> Credentials {
        Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            self.session_token.clone(),
            None,
            "provider-aws-secret",
        )
    }
}

/// Parse a shared credentials file and select `profile` (case-insensitive,
/// `default` when unset).
pub fn parse_credentials_file(
    data: &str,
    profile: Option<&str>,
) -> Result<AwsCredentials, CredentialsError> {
    let profile = profile
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PROFILE);
    let ini = ini::Ini::load_from_str(data).map_err(|e| CredentialsError::Parse(e.to_string()))?;

    let section = ini
        .iter()
        .find(|(name, _)| name.is_some_and(|n| n.trim().eq_ignore_ascii_case(profile)))
        .map(|(_, props)| props)
        .ok_or_else(|| CredentialsError::ProfileNotFound(profile.to_string()))?;

    let value = |key: &str| {
        section
            .iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let required = |key: &'static str| {
        value(key).ok_or_else(|| CredentialsError::MissingKey {
            profile: profile.to_string(),
            key,
        })
    };

    Ok(AwsCredentials {
        access_key_id: required(KEY_ACCESS_KEY_ID)?,
        secret_access_key: required(KEY_SECRET_ACCESS_KEY)?,
        session_token: value(KEY_SESSION_TOKEN),
    })
}

/// Whether a kind's API calls go to a regional or a partition-global endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionScope {
    Regional,
    Global,
}

/// Pseudo-region used for partition-global services.
pub fn global_region(partition: &str) -> Result<&'static str, CredentialsError> {
    match partition {
        "aws" => Ok("aws-global"),
        "aws-us-gov" => Ok("aws-us-gov-global"),
        "aws-cn" => Ok("aws-cn-global"),
        "aws-iso" => Ok("aws-iso-global"),
        "aws-iso-b" => Ok("aws-iso-b-global"),
        other => Err(CredentialsError::UnknownPartition(other.to_string())),
    }
}

/// Region for a call: the resource's own region, then the ProviderConfig
/// region. Global kinds always use the partition pseudo-region.
pub fn resolve_region(
    scope: RegionScope,
    resource_region: Option<&str>,
    config: &ProviderConfigSpec,
) -> Result<String, CredentialsError> {
    match scope {
        RegionScope::Global => {
            let partition = config.partition.as_deref().unwrap_or(DEFAULT_PARTITION);
            global_region(partition).map(str::to_string)
        }
        RegionScope::Regional => resource_region
            .or(config.region.as_deref())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .ok_or(CredentialsError::MissingRegion),
    }
}

/// Reads ProviderConfigs and credentials secrets from the cluster.
#[derive(Clone)]
pub struct CredentialResolver {
    client: Client,
    default_provider_config: String,
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("default_provider_config", &self.default_provider_config)
            .finish_non_exhaustive()
    }
}

impl CredentialResolver {
    pub fn new(client: Client, default_provider_config: impl Into<String>) -> Self {
        Self {
            client,
            default_provider_config: default_provider_config.into(),
        }
    }

    /// Build an SDK config for a managed resource.
    pub async fn resolve(
        &self,
        spec: &ResourceSpec,
        resource_region: Option<&str>,
        scope: RegionScope,
    ) -> Result<SdkConfig, CredentialsError> {
        let name = spec
            .provider_config_ref
            .as_ref()
            .map_or(self.default_provider_config.as_str(), |r| r.name.as_str());

        let provider_config = Api::<ProviderConfig>::all(self.client.clone())
            .get_opt(name)
            .await
            .map_err(|source| CredentialsError::ProviderConfig {
                name: name.to_string(),
                source,
            })?
            .ok_or_else(|| CredentialsError::ProviderConfigNotFound(name.to_string()))?;
        let pc = &provider_config.spec;

        let region = resolve_region(scope, resource_region, pc)?;
        debug!(provider_config = name, region = %region, "Resolving AWS credentials");

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region));
        if let Some(endpoint) = &pc.endpoint {
            info!("Using AWS endpoint override {endpoint} from ProviderConfig {name}");
            loader = loader.endpoint_url(endpoint);
        }

        loader = match pc.credentials.source {
            CredentialsSource::None => loader.no_credentials(),
            CredentialsSource::Secret => {
                let credentials = self.read_secret_credentials(pc).await?;
                loader.credentials_provider(credentials.to_sdk())
            }
            // Ambient chain: IRSA web identity, EKS pod identity, instance profile
            CredentialsSource::ServiceAccount
            | CredentialsSource::PodIdentity
            | CredentialsSource::InjectedIdentity => loader,
        };

        let mut config = loader.load().await;

        for role in &pc.assume_role_chain {
            debug!(role_arn = %role.role_arn, "Assuming role");
            let mut builder = aws_config::sts::AssumeRoleProvider::builder(&role.role_arn)
                .session_name(
                    role.session_name
                        .as_deref()
                        .unwrap_or(DEFAULT_SESSION_NAME),
                )
                .configure(&config);
            if let Some(external_id) = &role.external_id {
                builder = builder.external_id(external_id);
            }
            let provider = builder.build().await;
            config = config
                .into_builder()
                .credentials_provider(SharedCredentialsProvider::new(provider))
                .build();
        }

        Ok(config)
    }

    async fn read_secret_credentials(
        &self,
        pc: &ProviderConfigSpec,
    ) -> Result<AwsCredentials, CredentialsError> {
        let selector = pc
            .credentials
            .secret_ref
            .as_ref()
            .ok_or(CredentialsError::MissingSecretRef)?;

        let secret = Api::<Secret>::namespaced(self.client.clone(), &selector.namespace)
            .get(&selector.name)
            .await
            .map_err(|source| CredentialsError::Secret {
                namespace: selector.namespace.clone(),
                name: selector.name.clone(),
                source,
            })?;

        let missing = || CredentialsError::MissingSecretKey {
            namespace: selector.namespace.clone(),
            name: selector.name.clone(),
            key: selector.key.clone(),
        };
        let mut raw = secret
            .data
            .and_then(|mut data| data.remove(&selector.key))
            .ok_or_else(missing)?
            .0;
        let parsed = std::str::from_utf8(&raw)
            .map_err(|e| CredentialsError::Parse(e.to_string()))
            .and_then(|text| parse_credentials_file(text, pc.credentials.profile.as_deref()));
        raw.zeroize();
        parsed
    }
}
