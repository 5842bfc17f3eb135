//! AWS error classification.

use aws_sdk_elasticache::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

/// Routing class of an AWS error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Throttled,
    InvalidParameter,
    PermissionDenied,
    Transport,
    Other,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::Throttled => "throttled",
            Self::InvalidParameter => "invalid_parameter",
            Self::PermissionDenied => "permission_denied",
            Self::Transport => "transport",
            Self::Other => "other",
        }
    }

    /// Whether a retry with backoff may succeed without a spec change
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Throttled | Self::Transport)
    }

    /// Classify an AWS error code. Some services report missing resources as
    /// generic validation errors, so the message is consulted for those.
    pub fn from_code(code: &str, message: &str) -> Self {
        match code {
            "ReplicationGroupNotFoundFault"
            | "CacheClusterNotFound"
            | "CacheSubnetGroupNotFoundFault"
            | "ResourceNotFoundException"
            | "NoSuchBucket"
            | "NotFound"
            | "NoSuchCORSConfiguration"
            | "NoSuchTagSet"
            | "NoSuchTagSetError"
            | "ServerSideEncryptionConfigurationNotFoundError" => Self::NotFound,
            "ValidationError" if message.contains("does not exist") => Self::NotFound,
            "ReplicationGroupAlreadyExists"
            | "CacheClusterAlreadyExists"
            | "CacheSubnetGroupAlreadyExists"
            | "DuplicateResourceException"
            | "BucketAlreadyOwnedByYou" => Self::AlreadyExists,
            "Throttling"
            | "ThrottlingException"
            | "ThrottledException"
            | "RequestLimitExceeded"
            | "TooManyRequestsException"
            | "SlowDown"
            | "RequestThrottled" => Self::Throttled,
            "InvalidParameterValue"
            | "InvalidParameterCombination"
            | "InvalidParameterValueException"
            | "InvalidParametersException"
            | "InvalidParameterException"
            | "ValidationException"
            | "ValidationError"
            | "InvalidReplicationGroupState"
            | "InvalidCacheClusterState"
            | "InvalidStateException"
            | "MalformedXML"
            | "InvalidArgument"
            | "InvalidBucketName"
            | "BucketAlreadyExists"
            | "IllegalLocationConstraintException" => Self::InvalidParameter,
            "AccessDenied"
            | "AccessDeniedException"
            | "UnauthorizedOperation"
            | "InvalidClientTokenId"
            | "ExpiredToken"
            | "ExpiredTokenException"
            | "SignatureDoesNotMatch" => Self::PermissionDenied,
            _ => Self::Other,
        }
    }
}

/// A classified AWS error. The original code is kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.render())]
pub struct AwsError {
    pub kind: ErrorKind,
    pub code: Option<String>,
    pub message: String,
}

impl AwsError {
    pub fn new(kind: ErrorKind, code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.map(str::to_string),
            message: message.into(),
        }
    }

    /// Build an error from a raw AWS code and message.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: ErrorKind::from_code(code, &message),
            code: Some(code.to_string()),
            message,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, None, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind == ErrorKind::AlreadyExists
    }

    /// Classify an SDK error from any service crate.
    pub(crate) fn from_sdk<E, R>(err: &SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        match err {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => Self::new(
                ErrorKind::Transport,
                None,
                DisplayErrorContext(err).to_string(),
            ),
            _ => {
                let message = err
                    .message()
                    .map_or_else(|| DisplayErrorContext(err).to_string(), str::to_string);
                match err.code() {
                    Some(code) => Self::from_code(code, message),
                    None => Self::new(ErrorKind::Other, None, message),
                }
            }
        }
    }

    fn render(&self) -> String {
        match &self.code {
            Some(code) => format!("{code}: {}", self.message),
            None => self.message.clone(),
        }
    }
}
