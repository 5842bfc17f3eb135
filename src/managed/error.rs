//! Errors surfaced by a reconciliation pass.

use std::time::Duration;
use thiserror::Error;

use crate::aws::{AwsError, CredentialsError};
use crate::reference::ReferenceError;

#[derive(Error, Debug)]
pub enum ReconcileError {
    /// AWS call failed; `context` names the operation
    #[error("{context}: {source}")]
    Aws {
        context: &'static str,
        #[source]
        source: AwsError,
    },
    #[error("cannot resolve references: {0}")]
    References(#[from] ReferenceError),
    #[error("cannot connect to AWS: {0}")]
    Credentials(#[from] CredentialsError),
    #[error("{context}: {source}")]
    Kube {
        context: &'static str,
        #[source]
        source: kube::Error,
    },
    #[error("{0}")]
    InvalidSpec(String),
    /// The previous pass may have created the resource without recording it
    #[error("cannot determine creation result - remove the aws.microscaler.io/external-create-pending annotation if it is safe to proceed")]
    CreateIncomplete,
    /// AWS is still applying a previous change
    #[error("{0}")]
    UpdatePending(String),
    #[error("reconciliation timed out after {0:?}")]
    Timeout(Duration),
    #[error("cannot serialize resource: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReconcileError {
    /// Wrap an AWS error with a static context, for `map_err`.
    pub fn aws(context: &'static str) -> impl FnOnce(AwsError) -> Self {
        move |source| Self::Aws { context, source }
    }

    pub fn kube(context: &'static str) -> impl FnOnce(kube::Error) -> Self {
        move |source| Self::Kube { context, source }
    }

    /// The AWS error behind this failure, if any.
    pub fn aws_error(&self) -> Option<&AwsError> {
        match self {
            Self::Aws { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Transient errors requeue with backoff, permanent ones wait for the
    /// poll interval.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Aws { source, .. } => source.kind.is_transient(),
            Self::References(_) | Self::UpdatePending(_) | Self::Timeout(_) => true,
            Self::Credentials(e) => e.is_transient(),
            Self::Kube { source, .. } => match source {
                kube::Error::Api(resp) => resp.code == 409 || resp.code == 429 || resp.code >= 500,
                _ => true,
            },
            Self::InvalidSpec(_) | Self::CreateIncomplete | Self::Serialization(_) => false,
        }
    }

    /// Short label used for metrics and logs.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Aws { source, .. } => source.kind.as_str(),
            Self::References(_) => "dependency_not_ready",
            Self::Credentials(_) => "credentials",
            Self::Kube { .. } => "kube",
            Self::InvalidSpec(_) => "invalid_spec",
            Self::CreateIncomplete => "create_incomplete",
            Self::UpdatePending(_) => "update_pending",
            Self::Timeout(_) => "timeout",
            Self::Serialization(_) => "internal",
        }
    }
}
