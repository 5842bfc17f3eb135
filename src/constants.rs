//! # Constants
//!
//! Defaults shared by configuration, the runtime and the managed reconciler.

/// Provider name used for field management, idempotency tokens and managed tags
pub const DEFAULT_PROVIDER_NAME: &str = "provider-aws";

/// ProviderConfig used when a managed resource does not name one
pub const DEFAULT_PROVIDER_CONFIG: &str = "default";

/// Interval between passes for resources that are up to date (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Interval between passes while AWS is still applying a change (seconds)
pub const DEFAULT_SHORT_WAIT_SECS: u64 = 30;

/// Upper bound for a single reconciliation pass (seconds)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 60;

/// Maximum number of resources reconciled in parallel per kind
pub const DEFAULT_MAX_RECONCILE_RATE: u16 = 10;

/// Exponential backoff bounds for transient errors (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 1;
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 60;

/// Requeue delay used when the backoff state cannot be read (seconds)
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 30;

/// HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Server startup timeout (seconds)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Server readiness poll interval (milliseconds)
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 100;

/// Default tracing filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "provider_aws=info";

/// Tracing filter with `--debug`
pub const DEBUG_LOG_FILTER: &str = "provider_aws=debug,kube_runtime=info";

/// AWS-side identifier of a managed resource
pub const ANNOTATION_EXTERNAL_NAME: &str = "aws.microscaler.io/external-name";

/// Create bookkeeping, recorded around every AWS create call
pub const ANNOTATION_EXTERNAL_CREATE_PENDING: &str = "aws.microscaler.io/external-create-pending";
pub const ANNOTATION_EXTERNAL_CREATE_SUCCEEDED: &str =
    "aws.microscaler.io/external-create-succeeded";
pub const ANNOTATION_EXTERNAL_CREATE_FAILED: &str = "aws.microscaler.io/external-create-failed";

/// Held while the AWS resource may still exist
pub const FINALIZER: &str = "finalizer.managedresource.aws.microscaler.io";
