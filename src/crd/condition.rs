//! # Conditions
//!
//! `Ready` reports whether the AWS resource is usable, `Synced` whether the last
//! reconciliation pass succeeded.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ResourceStatus;

pub const CONDITION_READY: &str = "Ready";
pub const CONDITION_SYNCED: &str = "Synced";

const STATUS_TRUE: &str = "True";
const STATUS_FALSE: &str = "False";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionReason {
    Available,
    Unavailable,
    Creating,
    Deleting,
    ReconcileSuccess,
    ReconcileError,
}

impl ConditionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Unavailable => "Unavailable",
            Self::Creating => "Creating",
            Self::Deleting => "Deleting",
            Self::ReconcileSuccess => "ReconcileSuccess",
            Self::ReconcileError => "ReconcileError",
        }
    }
}

/// Condition represents a condition of a resource
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (Ready, Synced)
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Last transition time (RFC3339)
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Reason for the condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

impl Condition {
    fn new(r#type: &str, status: &str, reason: ConditionReason) -> Self {
        Self {
            r#type: r#type.to_string(),
            status: status.to_string(),
            last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
            reason: Some(reason.as_str().to_string()),
            message: None,
        }
    }

    pub fn available() -> Self {
        Self::new(CONDITION_READY, STATUS_TRUE, ConditionReason::Available)
    }

    pub fn unavailable() -> Self {
        Self::new(CONDITION_READY, STATUS_FALSE, ConditionReason::Unavailable)
    }

    pub fn creating() -> Self {
        Self::new(CONDITION_READY, STATUS_FALSE, ConditionReason::Creating)
    }

    pub fn deleting() -> Self {
        Self::new(CONDITION_READY, STATUS_FALSE, ConditionReason::Deleting)
    }

    pub fn reconcile_success() -> Self {
        Self::new(CONDITION_SYNCED, STATUS_TRUE, ConditionReason::ReconcileSuccess)
    }

    pub fn reconcile_error(err: &impl std::fmt::Display) -> Self {
        Self::new(CONDITION_SYNCED, STATUS_FALSE, ConditionReason::ReconcileError)
            .with_message(err.to_string())
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_true(&self) -> bool {
        self.status == STATUS_TRUE
    }

    pub fn has_reason(&self, reason: ConditionReason) -> bool {
        self.reason.as_deref() == Some(reason.as_str())
    }

    /// Equality ignoring the transition time.
    pub fn equivalent(&self, other: &Self) -> bool {
        self.r#type == other.r#type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

impl ResourceStatus {
    /// Set conditions by type. An equivalent existing condition keeps its
    /// original transition time.
    pub fn set_conditions(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        for condition in conditions {
            match self
                .conditions
                .iter_mut()
                .find(|c| c.r#type == condition.r#type)
            {
                Some(existing) if existing.equivalent(&condition) => {}
                Some(existing) => *existing = condition,
                None => self.conditions.push(condition),
            }
        }
    }

    pub fn condition(&self, r#type: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == r#type)
    }

    pub fn is_ready(&self) -> bool {
        self.condition(CONDITION_READY).is_some_and(Condition::is_true)
    }
}
