//! Error taxonomy
//!
//! Input errors (`PlanLoadError`, `PlanValidationError`, `ConfigError`) are
//! never retryable. Provider-setup failures surface as dedicated
//! `ProviderError` variants so callers can map them to exit codes. The
//! engine wraps everything it propagates in `SyncError` and never recovers
//! inside a run; between runs, marker discovery plus provider idempotency
//! is the recovery path.

use std::path::PathBuf;
use thiserror::Error;

/// Plan files could not be turned into a plan.
#[derive(Debug, Error)]
pub enum PlanLoadError {
    #[error("failed to read plan file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in plan file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("plan file {path} does not match the expected shape: {message}")]
    Schema { path: PathBuf, message: String },

    #[error("no plan items were loaded")]
    Empty,
}

/// Relational integrity violations, aggregated across the whole plan.
#[derive(Debug, Error)]
#[error("plan validation failed with {} error(s):\n  {}", .errors.len(), .errors.join("\n  "))]
pub struct PlanValidationError {
    pub errors: Vec<String>,
}

/// Config file problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Steps of the multi-step create sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStep {
    CreateIssue,
    SetIssueType,
    AddToBoard,
    SetFields,
}

/// `create_item` failed partway through its sequence.
///
/// Carries whatever identity the external system already assigned so the
/// caller can report it; the next run finds the half-created item through
/// its marker block and completes it.
#[derive(Debug, Clone, Error)]
#[error("item creation failed after {completed_steps:?}: {message}")]
pub struct CreateItemPartialFailure {
    pub created_item_id: Option<String>,
    pub created_item_key: Option<String>,
    pub created_item_url: Option<String>,
    pub completed_steps: Vec<CreateStep>,
    pub retryable: bool,
    pub message: String,
}

/// Anything a provider can fail with.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("provider is missing required capability: {capability}")]
    MissingCapability { capability: String },

    #[error("invalid project board URL: {0}")]
    ProjectUrl(String),

    #[error("item not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    PartialCreate(#[from] CreateItemPartialFailure),

    #[error("provider API error: {message}")]
    Api { message: String, retryable: bool },
}

impl ProviderError {
    pub fn api(message: impl Into<String>) -> Self {
        ProviderError::Api {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        ProviderError::Api {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn missing_capability(capability: impl Into<String>) -> Self {
        ProviderError::MissingCapability {
            capability: capability.into(),
        }
    }
}

/// Engine-level failure wrapping whatever caused it.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("sync run was cancelled")]
    Cancelled,

    #[error("multiple plans found under the configured label; pick one of: {}", .candidates.join(", "))]
    AmbiguousPlan { candidates: Vec<String> },

    #[error("sync engine error: {0}")]
    Engine(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_problem() {
        let err = PlanValidationError {
            errors: vec!["duplicate item id: T1".to_string(), "E1: epics must not have a parent_id".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("2 error(s)"));
        assert!(text.contains("duplicate item id: T1"));
        assert!(text.contains("epics must not have a parent_id"));
    }

    #[test]
    fn partial_create_converts_into_provider_error() {
        let failure = CreateItemPartialFailure {
            created_item_id: Some("node-9".to_string()),
            created_item_key: Some("#12".to_string()),
            created_item_url: None,
            completed_steps: vec![CreateStep::CreateIssue],
            retryable: true,
            message: "board add timed out".to_string(),
        };
        let err: ProviderError = failure.into();
        match err {
            ProviderError::PartialCreate(f) => {
                assert_eq!(f.created_item_id.as_deref(), Some("node-9"));
                assert!(f.retryable);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn missing_capability_names_the_capability() {
        let err = ProviderError::missing_capability("discovery_by_body_contains");
        assert!(err.to_string().contains("discovery_by_body_contains"));
    }
}
