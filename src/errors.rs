//! Error types for dioxus-backend-hooks
//!
//! Every asynchronous failure ends up as a [`BackendError`] inside an
//! [`AsyncResultState`](crate::async_state::AsyncResultState). Only reference
//! construction fails synchronously, with [`BackendError::InvalidReference`].

use crate::policy::Source;

/// Failure reported by a backend operation or raised while building a reference
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The requested data source could not satisfy a one-shot read
    #[error("{source_kind} source unavailable: {message}")]
    SourceUnavailable { source_kind: Source, message: String },
    /// A live subscription failed or was denied
    #[error("subscription failed: {0}")]
    Subscription(String),
    /// A command-style invocation failed
    #[error("operation failed: {0}")]
    Operation(String),
    /// A user-scoped command was invoked without a signed-in user
    #[error("user is not authenticated")]
    NotAuthenticated,
    /// A logical reference (path, function name) is malformed
    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

impl BackendError {
    /// Shorthand for [`BackendError::SourceUnavailable`]
    pub fn unavailable(source_kind: Source, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_kind,
            message: message.into(),
        }
    }

    /// Returns true for [`BackendError::SourceUnavailable`]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Operation(err.to_string())
    }
}

/// Result alias used by backend traits and callables
pub type BackendResult<T> = Result<T, BackendError>;

/// Returned when a string does not name a known fetch policy
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fetch policy: {0}")]
pub struct ParsePolicyError(pub String);
