//! Error types for client operations.

use std::time::Duration;

/// The result type used throughout `monaco-client`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the client contracts.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The remote rejected or failed the call. The body is surfaced verbatim.
    #[error("remote returned HTTP {status}: {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Response body or transport message, verbatim.
        message: String,
        /// Server-provided retry hint, if any.
        retry_after: Option<Duration>,
    },

    /// Authentication or token handling failed.
    #[error("authentication failed: {message}")]
    Auth {
        /// Description of the failure.
        message: String,
    },

    /// The call was cancelled before completion.
    #[error("operation cancelled")]
    Cancelled,

    /// A payload could not be serialized or a response not deserialized.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the failure.
        message: String,
    },

    /// An internal invariant was violated, e.g. a poisoned lock.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a remote error without a retry hint.
    #[must_use]
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The HTTP status, if this is a remote error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a remote 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True if a backoff-and-retry of an idempotent call may succeed.
    ///
    /// Overload responses (429) and temporary unavailability (503) qualify;
    /// everything else is terminal.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self.status(), Some(429 | 503))
    }

    /// The server-provided retry hint, if any.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Remote { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
