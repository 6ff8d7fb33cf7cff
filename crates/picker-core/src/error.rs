//! Error types for picker-core
//!
//! Upstream failures never surface here: they are classified into an
//! [`Outcome`](crate::Outcome). These errors only describe the caller giving
//! up, or the gateway being misconfigured.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// The caller's cancellation token fired while a call was suspended
    #[error("request cancelled")]
    Cancelled,

    /// The whole call exceeded its deadline
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// HTTP client could not be built
    #[error("http client error: {0}")]
    Http(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Transport-level failure, before classification.
///
/// Produced by [`Transport::send`](crate::Transport::send) and consumed by
/// classification, which turns it into [`Outcome::TransportFailure`](crate::Outcome::TransportFailure).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Could not connect to the upstream
    #[error("connect error: {0}")]
    Connect(String),

    /// The single attempt timed out
    #[error("request timed out")]
    Timeout,

    /// Any other I/O or protocol failure
    #[error("io error: {0}")]
    Io(String),
}

impl Error {
    /// Whether this error came from the caller aborting the call.
    #[must_use]
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Timeout(_))
    }
}
