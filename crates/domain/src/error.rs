//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A request path is empty or cannot be joined to the base URL.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A required header name is invalid.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The token pool name is not recognized.
    #[error("unknown token pool: {0}")]
    UnknownTokenPool(String),

    /// A request lifecycle was asked to make an impossible move.
    #[error("invalid request state transition: {from} -> {to}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Requested state.
        to: String,
    },
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
