//! Application error types

use thiserror::Error;
use tollgate_domain::DomainError;

use crate::gateway::GatewayError;
use crate::ports::{StorageError, TokenEndpointError};

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// A gateway call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The token endpoint refused or failed a login.
    #[error("login failed: {0}")]
    TokenEndpoint(#[from] TokenEndpointError),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Returns true if the error means the user is now signed out.
    #[must_use]
    pub const fn is_session_ended(&self) -> bool {
        matches!(self, Self::Gateway(e) if e.is_session_ended())
    }
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
