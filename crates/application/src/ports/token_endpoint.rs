//! Token endpoint port
//!
//! The backend's credential endpoints: `POST /auth/token` and
//! `POST /auth/refresh`, both answering with a [`TokenGrant`].

use async_trait::async_trait;
use thiserror::Error;
use tollgate_domain::{Credentials, TokenGrant};

use super::HttpClientError;

/// Failures of a token endpoint call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenEndpointError {
    /// The endpoint could not be reached.
    #[error("token endpoint unreachable: {0}")]
    Transport(#[from] HttpClientError),

    /// The endpoint answered with a non-success status.
    #[error("token endpoint returned {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error description from the backend, if any.
        message: String,
    },

    /// The endpoint answered 2xx with a body that is not a token grant.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

/// Port for obtaining and refreshing credentials.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Obtains a first grant, with initial credentials or none (bootstrap).
    async fn obtain(
        &self,
        credentials: Option<&Credentials>,
    ) -> Result<TokenGrant, TokenEndpointError>;

    /// Exchanges a refresh token for a new grant.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, TokenEndpointError>;
}
