//! HTTP Client port

use std::future::Future;

use thiserror::Error;
use tollgate_domain::{ApiRequest, ApiResponse};

/// Transport-level failures. Never produced for an HTTP status; a 4xx/5xx
/// response is still a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpClientError {
    /// The request could not be turned into a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request body could not be encoded.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// Host name resolution failed.
    #[error("DNS resolution failed for {host}: {message}")]
    DnsError {
        /// The host that failed to resolve.
        host: String,
        /// Error description.
        message: String,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The connection could not be established or was dropped.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// No response within the configured timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for dispatching requests to the backend.
///
/// Implementations resolve `request.path` against their configured base URL
/// and send `request.headers` verbatim; credential handling belongs to the
/// gateway.
pub trait HttpClient: Send + Sync {
    /// Dispatches a request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error only if no response was received.
    fn execute(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, HttpClientError>> + Send;
}
