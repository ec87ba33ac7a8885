//! REST token endpoint implementation.
//!
//! Talks to the backend's credential endpoints for one token pool:
//! `POST /auth/token` and `POST /auth/refresh` (or their `/admin` twins),
//! both answering `{ accessToken, refreshToken?, expiresIn }`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tollgate_application::ports::{HttpClient, TokenEndpoint, TokenEndpointError};
use tollgate_domain::{ApiRequest, ApiResponse, Credentials, RefreshRequest, TokenGrant, TokenPool};
use tracing::debug;

/// Token endpoint adapter over any `HttpClient`.
///
/// Requests are sent without an `Authorization` header; the credential
/// endpoints authenticate through the request body.
pub struct RestTokenEndpoint<C> {
    client: Arc<C>,
    pool: TokenPool,
}

impl<C: HttpClient> RestTokenEndpoint<C> {
    /// Creates an endpoint for `pool`.
    #[must_use]
    pub const fn new(client: Arc<C>, pool: TokenPool) -> Self {
        Self { client, pool }
    }

    async fn post(&self, path: &str, body: Value) -> Result<TokenGrant, TokenEndpointError> {
        let response = self.client.execute(&ApiRequest::post(path, body)).await?;
        debug!(pool = %self.pool, path, status = response.status, "Token endpoint responded");

        if !response.is_success() {
            return Err(TokenEndpointError::Rejected {
                status: response.status,
                message: error_message(&response),
            });
        }

        serde_json::from_value(response.data)
            .map_err(|e| TokenEndpointError::InvalidResponse(e.to_string()))
    }
}

/// Extracts a human-readable reason from an error response.
fn error_message(response: &ApiResponse) -> String {
    let data = &response.data;
    ["message", "error_description", "error"]
        .iter()
        .find_map(|field| data.get(field).and_then(Value::as_str))
        .or_else(|| data.as_str())
        .filter(|message| !message.is_empty())
        .map_or_else(|| format!("HTTP {}", response.status), ToString::to_string)
}

#[async_trait]
impl<C: HttpClient> TokenEndpoint for RestTokenEndpoint<C> {
    async fn obtain(
        &self,
        credentials: Option<&Credentials>,
    ) -> Result<TokenGrant, TokenEndpointError> {
        let body = credentials.map_or_else(|| json!({}), |c| json!(c));
        self.post(self.pool.token_path(), body).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, TokenEndpointError> {
        let body = json!(RefreshRequest {
            refresh_token: refresh_token.to_string(),
        });
        self.post(self.pool.refresh_path(), body).await
    }
}
