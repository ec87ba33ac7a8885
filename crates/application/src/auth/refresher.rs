//! Credential refresher: exchanges a refresh token for a new session.
//!
//! Stateless apart from its collaborators; it never writes the token store.

use std::sync::Arc;

use tollgate_domain::{AuthError, Session};
use tracing::debug;

use crate::ports::{Clock, TokenEndpoint};

/// Calls the backend refresh endpoint on behalf of the coordinator.
#[derive(Clone)]
pub struct CredentialRefresher {
    endpoint: Arc<dyn TokenEndpoint>,
    clock: Arc<dyn Clock>,
}

impl CredentialRefresher {
    /// Creates a refresher over the given endpoint.
    #[must_use]
    pub fn new(endpoint: Arc<dyn TokenEndpoint>, clock: Arc<dyn Clock>) -> Self {
        Self { endpoint, clock }
    }

    /// Obtains a new session for `session`.
    ///
    /// # Errors
    ///
    /// `NoRefreshToken` without a network call if the session has no refresh
    /// token; `RefreshRejected` for any transport or server failure.
    pub async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        let refresh_token = session
            .refresh_token
            .as_deref()
            .ok_or(AuthError::NoRefreshToken)?;

        let grant = self
            .endpoint
            .refresh(refresh_token)
            .await
            .map_err(|e| AuthError::rejected(e.to_string()))?;

        debug!(
            expires_in = grant.expires_in,
            rotated = grant.refresh_token.is_some(),
            "Refresh grant received"
        );
        Ok(grant.into_session(self.clock.now(), session.refresh_token.clone()))
    }
}
