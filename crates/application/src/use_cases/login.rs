//! Login use case.

use std::sync::Arc;

use tollgate_domain::{Credentials, SessionStatus};
use tracing::{info, warn};

use crate::auth::{SessionEvent, SessionEvents, TokenStore};
use crate::error::ApplicationResult;
use crate::ports::TokenEndpoint;

/// Obtains a first session from the token endpoint and stores it.
pub struct Login {
    endpoint: Arc<dyn TokenEndpoint>,
    store: Arc<TokenStore>,
    events: SessionEvents,
}

impl Login {
    /// Creates a new `Login` use case for the store's pool.
    #[must_use]
    pub fn new(
        endpoint: Arc<dyn TokenEndpoint>,
        store: Arc<TokenStore>,
        events: SessionEvents,
    ) -> Self {
        Self {
            endpoint,
            store,
            events,
        }
    }

    /// Signs in with `credentials`, or bootstraps a session without any.
    ///
    /// # Errors
    ///
    /// - Returns `TokenEndpoint` if the backend refuses; the store is left untouched
    /// - Returns `Storage` if the new session could not be persisted
    pub async fn execute(&self, credentials: Option<&Credentials>) -> ApplicationResult<SessionStatus> {
        let pool = self.store.pool();
        let grant = match self.endpoint.obtain(credentials).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(%pool, error = %e, "Login failed");
                return Err(e.into());
            }
        };

        let session = grant.into_session(self.store.now(), None);
        self.store.set(session).await?;

        info!(%pool, user = credentials.map(|c| c.username.as_str()), "Signed in");
        self.events.emit(SessionEvent::SignedIn { pool });
        Ok(self.store.status())
    }
}
