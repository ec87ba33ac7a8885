//! Logout use case.

use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::{SessionEvent, SessionEvents, TokenStore};
use crate::error::ApplicationResult;

/// Drops the session of one pool.
pub struct Logout {
    store: Arc<TokenStore>,
    events: SessionEvents,
}

impl Logout {
    /// Creates a new `Logout` use case.
    #[must_use]
    pub const fn new(store: Arc<TokenStore>, events: SessionEvents) -> Self {
        Self { store, events }
    }

    /// Clears the session. Logging out while signed out is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the cleared state could not be persisted; the
    /// in-memory session is gone regardless.
    pub async fn execute(&self) -> ApplicationResult<()> {
        let pool = self.store.pool();
        let was_signed_in = !self.store.get().is_empty();

        self.store.clear().await?;

        if was_signed_in {
            info!(%pool, "Signed out");
            self.events.emit(SessionEvent::SignedOut { pool });
        } else {
            debug!(%pool, "Logout while signed out");
        }
        Ok(())
    }
}
