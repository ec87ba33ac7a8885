//! Session lifecycle notifications for the UI layer.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tollgate_domain::{AuthError, TokenPool};

/// Events emitted when the session of a pool changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A login stored a new session.
    SignedIn {
        /// Pool that signed in.
        pool: TokenPool,
    },
    /// The coordinator obtained a new access token.
    Refreshed {
        /// Pool that was refreshed.
        pool: TokenPool,
        /// Expiry of the new access token.
        expires_at: Option<DateTime<Utc>>,
    },
    /// The user logged out explicitly.
    SignedOut {
        /// Pool that signed out.
        pool: TokenPool,
    },
    /// Refresh failed and local state was cleared; the UI should redirect.
    SessionEnded {
        /// Pool whose session ended.
        pool: TokenPool,
        /// Why the refresh failed.
        reason: AuthError,
        /// Signed-out entry point to navigate to.
        redirect_to: String,
    },
}

/// Broadcast hub for [`SessionEvent`]s.
///
/// Emitting never fails; events sent while nobody subscribes are dropped.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    /// Creates a hub buffering up to `capacity` events per slow subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Emits an event to current subscribers.
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(32)
    }
}
