//! Session holder backed by durable storage.
//!
//! The in-memory copy is authoritative for reads. Writes update it first and
//! then persist, so the process never keeps using a token it was told to drop
//! even if the storage write fails.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use tollgate_domain::{Session, SessionStatus, TokenPool};
use tracing::{debug, warn};

use crate::ports::{Clock, SessionStorage, StorageError};

/// Thread-safe session store for one token pool.
pub struct TokenStore {
    pool: TokenPool,
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
    current: RwLock<Session>,
    /// Window before expiry in which a session counts as expiring.
    refresh_buffer: Duration,
}

impl TokenStore {
    /// Creates an empty store. Call [`TokenStore::load`] to bootstrap from storage.
    #[must_use]
    pub fn new(pool: TokenPool, storage: Arc<dyn SessionStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            storage,
            clock,
            current: RwLock::new(Session::empty()),
            refresh_buffer: Duration::zero(),
        }
    }

    /// Sets the window before expiry in which a session counts as expiring.
    #[must_use]
    pub const fn with_refresh_buffer(mut self, refresh_buffer: Duration) -> Self {
        self.refresh_buffer = refresh_buffer;
        self
    }

    /// The pool this store holds credentials for.
    #[must_use]
    pub const fn pool(&self) -> TokenPool {
        self.pool
    }

    /// Current time according to the injected clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Loads the persisted session into memory.
    ///
    /// An unreadable record is discarded and treated as an empty session.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage area itself cannot be accessed.
    pub async fn load(&self) -> Result<Session, StorageError> {
        let key = self.pool.storage_key();
        let session = match self.storage.read(key).await {
            Ok(stored) => stored.unwrap_or_default(),
            Err(StorageError::Serialization(reason)) => {
                warn!(pool = %self.pool, %reason, "Discarding unreadable session record");
                self.storage.remove(key).await?;
                Session::empty()
            }
            Err(e) => return Err(e),
        };

        debug!(pool = %self.pool, signed_in = !session.is_empty(), "Session loaded");
        self.replace_local(session.clone());
        Ok(session)
    }

    /// Returns the current session, possibly empty.
    #[must_use]
    pub fn get(&self) -> Session {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the stored session and persists it.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the in-memory copy is updated regardless.
    pub async fn set(&self, session: Session) -> Result<(), StorageError> {
        self.replace_local(session.clone());
        self.storage.write(self.pool.storage_key(), &session).await
    }

    /// Empties the session and persists the empty state.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the in-memory copy is cleared regardless.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.clear_local();
        self.storage.remove(self.pool.storage_key()).await
    }

    /// Empties the in-memory session without touching storage.
    pub(crate) fn clear_local(&self) {
        self.replace_local(Session::empty());
    }

    /// Storage handle, for persisting a clear that could not be awaited.
    pub(crate) fn storage(&self) -> Arc<dyn SessionStorage> {
        Arc::clone(&self.storage)
    }

    /// Returns the access token only if it may be attached to a request now.
    #[must_use]
    pub fn valid_access_token(&self) -> Option<String> {
        let session = self.get();
        if session.is_usable(self.clock.now()) {
            session.access_token
        } else {
            None
        }
    }

    /// Returns true if the session is inside the refresh buffer and can be refreshed.
    #[must_use]
    pub fn is_expiring(&self) -> bool {
        let session = self.get();
        self.refresh_buffer > Duration::zero()
            && session.can_refresh()
            && session.is_expiring(self.clock.now(), self.refresh_buffer)
    }

    /// Status of the session for display.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.get().status(self.clock.now(), self.refresh_buffer)
    }

    fn replace_local(&self, session: Session) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session;
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("pool", &self.pool)
            .field("current", &self.get())
            .field("refresh_buffer", &self.refresh_buffer)
            .finish_non_exhaustive()
    }
}
