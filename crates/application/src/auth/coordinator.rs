//! Single-flight refresh coordination.
//!
//! At most one refresh runs per token pool. A caller that needs a new access
//! token while a refresh is in flight is queued as a `PendingRequest` and
//! suspended; when the refresh settles every queued caller is released, in
//! arrival order, with the same outcome. Nobody queued behind a refresh can
//! start a second one.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tollgate_domain::{AuthError, Session};
use tracing::{debug, info, warn};

use super::{CredentialRefresher, SessionEvent, SessionEvents, TokenStore};

/// Result handed to every caller of one refresh: the new access token or the failure.
pub type RefreshOutcome = Result<String, AuthError>;

/// A caller suspended behind an in-flight refresh.
#[derive(Debug)]
struct PendingRequest {
    waiter_id: u64,
    queued_at: Instant,
    continuation: oneshot::Sender<RefreshOutcome>,
}

impl PendingRequest {
    fn resolve(self, outcome: RefreshOutcome) {
        debug!(
            waiter_id = self.waiter_id,
            waited_ms = u64::try_from(self.queued_at.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Releasing refresh waiter"
        );
        // The caller may have given up waiting; nothing to deliver then.
        let _ = self.continuation.send(outcome);
    }
}

#[derive(Debug, Default)]
struct CoordinatorState {
    in_progress: bool,
    pending: VecDeque<PendingRequest>,
    /// Number of refreshes settled so far.
    generation: u64,
    last_outcome: Option<RefreshOutcome>,
    next_waiter_id: u64,
}

enum Role {
    Leader,
    Waiter(oneshot::Receiver<RefreshOutcome>),
    Settled(RefreshOutcome),
}

/// Serializes refreshes for one token store.
pub struct RefreshCoordinator {
    store: Arc<TokenStore>,
    refresher: CredentialRefresher,
    events: SessionEvents,
    refresh_timeout: Option<Duration>,
    state: Mutex<CoordinatorState>,
}

impl RefreshCoordinator {
    /// Creates a coordinator writing refreshed sessions into `store`.
    #[must_use]
    pub fn new(store: Arc<TokenStore>, refresher: CredentialRefresher, events: SessionEvents) -> Self {
        Self {
            store,
            refresher,
            events,
            refresh_timeout: None,
            state: Mutex::new(CoordinatorState::default()),
        }
    }

    /// Bounds each refresh call; an elapsed timeout settles it as `RefreshRejected`.
    #[must_use]
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    /// The store this coordinator writes to.
    #[must_use]
    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Number of refreshes settled so far.
    ///
    /// Read it before dispatching a request and hand it to
    /// [`RefreshCoordinator::force_refresh`] after a 401, so a refresh that
    /// completed in the meantime is reused rather than repeated.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock_state().generation
    }

    /// Returns true while a refresh is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.lock_state().in_progress
    }

    /// Number of callers queued behind the in-flight refresh.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock_state().pending.len()
    }

    /// Returns a usable access token, refreshing only if the stored one is
    /// missing or expired.
    ///
    /// # Errors
    ///
    /// Returns the refresh failure shared by every caller of the same refresh.
    /// The token store is already empty when it is returned.
    pub async fn ensure_fresh_token(&self) -> RefreshOutcome {
        let seen = self.generation();
        if let Some(token) = self.store.valid_access_token() {
            return Ok(token);
        }
        self.refresh_after(seen).await
    }

    /// Refreshes even though the stored token looks valid (the backend just
    /// rejected it), unless a refresh settled after `seen_generation`.
    ///
    /// # Errors
    ///
    /// Same as [`RefreshCoordinator::ensure_fresh_token`].
    pub async fn force_refresh(&self, seen_generation: u64) -> RefreshOutcome {
        self.refresh_after(seen_generation).await
    }

    async fn refresh_after(&self, seen: u64) -> RefreshOutcome {
        match self.join(seen) {
            Role::Settled(outcome) => outcome,
            Role::Waiter(receiver) => receiver
                .await
                .unwrap_or_else(|_| Err(AuthError::rejected("refresh abandoned"))),
            Role::Leader => {
                let guard = LeaderGuard {
                    coordinator: self,
                    settled: false,
                };
                let outcome = self.run_refresh().await;
                guard.settle(outcome)
            }
        }
    }

    fn join(&self, seen: u64) -> Role {
        let mut state = self.lock_state();

        if state.in_progress {
            let waiter_id = state.next_waiter_id;
            state.next_waiter_id += 1;
            let (continuation, receiver) = oneshot::channel();
            state.pending.push_back(PendingRequest {
                waiter_id,
                queued_at: Instant::now(),
                continuation,
            });
            debug!(waiter_id, queued = state.pending.len(), "Waiting on in-flight refresh");
            return Role::Waiter(receiver);
        }

        if state.generation != seen {
            match &state.last_outcome {
                Some(Ok(token))
                    if self.store.get().access_token.as_deref() == Some(token.as_str()) =>
                {
                    debug!("Reusing token from a refresh that settled meanwhile");
                    return Role::Settled(Ok(token.clone()));
                }
                // Only while still signed out; a new sign-in brings a refresh token to try.
                Some(Err(reason)) if !self.store.get().can_refresh() => {
                    debug!(%reason, "Reusing failure from a refresh that settled meanwhile");
                    return Role::Settled(Err(reason.clone()));
                }
                _ => {}
            }
        }

        state.in_progress = true;
        Role::Leader
    }

    async fn run_refresh(&self) -> RefreshOutcome {
        let pool = self.store.pool();
        info!(%pool, "Refreshing access token");

        let session = self.store.get();
        let attempt = self.refresher.refresh(&session);
        let result = match self.refresh_timeout {
            Some(limit) => tokio::time::timeout(limit, attempt).await.unwrap_or_else(|_| {
                Err(AuthError::rejected(format!(
                    "refresh timed out after {}ms",
                    limit.as_millis()
                )))
            }),
            None => attempt.await,
        };

        match result {
            Ok(refreshed) => self.commit(refreshed).await,
            Err(reason) => {
                self.discard(&reason).await;
                Err(reason)
            }
        }
    }

    async fn commit(&self, refreshed: Session) -> RefreshOutcome {
        let pool = self.store.pool();
        let Some(token) = refreshed.access_token.clone() else {
            let reason = AuthError::rejected("grant carried no access token");
            self.discard(&reason).await;
            return Err(reason);
        };

        let expires_at = refreshed.expires_at;
        if let Err(e) = self.store.set(refreshed).await {
            warn!(%pool, error = %e, "Refreshed session could not be persisted");
        }
        info!(%pool, ?expires_at, "Access token refreshed");
        self.events.emit(SessionEvent::Refreshed { pool, expires_at });
        Ok(token)
    }

    async fn discard(&self, reason: &AuthError) {
        let pool = self.store.pool();
        warn!(%pool, %reason, "Refresh failed, clearing session");
        if let Err(e) = self.store.clear().await {
            warn!(%pool, error = %e, "Cleared session could not be persisted");
        }
    }

    /// Marks the refresh settled and wakes every queued caller, oldest first.
    fn release(&self, outcome: &RefreshOutcome) {
        let pending = {
            let mut state = self.lock_state();
            state.in_progress = false;
            state.generation = state.generation.wrapping_add(1);
            state.last_outcome = Some(outcome.clone());
            std::mem::take(&mut state.pending)
        };

        debug!(waiters = pending.len(), ok = outcome.is_ok(), "Releasing refresh waiters");
        for waiter in pending {
            waiter.resolve(outcome.clone());
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the queue even if the leading caller's future is dropped mid-refresh.
struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl LeaderGuard<'_> {
    fn settle(mut self, outcome: RefreshOutcome) -> RefreshOutcome {
        self.settled = true;
        self.coordinator.release(&outcome);
        outcome
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let store = &self.coordinator.store;
        let pool = store.pool();
        warn!(%pool, "Refresh cancelled, releasing waiters with failure");

        store.clear_local();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let storage = store.storage();
            handle.spawn(async move {
                if let Err(e) = storage.remove(pool.storage_key()).await {
                    warn!(%pool, error = %e, "Cleared session could not be persisted");
                }
            });
        }

        self.coordinator
            .release(&Err(AuthError::rejected("refresh cancelled")));
    }
}
