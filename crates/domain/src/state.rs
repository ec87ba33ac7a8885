//! Per-request lifecycle through the gateway.
//!
//! ```text
//! Unsent -> Sent -> Succeeded
//!                -> FailedNonAuth
//!                -> FailedAuthFirstAttempt -> Refreshing -> Retried -> Succeeded
//!                                                                  -> FailedNonAuth
//!                                                                  -> FailedFinal
//!                                                      -> SessionEnded
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// State of one request inside the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// Not dispatched yet.
    #[default]
    Unsent,
    /// First dispatch in flight.
    Sent,
    /// A 2xx response was returned.
    Succeeded,
    /// Transport failure or an error status other than 401.
    FailedNonAuth,
    /// The first dispatch came back 401.
    FailedAuthFirstAttempt,
    /// Waiting on the refresh coordinator.
    Refreshing,
    /// Re-dispatched once with the refreshed credential.
    Retried,
    /// The retry came back 401 as well.
    FailedFinal,
    /// The refresh failed; local session state was cleared.
    SessionEnded,
}

impl RequestState {
    /// Returns true for states the request never leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::FailedNonAuth | Self::FailedFinal | Self::SessionEnded
        )
    }

    /// Returns true if `next` is a legal successor.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Unsent, Self::Sent)
                | (
                    Self::Sent,
                    Self::Succeeded | Self::FailedNonAuth | Self::FailedAuthFirstAttempt
                )
                | (Self::FailedAuthFirstAttempt, Self::Refreshing)
                | (Self::Refreshing, Self::Retried | Self::SessionEnded)
                | (
                    Self::Retried,
                    Self::Succeeded | Self::FailedNonAuth | Self::FailedFinal
                )
        )
    }

    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unsent => "unsent",
            Self::Sent => "sent",
            Self::Succeeded => "succeeded",
            Self::FailedNonAuth => "failed_non_auth",
            Self::FailedAuthFirstAttempt => "failed_auth_first_attempt",
            Self::Refreshing => "refreshing",
            Self::Retried => "retried",
            Self::FailedFinal => "failed_final",
            Self::SessionEnded => "session_ended",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records the path a request took through [`RequestState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLifecycle {
    history: Vec<RequestState>,
}

impl RequestLifecycle {
    /// Starts a lifecycle in `Unsent`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: vec![RequestState::Unsent],
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RequestState {
        self.history.last().copied().unwrap_or_default()
    }

    /// Every state visited, in order.
    #[must_use]
    pub fn history(&self) -> &[RequestState] {
        &self.history
    }

    /// Returns true if the request was dispatched a second time.
    #[must_use]
    pub fn was_retried(&self) -> bool {
        self.history.contains(&RequestState::Retried)
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns an error if `next` is not a legal successor of the current state.
    pub fn advance(&mut self, next: RequestState) -> DomainResult<RequestState> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: current.to_string(),
                to: next.to_string(),
            });
        }
        self.history.push(next);
        Ok(next)
    }
}
