//! Request Gateway
//!
//! The single path through which outgoing calls reach the backend. It
//! attaches the current access token, and on a 401 asks the refresh
//! coordinator for a new one and re-dispatches the request exactly once.
//! Every other outcome is handed back to the caller untouched.

use std::sync::Arc;

use thiserror::Error;
use tollgate_domain::{
    ApiRequest, ApiResponse, AuthError, DomainError, RequestLifecycle, RequestState, TokenPool,
};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::auth::{RefreshCoordinator, SessionEvent, SessionEvents, TokenStore};
use crate::ports::{HttpClient, HttpClientError};

/// Query flag appended to the signed-out entry point when a session ends.
pub const SESSION_EXPIRED_QUERY: &str = "session=expired";

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures surfaced by the gateway.
///
/// Ordinary backend errors are not represented here: any response other
/// than 401 is returned as `Ok`, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No refresh token is held, so no new access token can be obtained.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The backend refused the refresh.
    #[error("refresh rejected: {message}")]
    RefreshRejected {
        /// Reason reported by the refresher.
        message: String,
    },

    /// The request was rejected again after a successful refresh.
    #[error("request still unauthorized after refresh (status {status})")]
    AuthRetryExhausted {
        /// Status of the retried response.
        status: u16,
    },

    /// The backend could not be reached.
    #[error("{0}")]
    Transport(#[from] HttpClientError),

    /// Refresh failed during a request; local session state has been cleared.
    #[error("session ended: {reason}")]
    SessionEnded {
        /// Why the refresh failed.
        reason: AuthError,
        /// Signed-out entry point the UI should navigate to.
        redirect_to: String,
    },

    /// The request lifecycle was driven through an illegal transition.
    #[error("{0}")]
    Domain(#[from] DomainError),
}

impl GatewayError {
    /// Returns true if the user is now signed out, as opposed to this one
    /// call having failed.
    #[must_use]
    pub const fn is_session_ended(&self) -> bool {
        matches!(self, Self::SessionEnded { .. })
    }

    /// Redirect target for a session-ended error.
    #[must_use]
    pub fn redirect_to(&self) -> Option<&str> {
        match self {
            Self::SessionEnded { redirect_to, .. } => Some(redirect_to),
            _ => None,
        }
    }
}

impl From<AuthError> for GatewayError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::NoRefreshToken => Self::NoRefreshToken,
            AuthError::RefreshRejected { message } => Self::RefreshRejected { message },
        }
    }
}

/// Per-pool gateway settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOptions {
    /// Signed-out entry point, without the session-expired flag.
    pub signed_out_path: String,
    /// Refresh before dispatch when the token is inside the store's refresh buffer.
    pub proactive_refresh: bool,
}

impl GatewayOptions {
    /// Default options for a pool: `/login` or `/admin/login`, no proactive refresh.
    #[must_use]
    pub fn for_pool(pool: TokenPool) -> Self {
        let signed_out_path = match pool {
            TokenPool::General => "/login",
            TokenPool::Admin => "/admin/login",
        };
        Self {
            signed_out_path: signed_out_path.to_string(),
            proactive_refresh: false,
        }
    }

    /// Sets the signed-out entry point.
    #[must_use]
    pub fn with_signed_out_path(mut self, path: impl Into<String>) -> Self {
        self.signed_out_path = path.into();
        self
    }

    /// Enables or disables proactive refresh.
    #[must_use]
    pub const fn with_proactive_refresh(mut self, enabled: bool) -> Self {
        self.proactive_refresh = enabled;
        self
    }

    /// Where the UI goes once a session has ended.
    #[must_use]
    pub fn redirect_to(&self) -> String {
        let separator = if self.signed_out_path.contains('?') {
            '&'
        } else {
            '?'
        };
        format!("{}{separator}{SESSION_EXPIRED_QUERY}", self.signed_out_path)
    }
}

/// Authenticated entry point to the backend for one token pool.
///
/// # Example
///
/// ```ignore
/// let gateway = RequestGateway::new(client, coordinator, events, GatewayOptions::for_pool(pool));
///
/// match gateway.send(&ApiRequest::get("/firms")).await {
///     Ok(response) => render(response),
///     Err(e) if e.is_session_ended() => navigate(e.redirect_to()),
///     Err(e) => notify(e),
/// }
/// ```
pub struct RequestGateway<C: HttpClient> {
    client: Arc<C>,
    coordinator: Arc<RefreshCoordinator>,
    events: SessionEvents,
    options: GatewayOptions,
}

impl<C: HttpClient> RequestGateway<C> {
    /// Creates a gateway dispatching through `client`.
    #[must_use]
    pub const fn new(
        client: Arc<C>,
        coordinator: Arc<RefreshCoordinator>,
        events: SessionEvents,
        options: GatewayOptions,
    ) -> Self {
        Self {
            client,
            coordinator,
            events,
            options,
        }
    }

    /// The token store behind this gateway.
    #[must_use]
    pub fn store(&self) -> &Arc<TokenStore> {
        self.coordinator.store()
    }

    /// The settings this gateway was built with.
    #[must_use]
    pub const fn options(&self) -> &GatewayOptions {
        &self.options
    }

    /// Returns a usable access token, refreshing if needed.
    ///
    /// # Errors
    ///
    /// `NoRefreshToken` or `RefreshRejected`; the token store is empty by then.
    pub async fn ensure_fresh_token(&self) -> GatewayResult<String> {
        Ok(self.coordinator.ensure_fresh_token().await?)
    }

    /// Refreshes now, even if the stored token is still valid.
    ///
    /// # Errors
    ///
    /// Same as [`RequestGateway::ensure_fresh_token`].
    pub async fn refresh(&self) -> GatewayResult<String> {
        let seen = self.coordinator.generation();
        Ok(self.coordinator.force_refresh(seen).await?)
    }

    /// Sends a request with the current credential.
    ///
    /// # Errors
    ///
    /// - `Transport` if the backend could not be reached
    /// - `AuthRetryExhausted` if the request is still unauthorized after one refresh
    /// - `SessionEnded` if the refresh failed; the session has been cleared
    pub async fn send(&self, request: &ApiRequest) -> GatewayResult<ApiResponse> {
        self.send_traced(request).await.0
    }

    /// Like [`RequestGateway::send`], also returning the states the request went through.
    pub async fn send_traced(
        &self,
        request: &ApiRequest,
    ) -> (GatewayResult<ApiResponse>, RequestLifecycle) {
        let span = info_span!(
            "gateway_request",
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            pool = %self.store().pool(),
        );

        async {
            let mut lifecycle = RequestLifecycle::new();
            let result = self.dispatch(request, &mut lifecycle).await;
            debug!(
                state = %lifecycle.state(),
                retried = lifecycle.was_retried(),
                "Request finished"
            );
            (result, lifecycle)
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        lifecycle: &mut RequestLifecycle,
    ) -> GatewayResult<ApiResponse> {
        let mut seen = self.coordinator.generation();

        if self.options.proactive_refresh && self.store().is_expiring() {
            debug!("Access token close to expiry, refreshing before dispatch");
            match self.coordinator.force_refresh(seen).await {
                Ok(_) => seen = self.coordinator.generation(),
                // Kept `seen` lets a following 401 reuse this failure.
                Err(reason) => warn!(%reason, "Proactive refresh failed"),
            }
        }

        let bearer = self.store().get().bearer();
        advance(lifecycle, RequestState::Sent)?;
        let response = self
            .execute(lifecycle, &request.authorized(bearer.as_deref()))
            .await?;

        if !response.is_unauthorized() {
            return finish(lifecycle, response);
        }

        advance(lifecycle, RequestState::FailedAuthFirstAttempt)?;
        info!("Backend rejected the access token, refreshing");
        advance(lifecycle, RequestState::Refreshing)?;

        let token = match self.coordinator.force_refresh(seen).await {
            Ok(token) => token,
            Err(reason) => {
                advance(lifecycle, RequestState::SessionEnded)?;
                return Err(self.end_session(reason));
            }
        };

        advance(lifecycle, RequestState::Retried)?;
        let bearer = format!("Bearer {token}");
        let retried = self
            .execute(lifecycle, &request.authorized(Some(&bearer)))
            .await?;

        if retried.is_unauthorized() {
            advance(lifecycle, RequestState::FailedFinal)?;
            warn!(status = retried.status, "Request unauthorized after refresh");
            return Err(GatewayError::AuthRetryExhausted {
                status: retried.status,
            });
        }

        finish(lifecycle, retried)
    }

    async fn execute(
        &self,
        lifecycle: &mut RequestLifecycle,
        request: &ApiRequest,
    ) -> GatewayResult<ApiResponse> {
        match self.client.execute(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                advance(lifecycle, RequestState::FailedNonAuth)?;
                warn!(error = %e, "Request failed in transport");
                Err(GatewayError::Transport(e))
            }
        }
    }

    /// Builds the session-ended signal. The coordinator has already emptied the store.
    fn end_session(&self, reason: AuthError) -> GatewayError {
        let pool = self.store().pool();
        let redirect_to = self.options.redirect_to();
        warn!(%pool, %reason, %redirect_to, "Session ended");
        self.events.emit(SessionEvent::SessionEnded {
            pool,
            reason: reason.clone(),
            redirect_to: redirect_to.clone(),
        });
        GatewayError::SessionEnded {
            reason,
            redirect_to,
        }
    }
}

fn advance(lifecycle: &mut RequestLifecycle, next: RequestState) -> GatewayResult<()> {
    let previous = lifecycle.state();
    lifecycle.advance(next)?;
    debug!(from = %previous, to = %next, "Request state");
    Ok(())
}

fn finish(lifecycle: &mut RequestLifecycle, response: ApiResponse) -> GatewayResult<ApiResponse> {
    let state = if response.is_success() {
        RequestState::Succeeded
    } else {
        RequestState::FailedNonAuth
    };
    advance(lifecycle, state)?;
    debug!(status = response.status, "Response received");
    Ok(response)
}
