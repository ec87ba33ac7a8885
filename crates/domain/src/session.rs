//! Session state: the current access/refresh token pair plus expiry.
//!
//! A `Session` is plain data. Every time-dependent check takes `now`
//! explicitly so callers decide which clock is authoritative.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Current credentials held by the token store.
///
/// The persisted layout is a flat record with camelCase keys:
/// ```json
/// { "accessToken": "…", "refreshToken": "…", "expiresAt": "2026-01-01T00:00:00Z" }
/// ```
/// Missing keys deserialize as absent.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Short-lived credential attached to outgoing requests.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Longer-lived credential used solely to obtain a new access token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Instant after which the access token must not be used.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a session from its parts.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token,
            expires_at,
        }
    }

    /// Creates an empty session (signed out).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Returns true if no access token is held.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none()
    }

    /// Returns true if the access token may be attached to a request.
    ///
    /// A token without a known expiry is unusable.
    #[must_use]
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.access_token.is_some() && self.expires_at.is_some_and(|exp| exp > now)
    }

    /// Returns true if the token is usable now but will expire within `buffer`.
    ///
    /// A window reaching past the representable time range covers any expiry.
    #[must_use]
    pub fn is_expiring(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        self.is_usable(now)
            && self.expires_at.is_some_and(|exp| {
                now.checked_add_signed(buffer)
                    .is_none_or(|limit| limit >= exp)
            })
    }

    /// Returns true if a refresh token is available.
    #[must_use]
    pub const fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Seconds until expiry, or None if expiry is unknown.
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|exp| (exp - now).num_seconds())
    }

    /// Returns the `Authorization` header value for the access token.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.access_token
            .as_deref()
            .map(|token| format!("Bearer {token}"))
    }

    /// Classifies the session for display.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>, buffer: Duration) -> SessionStatus {
        if self.is_empty() {
            return SessionStatus::SignedOut;
        }
        if !self.is_usable(now) {
            return SessionStatus::Expired {
                can_refresh: self.can_refresh(),
            };
        }
        let seconds_remaining = self.seconds_until_expiry(now).unwrap_or(0);
        if self.is_expiring(now, buffer) {
            SessionStatus::Expiring {
                seconds_remaining,
                can_refresh: self.can_refresh(),
            }
        } else {
            SessionStatus::Valid { seconds_remaining }
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_deref().map(token_preview))
            .field(
                "refresh_token",
                &self.refresh_token.as_deref().map(token_preview),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Returns a log-safe preview of a token (first 8 chars + ...).
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.len() > 12 {
        let cut = token
            .char_indices()
            .nth(8)
            .map_or(token.len(), |(idx, _)| idx);
        format!("{}...", &token[..cut])
    } else {
        "***".to_string()
    }
}

/// Status of the stored session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// No access token is held.
    SignedOut,
    /// Token is valid and not expiring soon.
    Valid {
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// Token is valid but will expire soon.
    Expiring {
        /// Seconds until expiry.
        seconds_remaining: i64,
        /// Whether the token can be refreshed.
        can_refresh: bool,
    },
    /// Token has expired or has no known expiry.
    Expired {
        /// Whether the token can be refreshed.
        can_refresh: bool,
    },
}

impl SessionStatus {
    /// Returns true if the access token may be used.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. } | Self::Expiring { .. })
    }

    /// Get a user-friendly display message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::SignedOut => "Signed out".to_string(),
            Self::Valid { seconds_remaining } => {
                let secs = *seconds_remaining;
                if secs > 3600 {
                    format!("Valid for {} hours", secs / 3600)
                } else if secs > 60 {
                    format!("Valid for {} minutes", secs / 60)
                } else {
                    format!("Valid for {secs} seconds")
                }
            }
            Self::Expiring {
                seconds_remaining,
                can_refresh,
            } => {
                let refresh_hint = if *can_refresh {
                    " (will refresh)"
                } else {
                    ""
                };
                format!("Expiring in {seconds_remaining} seconds{refresh_hint}")
            }
            Self::Expired { can_refresh: true } => "Expired (can refresh)".to_string(),
            Self::Expired { can_refresh: false } => "Expired".to_string(),
        }
    }
}
