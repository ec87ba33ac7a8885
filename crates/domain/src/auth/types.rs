//! Authentication wire and pool types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::DomainError;
use crate::session::Session;

/// Token response returned by the backend's token and refresh endpoints.
///
/// Wire shape: `{ "accessToken": "…", "refreshToken": "…", "expiresIn": 3600 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    /// The new access token.
    pub access_token: String,
    /// A rotated refresh token, when the backend issues one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: u64,
}

impl TokenGrant {
    /// Creates a grant.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: u64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_in,
        }
    }

    /// Converts the grant into a session issued at `now`.
    ///
    /// When the backend does not rotate the refresh token, `previous_refresh`
    /// is carried over.
    #[must_use]
    pub fn into_session(self, now: DateTime<Utc>, previous_refresh: Option<String>) -> Session {
        let expires_at = i64::try_from(self.expires_in)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime));
        Session {
            access_token: Some(self.access_token),
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at,
        }
    }
}

/// Body of the refresh call: `{ "refreshToken": "…" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The refresh token being exchanged.
    pub refresh_token: String,
}

/// Initial credentials sent to the token endpoint on login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account identifier (usually an email address).
    pub username: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Which credential set a gateway operates on.
///
/// Public-site calls and back-office calls authenticate separately; each
/// pool has its own persisted session and its own auth endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenPool {
    /// Regular site visitors.
    #[default]
    General,
    /// Back-office administrators.
    Admin,
}

impl TokenPool {
    /// Returns the pool name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Admin => "admin",
        }
    }

    /// Key of the persisted session record for this pool.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::General => "tollgate.session",
            Self::Admin => "tollgate.admin_session",
        }
    }

    /// Default path of the token (login) endpoint.
    #[must_use]
    pub const fn token_path(self) -> &'static str {
        match self {
            Self::General => "/auth/token",
            Self::Admin => "/admin/auth/token",
        }
    }

    /// Default path of the refresh endpoint.
    #[must_use]
    pub const fn refresh_path(self) -> &'static str {
        match self {
            Self::General => "/auth/refresh",
            Self::Admin => "/admin/auth/refresh",
        }
    }
}

impl fmt::Display for TokenPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenPool {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(Self::General),
            "admin" => Ok(Self::Admin),
            other => Err(DomainError::UnknownTokenPool(other.to_string())),
        }
    }
}

/// Failures of a refresh attempt. Both require the user to sign in again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Refresh attempted with no refresh token available.
    #[error("no refresh token available")]
    NoRefreshToken,
    /// The backend refused the refresh, or it could not be reached.
    #[error("refresh rejected: {message}")]
    RefreshRejected {
        /// Error description.
        message: String,
    },
}

impl AuthError {
    /// Creates a `RefreshRejected` error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::RefreshRejected {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_grant_wire_shape() {
        let grant: TokenGrant =
            serde_json::from_str(r#"{"accessToken":"A2","expiresIn":900}"#).unwrap();
        assert_eq!(grant, TokenGrant::new("A2", None, 900));

        let grant: TokenGrant = serde_json::from_str(
            r#"{"accessToken":"A2","refreshToken":"R2","expiresIn":900}"#,
        )
        .unwrap();
        assert_eq!(grant.refresh_token.as_deref(), Some("R2"));
    }

    #[test]
    fn test_grant_into_session_keeps_previous_refresh() {
        let now = DateTime::from_timestamp(1_800_000_000, 0).unwrap();
        let session = TokenGrant::new("A2", None, 900).into_session(now, Some("R1".to_string()));

        assert_eq!(session.access_token.as_deref(), Some("A2"));
        assert_eq!(session.refresh_token.as_deref(), Some("R1"));
        assert_eq!(session.expires_at, Some(now + Duration::seconds(900)));
    }

    #[test]
    fn test_grant_into_session_prefers_rotated_refresh() {
        let now = DateTime::from_timestamp(1_800_000_000, 0).unwrap();
        let session = TokenGrant::new("A2", Some("R2".to_string()), 60)
            .into_session(now, Some("R1".to_string()));
        assert_eq!(session.refresh_token.as_deref(), Some("R2"));
    }

    #[test]
    fn test_refresh_request_wire_shape() {
        let body = serde_json::to_string(&RefreshRequest {
            refresh_token: "R1".to_string(),
        })
        .unwrap();
        assert_eq!(body, r#"{"refreshToken":"R1"}"#);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let debug = format!("{:?}", Credentials::new("trader@example.com", "hunter2"));
        assert!(debug.contains("trader@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_token_pool_parse_and_paths() {
        assert_eq!("Admin".parse::<TokenPool>().unwrap(), TokenPool::Admin);
        assert!("guest".parse::<TokenPool>().is_err());
        assert_ne!(
            TokenPool::General.storage_key(),
            TokenPool::Admin.storage_key()
        );
        assert_eq!(TokenPool::General.refresh_path(), "/auth/refresh");
    }

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            AuthError::NoRefreshToken.to_string(),
            "no refresh token available"
        );
        assert_eq!(
            AuthError::rejected("expired").to_string(),
            "refresh rejected: expired"
        );
    }
}
