//! Authentication domain types

mod types;

pub use types::{AuthError, Credentials, RefreshRequest, TokenGrant, TokenPool};
