//! Tollgate Domain - Core types
//!
//! This crate defines the domain model for the authenticated request
//! gateway: sessions, token grants, request/response descriptions and the
//! per-request lifecycle. All types here are pure Rust with no I/O.

pub mod auth;
pub mod error;
pub mod id;
pub mod request;
pub mod response;
pub mod session;
pub mod state;

pub use auth::{AuthError, Credentials, RefreshRequest, TokenGrant, TokenPool};
pub use error::{DomainError, DomainResult};
pub use id::generate_request_id;
pub use request::{AUTHORIZATION, ApiRequest, Header, Headers, HttpMethod};
pub use response::{ApiResponse, STATUS_UNAUTHORIZED};
pub use session::{Session, SessionStatus, token_preview};
pub use state::{RequestLifecycle, RequestState};
