//! Tollgate Application - Session handling, gateway and ports
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for the backend, storage and time)
//! - The token store, refresher and single-flight refresh coordinator
//! - The request gateway that retries once after a refresh
//! - Login/logout use cases
//! - Application-level error handling

pub mod auth;
pub mod error;
pub mod gateway;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod test_support;

pub use auth::{
    CredentialRefresher, RefreshCoordinator, RefreshOutcome, SessionEvent, SessionEvents,
    TokenStore,
};
pub use error::{ApplicationError, ApplicationResult};
pub use gateway::{GatewayError, GatewayOptions, GatewayResult, RequestGateway};
pub use ports::{
    Clock, HttpClient, HttpClientError, SessionStorage, StorageError, TokenEndpoint,
    TokenEndpointError,
};
pub use use_cases::{Login, Logout};
