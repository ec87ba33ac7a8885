//! Tollgate Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading.

pub mod adapters;
pub mod auth;
pub mod persistence;
pub mod serialization;
pub mod settings;

pub use adapters::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ReqwestHttpClient, SystemClock};
pub use auth::RestTokenEndpoint;
pub use persistence::{FileSessionStorage, FileSystem, TokioFileSystem};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
pub use settings::{ConfigError, GatewayConfig};
