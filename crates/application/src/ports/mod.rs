//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod http_client;
mod session_storage;
mod token_endpoint;

pub use clock::Clock;
pub use http_client::{HttpClient, HttpClientError};
pub use session_storage::{SessionStorage, StorageError};
pub use token_endpoint::{TokenEndpoint, TokenEndpointError};
