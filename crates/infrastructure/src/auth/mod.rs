//! Backend credential endpoints.

mod rest_token_endpoint;

pub use rest_token_endpoint::RestTokenEndpoint;
