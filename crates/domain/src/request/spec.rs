//! Request description sent through the gateway

use serde::{Deserialize, Serialize};
use url::Url;

use super::{AUTHORIZATION, Headers, HttpMethod};
use crate::error::{DomainError, DomainResult};
use crate::id::generate_request_id;

/// A generic `{method, path, body?}` call to a backend domain endpoint
/// (firms, challenges, reviews, lookups).
///
/// The request is cheap to clone: the gateway keeps the original so it can
/// re-dispatch it with a new credential after a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Correlation ID used in logs.
    pub id: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the backend base URL, e.g. `/firms?page=2`.
    pub path: String,
    /// Extra headers.
    #[serde(default)]
    pub headers: Headers,
    /// Optional JSON body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Creates a request without a body.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: generate_request_id(),
            method,
            path: path.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    /// Creates a PUT request with a JSON body.
    #[must_use]
    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(HttpMethod::Put, path).with_body(body)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns the bearer credential currently attached, if any.
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.headers.get(AUTHORIZATION)
    }

    /// Returns a copy carrying `bearer` as its credential, or none at all.
    ///
    /// Any credential already present is replaced so a retried request never
    /// carries the rejected token.
    #[must_use]
    pub fn authorized(&self, bearer: Option<&str>) -> Self {
        let mut request = self.clone();
        request.headers.remove(AUTHORIZATION);
        if let Some(value) = bearer {
            // The header name is a valid constant.
            let _ = request.headers.set(AUTHORIZATION, value);
        }
        request
    }

    /// Resolves the request path against the backend base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty or absolute to another host.
    pub fn resolve_url(&self, base: &Url) -> DomainResult<Url> {
        let path = self.path.trim();
        if path.is_empty() {
            return Err(DomainError::InvalidPath("path is empty".to_string()));
        }
        if path.starts_with("//") || path.contains("://") {
            return Err(DomainError::InvalidPath(format!(
                "{path} is not relative to the backend"
            )));
        }

        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path.trim_start_matches('/'))
            .map_err(|e| DomainError::InvalidPath(format!("{path}: {e}")))
    }
}
