//! Session storage port
//!
//! A durable key-value area holding one session record per token pool.

use async_trait::async_trait;
use tollgate_domain::Session;

/// Errors that can occur while persisting sessions.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Repository trait for session persistence.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Reads the record stored under `key`.
    ///
    /// # Returns
    /// `None` if no record exists, which is equivalent to an empty session.
    async fn read(&self, key: &str) -> Result<Option<Session>, StorageError>;

    /// Replaces the record stored under `key`.
    async fn write(&self, key: &str, session: &Session) -> Result<(), StorageError>;

    /// Deletes the record stored under `key`. Deleting a missing record succeeds.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
