//! File-based session storage.
//!
//! Each storage key maps to one JSON file inside the session directory:
//! `tollgate.session.json` for the general pool and
//! `tollgate.admin_session.json` for the back-office pool.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tollgate_application::ports::{SessionStorage, StorageError};
use tollgate_domain::Session;
use tracing::debug;

use super::file_system::FileSystem;
use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// File-backed implementation of the `SessionStorage` port.
///
/// Stores one record per key:
/// ```json
/// {
///   "accessToken": "eyJhbGciOi...",
///   "refreshToken": "8f1c2a...",
///   "expiresAt": "2026-10-18T12:00:00Z"
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileSessionStorage<F> {
    fs: F,
    dir: PathBuf,
}

impl<F: FileSystem> FileSessionStorage<F> {
    /// Creates a storage rooted at `dir`. The directory is created on first write.
    pub fn new(fs: F, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
        }
    }

    /// Directory holding the session files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the record path for a key.
    ///
    /// # Errors
    ///
    /// Rejects keys that could escape the session directory.
    pub fn record_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key: {key:?}"),
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl<F: FileSystem> SessionStorage for FileSessionStorage<F> {
    async fn read(&self, key: &str) -> Result<Option<Session>, StorageError> {
        let path = self.record_path(key)?;
        let Some(content) = self.fs.read_file(&path).await? else {
            return Ok(None);
        };

        let session: Session =
            from_json_bytes(&content).map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(session))
    }

    async fn write(&self, key: &str, session: &Session) -> Result<(), StorageError> {
        let path = self.record_path(key)?;
        let content =
            to_json_stable_bytes(session).map_err(|e| StorageError::Serialization(e.to_string()))?;

        self.fs.write_file(&path, &content).await?;
        debug!(path = %path.display(), "Session record written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.record_path(key)?;
        self.fs.remove_file(&path).await?;
        debug!(path = %path.display(), "Session record removed");
        Ok(())
    }
}
