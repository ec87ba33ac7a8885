//! File system access used by the file-backed repositories.

use std::future::Future;
use std::io;
use std::path::Path;

use tokio::fs;

/// Minimal async file system surface.
///
/// Kept as a trait so repositories can be exercised against a faulty or
/// read-only file system in tests.
pub trait FileSystem: Send + Sync {
    /// Reads a whole file. A missing file yields `Ok(None)`.
    fn read_file(&self, path: &Path) -> impl Future<Output = io::Result<Option<Vec<u8>>>> + Send;

    /// Writes a whole file, creating parent directories as needed.
    ///
    /// The contents are written to a sibling temporary file first and then
    /// renamed over `path`, so readers never see a half-written record.
    fn write_file(&self, path: &Path, contents: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Removes a file. Removing a missing file succeeds.
    fn remove_file(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;
}

/// Real file system implementation using `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    /// Creates a new `TokioFileSystem`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl FileSystem for TokioFileSystem {
    async fn read_file(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let staging = path.with_extension("tmp");
        fs::write(&staging, contents).await?;
        fs::rename(&staging, path).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(path).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            result => result,
        }
    }
}
