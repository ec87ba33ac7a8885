//! File-backed persistence.

mod file_system;
mod session_repository;

pub use file_system::{FileSystem, TokioFileSystem};
pub use session_repository::FileSessionStorage;
