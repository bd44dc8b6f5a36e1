//! Filesystem storage implementation.
//!
//! Provides [`FsStorage`] for reading templates and content from, and
//! writing rendered output to, the local filesystem via `tokio::fs`.

use std::path::Path;

use async_trait::async_trait;

use crate::storage::{DirEntry, EntryKind, Storage, StorageError};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Filesystem storage implementation.
///
/// Stateless: every call goes straight to the operating system. Paths are
/// used as given, so relative paths resolve against the working directory.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use stencil_storage::{FsStorage, Storage};
///
/// let storage = FsStorage::new();
/// let entries = storage.list_dir(Path::new("templates")).await?;
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct FsStorage;

impl FsStorage {
    /// Create a new filesystem storage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn io_error(err: std::io::Error, path: &Path) -> StorageError {
    StorageError::io(err, Some(path.to_path_buf())).with_backend(BACKEND)
}

#[async_trait]
impl Storage for FsStorage {
    async fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, StorageError> {
        let mut reader = tokio::fs::read_dir(path)
            .await
            .map_err(|e| io_error(e, path))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| io_error(e, path))? {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!(dir = %path.display(), name = ?raw, "Skipping entry with non-UTF-8 name");
                    continue;
                }
            };
            // file_type() does not follow symlinks; stat the target instead
            let kind = match tokio::fs::metadata(entry.path()).await {
                Ok(meta) if meta.is_dir() => EntryKind::Directory,
                Ok(_) => EntryKind::File,
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            entries.push(DirEntry { name, kind });
        }

        tracing::debug!(path = %path.display(), count = entries.len(), "Listed directory");
        Ok(entries)
    }

    async fn kind(&self, path: &Path) -> Result<EntryKind, StorageError> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| io_error(e, path))?;
        Ok(if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        tokio::fs::read(path).await.map_err(|e| io_error(e, path))
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<(), StorageError> {
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| io_error(e, path))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| io_error(e, path))
    }

    async fn copy(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        tokio::fs::copy(from, to)
            .await
            .map(|_| ())
            .map_err(|e| io_error(e, from))
    }
}
