//! Storage trait and error types.
//!
//! Provides the core [`Storage`] trait that abstracts the filesystem primitives
//! used by the generator, along with [`StorageError`] for unified error handling
//! across backends.
//!
//! # Path Convention
//!
//! Unlike a document store, the generator addresses storage with the same
//! paths it was configured with (`templates/sub/index.html.jinja`,
//! `public/sub`). Backends do not re-root paths; a relative path is relative
//! to the process working directory for [`FsStorage`](crate::FsStorage) and
//! is an opaque key for [`MockStorage`](crate::MockStorage).

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Kind of a filesystem entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file (or anything that is not a directory).
    File,
    /// Directory.
    Directory,
}

impl EntryKind {
    /// Returns `true` for [`EntryKind::Directory`].
    #[must_use]
    pub fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// A single entry returned by [`Storage::list_dir`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry basename (e.g., `"_header.jinja"`, `"sub"`).
    pub name: String,
    /// Whether the entry is a file or a directory.
    pub kind: EntryKind,
}

impl DirEntry {
    /// Create a file entry.
    #[must_use]
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    /// Create a directory entry.
    #[must_use]
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    /// Returns `true` if the basename starts with a dot.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// A directory operation was attempted on a file.
    NotADirectory,
    /// A file operation was attempted on a directory.
    IsADirectory,
    /// Permission denied.
    PermissionDenied,
    /// Resource already exists (for create operations).
    AlreadyExists,
    /// Invalid path or identifier.
    InvalidPath,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Path context (if applicable).
    pub path: Option<PathBuf>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Returns `true` if the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::NotADirectory => StorageErrorKind::NotADirectory,
            std::io::ErrorKind::IsADirectory => StorageErrorKind::IsADirectory,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::AlreadyExists => StorageErrorKind::AlreadyExists,
            std::io::ErrorKind::InvalidInput => StorageErrorKind::InvalidPath,
            _ => StorageErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::NotADirectory => "Not a directory",
            StorageErrorKind::IsADirectory => "Is a directory",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::AlreadyExists => "Already exists",
            StorageErrorKind::InvalidPath => "Invalid path",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Filesystem primitives used by the generation pipeline.
///
/// All methods are asynchronous and must be safe to call concurrently from
/// many tasks. Implementations report failures as [`StorageError`] with a
/// semantic [`StorageErrorKind`]; callers decide which kinds are recoverable
/// (a missing content file is, a failed static copy is not).
#[async_trait]
pub trait Storage: Send + Sync {
    /// List the entries of a directory.
    ///
    /// Entry order is backend-defined and callers must not rely on it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::NotFound`] if `path` does not exist and
    /// [`StorageErrorKind::NotADirectory`] if it is a file.
    async fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, StorageError>;

    /// Return the kind of the entry at `path` (a `stat`).
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::NotFound`] if nothing exists at `path`.
    async fn kind(&self, path: &Path) -> Result<EntryKind, StorageError>;

    /// Read the full contents of a file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file doesn't exist or can't be read.
    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Write `contents` to a file, replacing it if it exists.
    ///
    /// The parent directory must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file can't be written.
    async fn write(&self, path: &Path, contents: &[u8]) -> Result<(), StorageError>;

    /// Create a directory and any missing parents.
    ///
    /// Succeeds without changes if `path` already is a directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a path component exists as a file or the
    /// directory can't be created.
    async fn create_dir_all(&self, path: &Path) -> Result<(), StorageError>;

    /// Copy a file verbatim from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the source can't be read or the
    /// destination can't be written.
    async fn copy(&self, from: &Path, to: &Path) -> Result<(), StorageError>;
}
