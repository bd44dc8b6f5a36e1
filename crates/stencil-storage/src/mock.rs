//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing the generator without
//! filesystem access.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::storage::{DirEntry, EntryKind, Storage, StorageError, StorageErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

#[derive(Clone, Debug)]
enum Node {
    File(Vec<u8>),
    Dir,
}

/// A mutating call recorded by [`MockStorage`], in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// `create_dir_all(path)` succeeded.
    CreateDir(PathBuf),
    /// `write(path, _)` succeeded.
    Write(PathBuf),
    /// `copy(from, to)` succeeded.
    Copy {
        /// Source file.
        from: PathBuf,
        /// Destination file.
        to: PathBuf,
    },
}

/// Parent directories of `path`, nearest first, excluding the empty path.
fn ancestors(path: &Path) -> impl Iterator<Item = &Path> {
    path.ancestors()
        .skip(1)
        .filter(|p| !p.as_os_str().is_empty())
}

fn error(kind: StorageErrorKind, path: &Path) -> StorageError {
    StorageError::new(kind)
        .with_path(path)
        .with_backend(BACKEND)
}

/// Mock storage for testing.
///
/// Holds an in-memory tree of files and directories. Use the builder
/// methods to seed it, inject latency or failures, and the inspection
/// methods to assert on what the code under test did.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use stencil_storage::{MockStorage, Storage};
///
/// let storage = MockStorage::new()
///     .with_file("templates/index.html.jinja", "Hello {{ name }}")
///     .with_dir("public");
///
/// let entries = storage.list_dir(Path::new("templates")).await?;
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    nodes: RwLock<BTreeMap<PathBuf, Node>>,
    read_delays: RwLock<HashMap<PathBuf, Duration>>,
    list_delays: RwLock<HashMap<PathBuf, Duration>>,
    failing_copies: RwLock<HashSet<PathBuf>>,
    failing_lists: RwLock<HashSet<PathBuf>>,
    failing_writes: RwLock<HashSet<PathBuf>>,
    list_counts: Mutex<HashMap<PathBuf, usize>>,
    read_counts: Mutex<HashMap<PathBuf, usize>>,
    operations: Mutex<Vec<Operation>>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating every parent directory.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        {
            let mut nodes = self.nodes.write().unwrap();
            for dir in ancestors(&path) {
                nodes.insert(dir.to_path_buf(), Node::Dir);
            }
            nodes.insert(path, Node::File(contents.into()));
        }
        self
    }

    /// Add a directory, creating every parent directory.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        {
            let mut nodes = self.nodes.write().unwrap();
            for dir in ancestors(&path) {
                nodes.insert(dir.to_path_buf(), Node::Dir);
            }
            nodes.insert(path, Node::Dir);
        }
        self
    }

    /// Delay every `read` of `path` by `delay`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_read_delay(self, path: impl Into<PathBuf>, delay: Duration) -> Self {
        self.read_delays.write().unwrap().insert(path.into(), delay);
        self
    }

    /// Delay every `list_dir` of `path` by `delay`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_list_delay(self, path: impl Into<PathBuf>, delay: Duration) -> Self {
        self.list_delays.write().unwrap().insert(path.into(), delay);
        self
    }

    /// Make `copy` fail when its source is `path`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failing_copy(self, path: impl Into<PathBuf>) -> Self {
        self.failing_copies.write().unwrap().insert(path.into());
        self
    }

    /// Make `list_dir` of `path` fail with `PermissionDenied`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failing_list(self, path: impl Into<PathBuf>) -> Self {
        self.failing_lists.write().unwrap().insert(path.into());
        self
    }

    /// Make `write` fail for `path`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failing_write(self, path: impl Into<PathBuf>) -> Self {
        self.failing_writes.write().unwrap().insert(path.into());
        self
    }

    /// Number of `list_dir` calls made for `path`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn list_count(&self, path: impl AsRef<Path>) -> usize {
        self.list_counts
            .lock()
            .unwrap()
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }

    /// Number of `read` calls made for `path`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        self.read_counts
            .lock()
            .unwrap()
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }

    /// Current contents of the file at `path`, decoded lossily as UTF-8.
    ///
    /// Returns `None` if `path` is missing or is a directory.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn written(&self, path: impl AsRef<Path>) -> Option<String> {
        match self.nodes.read().unwrap().get(path.as_ref()) {
            Some(Node::File(bytes)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    /// Returns `true` if `path` exists as a directory.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        matches!(self.nodes.read().unwrap().get(path.as_ref()), Some(Node::Dir))
    }

    /// Every successful mutating call, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.operations.lock().unwrap().clone()
    }

    fn record(&self, op: Operation) {
        self.operations.lock().unwrap().push(op);
    }

    fn bump(counts: &Mutex<HashMap<PathBuf, usize>>, path: &Path) {
        *counts
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_insert(0) += 1;
    }

    async fn delay(delays: &RwLock<HashMap<PathBuf, Duration>>, path: &Path) {
        let delay = delays.read().unwrap().get(path).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Parent of `path` must exist as a directory.
    fn check_parent(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> Result<(), StorageError> {
        let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };
        match nodes.get(parent) {
            Some(Node::Dir) => Ok(()),
            Some(Node::File(_)) => Err(error(StorageErrorKind::NotADirectory, parent)),
            None => Err(error(StorageErrorKind::NotFound, parent)),
        }
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, StorageError> {
        Self::bump(&self.list_counts, path);
        Self::delay(&self.list_delays, path).await;
        if self.failing_lists.read().unwrap().contains(path) {
            return Err(error(StorageErrorKind::PermissionDenied, path));
        }

        let nodes = self.nodes.read().unwrap();
        match nodes.get(path) {
            None => return Err(error(StorageErrorKind::NotFound, path)),
            Some(Node::File(_)) => return Err(error(StorageErrorKind::NotADirectory, path)),
            Some(Node::Dir) => {}
        }

        let entries = nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(path))
            .filter_map(|(child, node)| {
                let name = child.file_name()?.to_string_lossy().into_owned();
                Some(match node {
                    Node::Dir => DirEntry::dir(name),
                    Node::File(_) => DirEntry::file(name),
                })
            })
            .collect();
        Ok(entries)
    }

    async fn kind(&self, path: &Path) -> Result<EntryKind, StorageError> {
        match self.nodes.read().unwrap().get(path) {
            Some(Node::Dir) => Ok(EntryKind::Directory),
            Some(Node::File(_)) => Ok(EntryKind::File),
            None => Err(error(StorageErrorKind::NotFound, path)),
        }
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        Self::bump(&self.read_counts, path);
        Self::delay(&self.read_delays, path).await;

        match self.nodes.read().unwrap().get(path) {
            Some(Node::File(bytes)) => Ok(bytes.clone()),
            Some(Node::Dir) => Err(error(StorageErrorKind::IsADirectory, path)),
            None => Err(error(StorageErrorKind::NotFound, path)),
        }
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<(), StorageError> {
        if self.failing_writes.read().unwrap().contains(path) {
            return Err(error(StorageErrorKind::PermissionDenied, path));
        }
        {
            let mut nodes = self.nodes.write().unwrap();
            Self::check_parent(&nodes, path)?;
            if matches!(nodes.get(path), Some(Node::Dir)) {
                return Err(error(StorageErrorKind::IsADirectory, path));
            }
            nodes.insert(path.to_path_buf(), Node::File(contents.to_vec()));
        }
        self.record(Operation::Write(path.to_path_buf()));
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        {
            let mut nodes = self.nodes.write().unwrap();
            let mut chain: Vec<&Path> = ancestors(path).collect();
            chain.reverse();
            chain.push(path);
            for dir in chain {
                match nodes.get(dir) {
                    Some(Node::File(_)) => {
                        return Err(error(StorageErrorKind::NotADirectory, dir));
                    }
                    Some(Node::Dir) => {}
                    None => {
                        nodes.insert(dir.to_path_buf(), Node::Dir);
                    }
                }
            }
        }
        self.record(Operation::CreateDir(path.to_path_buf()));
        Ok(())
    }

    async fn copy(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        if self.failing_copies.read().unwrap().contains(from) {
            return Err(error(StorageErrorKind::Other, from).with_source(std::io::Error::other(
                "copy failed",
            )));
        }
        {
            let mut nodes = self.nodes.write().unwrap();
            let bytes = match nodes.get(from) {
                Some(Node::File(bytes)) => bytes.clone(),
                Some(Node::Dir) => return Err(error(StorageErrorKind::IsADirectory, from)),
                None => return Err(error(StorageErrorKind::NotFound, from)),
            };
            Self::check_parent(&nodes, to)?;
            nodes.insert(to.to_path_buf(), Node::File(bytes));
        }
        self.record(Operation::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_mock_storage_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockStorage>();
    }

    #[tokio::test]
    async fn test_with_file_creates_parents() {
        let storage = MockStorage::new().with_file("templates/sub/page.jinja", "x");

        assert!(storage.is_dir("templates"));
        assert!(storage.is_dir("templates/sub"));
        assert_eq!(
            storage.list_dir(Path::new("templates")).await.unwrap(),
            vec![DirEntry::dir("sub")]
        );
    }

    #[tokio::test]
    async fn test_list_dir_direct_children_only() {
        let storage = MockStorage::new()
            .with_file("t/a.jinja", "a")
            .with_file("t/sub/b.jinja", "b")
            .with_dir("t/empty");

        let mut entries = storage.list_dir(Path::new("t")).await.unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(
            entries,
            vec![
                DirEntry::file("a.jinja"),
                DirEntry::dir("empty"),
                DirEntry::dir("sub"),
            ]
        );
        assert_eq!(storage.list_count("t"), 1);
    }

    #[tokio::test]
    async fn test_list_dir_errors() {
        let storage = MockStorage::new().with_file("c/page.json", "{}");

        let missing = storage.list_dir(Path::new("nope")).await.unwrap_err();
        let file = storage
            .list_dir(Path::new("c/page.json"))
            .await
            .unwrap_err();

        assert_eq!(missing.kind, StorageErrorKind::NotFound);
        assert_eq!(missing.backend, Some("Mock"));
        assert_eq!(file.kind, StorageErrorKind::NotADirectory);
    }

    #[tokio::test]
    async fn test_read_counts_and_errors() {
        let storage = MockStorage::new().with_file("a.txt", "hello");

        assert_eq!(storage.read(Path::new("a.txt")).await.unwrap(), b"hello");
        assert_eq!(storage.read(Path::new("a.txt")).await.unwrap(), b"hello");
        assert!(
            storage
                .read(Path::new("b.txt"))
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert_eq!(storage.read_count("a.txt"), 2);
        assert_eq!(storage.read_count("b.txt"), 1);
    }

    #[tokio::test]
    async fn test_write_requires_parent() {
        let storage = MockStorage::new();

        let err = storage
            .write(Path::new("out/index.html"), b"x")
            .await
            .unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert_eq!(err.path.as_deref(), Some(Path::new("out")));
        assert!(storage.operations().is_empty());
    }

    #[tokio::test]
    async fn test_create_dir_then_write_records_operations() {
        let storage = MockStorage::new();

        storage.create_dir_all(Path::new("out/sub")).await.unwrap();
        storage
            .write(Path::new("out/sub/index.html"), b"<p>x</p>")
            .await
            .unwrap();

        assert_eq!(storage.written("out/sub/index.html").unwrap(), "<p>x</p>");
        assert!(storage.is_dir("out"));
        assert_eq!(
            storage.operations(),
            vec![
                Operation::CreateDir(PathBuf::from("out/sub")),
                Operation::Write(PathBuf::from("out/sub/index.html")),
            ]
        );
    }

    #[tokio::test]
    async fn test_create_dir_all_through_file_fails() {
        let storage = MockStorage::new().with_file("out", "oops");

        let err = storage
            .create_dir_all(Path::new("out/sub"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::NotADirectory);
    }

    #[tokio::test]
    async fn test_failing_write() {
        let storage = MockStorage::new()
            .with_dir("out")
            .with_failing_write("out/a.html");

        let err = storage
            .write(Path::new("out/a.html"), b"x")
            .await
            .unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::PermissionDenied);
        assert!(storage.written("out/a.html").is_none());
    }

    #[tokio::test]
    async fn test_failing_list() {
        let storage = MockStorage::new()
            .with_file("c/private/secret.json", "1")
            .with_failing_list("c/private");

        let err = storage.list_dir(Path::new("c/private")).await.unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::PermissionDenied);
        assert_eq!(storage.list_dir(Path::new("c")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_copy() {
        let storage = MockStorage::new()
            .with_file("t/logo.png", vec![1u8, 2, 3])
            .with_dir("o");

        storage
            .copy(Path::new("t/logo.png"), Path::new("o/logo.png"))
            .await
            .unwrap();

        assert_eq!(
            storage.read(Path::new("o/logo.png")).await.unwrap(),
            vec![1u8, 2, 3]
        );
        assert_eq!(
            storage.operations(),
            vec![Operation::Copy {
                from: PathBuf::from("t/logo.png"),
                to: PathBuf::from("o/logo.png"),
            }]
        );
    }

    #[tokio::test]
    async fn test_failing_copy() {
        let storage = MockStorage::new()
            .with_file("t/a.css", "body{}")
            .with_dir("o")
            .with_failing_copy("t/a.css");

        let err = storage
            .copy(Path::new("t/a.css"), Path::new("o/a.css"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::Other);
        assert_eq!(err.to_string(), "[Mock] Error: copy failed (path: t/a.css)");
        assert!(storage.written("o/a.css").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_delay() {
        let storage = MockStorage::new()
            .with_file("slow.txt", "x")
            .with_read_delay("slow.txt", Duration::from_secs(5));
        let started = tokio::time::Instant::now();

        storage.read(Path::new("slow.txt")).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
