//! Filesystem primitives for the stencil site generator.
//!
//! The generation pipeline never touches `std::fs` or `tokio::fs` directly.
//! Every directory listing, read, write, directory creation, and static copy
//! goes through the [`Storage`] trait, which makes it possible to:
//!
//! - **Unit test** the pipeline without touching the real filesystem
//! - **Inject latency and failures** to exercise concurrent code paths
//! - **Observe ordering** of mutating operations (see [`MockStorage::operations`])
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Storage`] async trait with `list_dir()`, `kind()`, `read()`, `write()`,
//!   `create_dir_all()`, and `copy()`
//! - [`FsStorage`] implementation backed by `tokio::fs`
//! - [`MockStorage`] in-memory tree for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use stencil_storage::{FsStorage, Storage};
//!
//! let storage = FsStorage::new();
//! for entry in storage.list_dir(Path::new("templates")).await? {
//!     println!("{} ({:?})", entry.name, entry.kind);
//! }
//! ```

mod fs;
#[cfg(feature = "mock")]
mod mock;
mod storage;

pub use fs::FsStorage;
#[cfg(feature = "mock")]
pub use mock::{MockStorage, Operation};
pub use storage::{DirEntry, EntryKind, Storage, StorageError, StorageErrorKind};
