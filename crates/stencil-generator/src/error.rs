//! Error types for the generation pipeline.

use std::path::PathBuf;

use stencil_render::{ParseError, RegistryError, RenderError};
use stencil_storage::StorageError;

/// Failure while assembling a template's content object.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// A content directory could not be listed.
    #[error("Failed to list content directory {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: StorageError,
    },
    /// A JSON content file is malformed.
    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A parser rejected a content file.
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    /// A content file parsed to something other than an object.
    #[error("Content file {} must contain an object", path.display())]
    NotAnObject { path: PathBuf },
}

/// Failure of a single template, asset, or directory.
///
/// Reported through [`ItemEvent::Failed`](crate::ItemEvent::Failed); never
/// stops the run.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("Failed to read template: {0}")]
    ReadTemplate(#[source] StorageError),
    #[error("Template is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Failed to write output: {0}")]
    Write(#[source] StorageError),
    #[error("Failed to copy: {0}")]
    Copy(#[source] StorageError),
    #[error("Failed to create output directory: {0}")]
    CreateDir(#[source] StorageError),
    #[error("Failed to list directory: {0}")]
    ListDir(#[source] StorageError),
}

/// Failure that aborts a whole run.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Failed to prepare output directory: {0}")]
    OutputRoot(#[source] StorageError),
    #[error("Failed to list template directory: {0}")]
    TemplateRoot(#[source] StorageError),
    #[error("Generation was not started")]
    StartAborted,
}
