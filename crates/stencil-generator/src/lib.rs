//! Asynchronous template-tree generation.
//!
//! Walks a directory of templates and produces a mirrored output tree:
//!
//! - templates (files whose last extension is a registered renderer tag) are
//!   rendered with their content and partials, then written
//! - partials (files starting with `_`) are only used through includes
//! - everything else is copied verbatim
//!
//! All filesystem access goes through [`stencil_storage::Storage`], and
//! engines come from a [`stencil_render::Registry`].
//!
//! # Pipeline
//!
//! [`Generator::generate`] builds a [`RunContext`], ensures the output root
//! exists, and starts [`traverse_templates`] at the template root. Every
//! render, copy, and pending sub-directory holds an [`ActionGuard`]; when the
//! last guard drops, the run's [`ActionCounter`] fires the completion hook
//! and `generate` returns a [`GenerationReport`].
//!
//! Each render fans out to the [`ContentFetcher`] and [`PartialCache`] and
//! fans back in to a single renderer call.

use std::future::Future;
use std::pin::Pin;

mod config;
mod content;
mod counter;
mod error;
mod event;
mod generator;
mod hooks;
pub mod naming;
mod partials;
mod render;
mod run;
mod static_files;
mod walker;

pub use config::GeneratorConfig;
pub use content::ContentFetcher;
pub use counter::{ActionCounter, ActionGuard};
pub use error::{ContentError, GenerateError, ItemError};
pub use event::{GenerationReport, ItemEvent};
pub use generator::{Generator, prepare_output_directory};
pub use hooks::{EachHook, Hooks, StartSignal};
pub use naming::TemplateName;
pub use partials::PartialCache;
pub use render::{dispatch_render, render_template};
pub use run::RunContext;
pub use static_files::dispatch_static;
pub use walker::traverse_templates;

/// Boxed future used where async functions recurse.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
