//! Renderer and parser registry for stencil.
//!
//! A template's last dotted segment (its *tag*) selects a [`Renderer`];
//! a content file's extension selects a [`Parser`]. Both are looked up in a
//! [`Registry`] that is filled before generation starts.
//!
//! # Built-in engines
//!
//! - [`JinjaRenderer`]: minijinja templates; partials are includable by name
//! - [`MarkdownParser`]: markdown to an HTML string via pulldown-cmark
//! - [`YamlParser`], [`TomlParser`]: structured data
//!
//! # Example
//!
//! ```
//! use stencil_render::{Content, Partials, RenderInput, Registry};
//!
//! let registry = Registry::with_defaults();
//! let mut content = Content::new();
//! content.insert("name".to_owned(), "world".into());
//!
//! let html = registry
//!     .renderer_for("jinja")?
//!     .render(&RenderInput {
//!         template: "Hello {{ name }}",
//!         content: &content,
//!         partials: &Partials::new(),
//!     })
//!     .unwrap();
//! assert_eq!(html, "Hello world");
//! # Ok::<(), stencil_render::RegistryError>(())
//! ```

mod error;
mod parser;
mod registry;
mod renderer;

pub use error::{ParseError, RegistryError, RenderError};
pub use parser::{MarkdownParser, Parser, TomlParser, YamlParser};
pub use registry::{
    BUILTIN_PARSERS, BUILTIN_RENDERERS, ParserFactory, Registry, RendererFactory, builtin_parser,
    builtin_renderer,
};
pub use renderer::{Content, JinjaRenderer, Partials, RenderInput, Renderer};
