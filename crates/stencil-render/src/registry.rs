//! Content-type registry.
//!
//! Maps a template tag (`"jinja"` in `index.html.jinja`) to a renderer and a
//! content extension (`"md"` in `about.md`) to a parser. Tables are filled
//! before a run starts and only read while it is in progress.

use std::collections::HashMap;
use std::fmt;

use crate::error::RegistryError;
use crate::parser::{MarkdownParser, Parser, TomlParser, YamlParser};
use crate::renderer::{JinjaRenderer, Renderer};

/// Constructs a fresh renderer.
pub type RendererFactory = Box<dyn Fn() -> Box<dyn Renderer> + Send + Sync>;

/// Constructs a fresh parser.
pub type ParserFactory = Box<dyn Fn() -> Box<dyn Parser> + Send + Sync>;

/// Names of the built-in renderers, usable as alias targets.
pub const BUILTIN_RENDERERS: &[&str] = &["jinja"];

/// Names of the built-in parsers, usable as alias targets.
pub const BUILTIN_PARSERS: &[&str] = &["markdown", "yaml", "toml"];

/// Factory for the built-in renderer called `name`.
#[must_use]
pub fn builtin_renderer(name: &str) -> Option<RendererFactory> {
    match name {
        "jinja" => Some(Box::new(|| -> Box<dyn Renderer> { Box::new(JinjaRenderer) })),
        _ => None,
    }
}

/// Factory for the built-in parser called `name`.
#[must_use]
pub fn builtin_parser(name: &str) -> Option<ParserFactory> {
    match name {
        "markdown" => Some(Box::new(|| -> Box<dyn Parser> { Box::new(MarkdownParser) })),
        "yaml" => Some(Box::new(|| -> Box<dyn Parser> { Box::new(YamlParser) })),
        "toml" => Some(Box::new(|| -> Box<dyn Parser> { Box::new(TomlParser) })),
        _ => None,
    }
}

/// Renderer and parser tables keyed by extension.
#[derive(Default)]
pub struct Registry {
    renderers: HashMap<String, RendererFactory>,
    parsers: HashMap<String, ParserFactory>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in engines.
    ///
    /// | Key | Kind | Implementation |
    /// |-----|------|----------------|
    /// | `jinja`, `j2` | renderer | [`JinjaRenderer`] |
    /// | `md`, `markdown` | parser | [`MarkdownParser`] |
    /// | `yaml`, `yml` | parser | [`YamlParser`] |
    /// | `toml` | parser | [`TomlParser`] |
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_renderer::<JinjaRenderer>("jinja");
        registry.register_renderer::<JinjaRenderer>("j2");
        registry.register_parser::<MarkdownParser>("md");
        registry.register_parser::<MarkdownParser>("markdown");
        registry.register_parser::<YamlParser>("yaml");
        registry.register_parser::<YamlParser>("yml");
        registry.register_parser::<TomlParser>("toml");
        registry
    }

    /// Register `R` under `key`, replacing any previous renderer.
    pub fn register_renderer<R: Renderer + Default + 'static>(&mut self, key: impl Into<String>) {
        self.register_renderer_with(key, || -> Box<dyn Renderer> { Box::new(R::default()) });
    }

    /// Register a renderer factory under `key`, replacing any previous one.
    pub fn register_renderer_with<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Renderer> + Send + Sync + 'static,
    {
        self.renderers.insert(key.into(), Box::new(factory));
    }

    /// Register `P` under `key`, replacing any previous parser.
    pub fn register_parser<P: Parser + Default + 'static>(&mut self, key: impl Into<String>) {
        self.register_parser_with(key, || -> Box<dyn Parser> { Box::new(P::default()) });
    }

    /// Register a parser factory under `key`, replacing any previous one.
    pub fn register_parser_with<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Parser> + Send + Sync + 'static,
    {
        self.parsers.insert(key.into(), Box::new(factory));
    }

    /// Bind `key` to the built-in renderer `name`.
    pub fn alias_renderer(&mut self, key: impl Into<String>, name: &str) -> Result<(), RegistryError> {
        let factory =
            builtin_renderer(name).ok_or_else(|| RegistryError::UnknownRenderer(name.to_owned()))?;
        let key = key.into();
        tracing::debug!(key = %key, renderer = name, "Registered renderer alias");
        self.renderers.insert(key, factory);
        Ok(())
    }

    /// Bind `key` to the built-in parser `name`.
    pub fn alias_parser(&mut self, key: impl Into<String>, name: &str) -> Result<(), RegistryError> {
        let factory =
            builtin_parser(name).ok_or_else(|| RegistryError::UnknownParser(name.to_owned()))?;
        let key = key.into();
        tracing::debug!(key = %key, parser = name, "Registered parser alias");
        self.parsers.insert(key, factory);
        Ok(())
    }

    /// Construct a renderer for `key`.
    pub fn renderer_for(&self, key: &str) -> Result<Box<dyn Renderer>, RegistryError> {
        self.renderers
            .get(key)
            .map(|factory| factory())
            .ok_or_else(|| RegistryError::UnknownRenderer(key.to_owned()))
    }

    /// Construct a parser for `key`.
    pub fn parser_for(&self, key: &str) -> Result<Box<dyn Parser>, RegistryError> {
        self.parsers
            .get(key)
            .map(|factory| factory())
            .ok_or_else(|| RegistryError::UnknownParser(key.to_owned()))
    }

    /// Returns `true` if a renderer is registered for `key`.
    #[must_use]
    pub fn has_renderer(&self, key: &str) -> bool {
        self.renderers.contains_key(key)
    }

    /// Returns `true` if a parser is registered for `key`.
    #[must_use]
    pub fn has_parser(&self, key: &str) -> bool {
        self.parsers.contains_key(key)
    }

    /// Registered renderer keys, sorted.
    #[must_use]
    pub fn renderer_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.renderers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parsers: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        parsers.sort_unstable();
        f.debug_struct("Registry")
            .field("renderers", &self.renderer_keys())
            .field("parsers", &parsers)
            .finish()
    }
}
