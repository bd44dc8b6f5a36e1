//! Renderer contract and the built-in minijinja renderer.

use std::collections::BTreeMap;

use crate::error::RenderError;

/// Merged structured content handed to a renderer.
pub type Content = serde_json::Map<String, serde_json::Value>;

/// Partial name to raw template body.
pub type Partials = BTreeMap<String, String>;

/// Everything a renderer needs for one template.
#[derive(Clone, Copy, Debug)]
pub struct RenderInput<'a> {
    /// Template body.
    pub template: &'a str,
    /// Shared and per-template content, already merged.
    pub content: &'a Content,
    /// Partials visible from the template's directory.
    pub partials: &'a Partials,
}

/// A template engine.
///
/// The registry constructs a fresh instance for every render, so
/// implementations may keep per-render state.
pub trait Renderer: Send {
    /// Render `input` and return the output text.
    fn render(&self, input: &RenderInput<'_>) -> Result<String, RenderError>;
}

/// Renderer backed by [minijinja](https://docs.rs/minijinja).
///
/// Content keys become template variables. Each partial is registered as a
/// named template, so `{% include "header" %}` pulls in `_header.jinja`.
#[derive(Debug, Default)]
pub struct JinjaRenderer;

impl Renderer for JinjaRenderer {
    fn render(&self, input: &RenderInput<'_>) -> Result<String, RenderError> {
        tracing::debug!(partials = input.partials.len(), "Rendering jinja template");
        let mut env = minijinja::Environment::new();
        for (name, body) in input.partials {
            env.add_template(name, body)?;
        }
        Ok(env.render_str(input.template, input.content)?)
    }
}
