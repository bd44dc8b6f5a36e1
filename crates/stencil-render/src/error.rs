//! Error types for the registry and its built-in engines.

/// Lookup failure in the [`Registry`](crate::Registry).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No renderer is registered under the key.
    #[error("No renderer registered for '{0}'")]
    UnknownRenderer(String),
    /// No parser is registered under the key.
    #[error("No parser registered for '{0}'")]
    UnknownParser(String),
}

/// Failure while rendering a template.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The template engine rejected the template or failed while rendering.
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Failure while parsing a content file.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Content is not valid UTF-8.
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    /// YAML syntax error.
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// TOML syntax error.
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
}
