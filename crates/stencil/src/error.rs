//! CLI error types.

use stencil_config::ConfigError;
use stencil_generator::GenerateError;
use stencil_render::RegistryError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Generate(#[from] GenerateError),

    #[error("{0} item(s) failed")]
    Failures(usize),
}
