//! `stencil build` command implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use stencil_config::{CliSettings, Config, SiteConfig};
use stencil_generator::{Generator, GeneratorConfig, Hooks, ItemEvent};
use stencil_render::{Registry, RegistryError};
use stencil_storage::{FsStorage, Storage};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover stencil.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Template directory (overrides config).
    #[arg(short, long, env = "STENCIL_TEMPLATE_DIR")]
    template_dir: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long, env = "STENCIL_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Content directory (overrides config, empty disables content).
    #[arg(long)]
    content_dir: Option<PathBuf>,

    /// Default output extension (overrides config, empty keeps bare names).
    #[arg(long)]
    output_extension: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl BuildArgs {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            template_dir: self.template_dir,
            output_dir: self.output_dir,
            content_dir: self.content_dir,
            output_extension: self.output_extension,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        tracing::debug!(
            renderers = config.renderers.len(),
            parsers = config.parsers.len(),
            "Loaded configuration"
        );

        if let Some(path) = &config.config_path {
            output.detail(&format!("Config: {}", path.display()));
        }
        let registry = build_registry(&config)?;
        let generator_config = generator_config(config.site_resolved);

        output.info(&format!(
            "Templates: {}",
            generator_config.template_dir.display()
        ));
        output.info(&format!("Output: {}", generator_config.output_dir.display()));

        let template_root = generator_config.template_dir.clone();
        let output_root = generator_config.output_dir.clone();
        let printer = Output::new();
        let hooks = Hooks::new().with_on_each(move |event| {
            let line = describe(event, &template_root, &output_root);
            if event.is_failure() {
                printer.error(&line);
            } else {
                printer.info(&line);
            }
        });

        let storage: Arc<dyn Storage> = Arc::new(FsStorage::new());
        let generator = Generator::new(storage, Arc::new(registry));
        let report = generator.generate(generator_config, hooks).await?;

        tracing::info!(
            rendered = report.rendered,
            copied = report.copied,
            failed = report.failures,
            "Build finished"
        );
        let summary = format!(
            "{} rendered, {} copied, {} failed",
            report.rendered, report.copied, report.failures
        );
        if !report.is_success() {
            output.error(&summary);
            return Err(CliError::Failures(report.failures));
        }

        output.highlight(&summary);
        output.success("Site generated successfully");
        Ok(())
    }
}

/// Default engines plus the aliases declared in `[renderers]` and `[parsers]`.
fn build_registry(config: &Config) -> Result<Registry, RegistryError> {
    let mut registry = Registry::with_defaults();
    for (key, name) in &config.renderers {
        registry.alias_renderer(key.as_str(), name)?;
    }
    for (key, name) in &config.parsers {
        registry.alias_parser(key.as_str(), name)?;
    }
    Ok(registry)
}

fn generator_config(site: SiteConfig) -> GeneratorConfig {
    let mut config = GeneratorConfig::new(site.template_dir, site.output_dir)
        .with_output_extension(site.output_extension.as_deref())
        .with_exclude(site.exclude);
    config.content_dir = site.content_dir;
    config.shared_content = site.shared_content;
    config
}

/// One terminal line for an item, with paths relative to their roots.
fn describe(event: &ItemEvent, template_root: &Path, output_root: &Path) -> String {
    let rel = |path: &Path, root: &Path| {
        path.strip_prefix(root)
            .unwrap_or(path)
            .display()
            .to_string()
    };
    match event {
        ItemEvent::Rendered { template, output } => format!(
            "  render  {} -> {}",
            rel(template, template_root),
            rel(output, output_root)
        ),
        ItemEvent::Copied {
            source,
            destination,
        } => format!(
            "  copy    {} -> {}",
            rel(source, template_root),
            rel(destination, output_root)
        ),
        ItemEvent::Failed { source, error } => {
            format!("  failed  {}: {error}", rel(source, template_root))
        }
    }
}
