//! Generation entry point.

use std::sync::Arc;

use stencil_render::Registry;
use stencil_storage::{EntryKind, Storage};

use crate::config::GeneratorConfig;
use crate::counter::ActionCounter;
use crate::error::GenerateError;
use crate::event::GenerationReport;
use crate::hooks::{Hooks, StartSignal};
use crate::run::RunContext;
use crate::walker::traverse_templates;

/// Renders a template tree into an output tree.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use stencil_generator::{Generator, GeneratorConfig, Hooks};
/// use stencil_render::Registry;
/// use stencil_storage::FsStorage;
///
/// let generator = Generator::new(Arc::new(FsStorage::new()), Arc::new(Registry::with_defaults()));
/// let report = generator
///     .generate(GeneratorConfig::new("templates", "public"), Hooks::new())
///     .await?;
/// ```
pub struct Generator {
    storage: Arc<dyn Storage>,
    registry: Arc<Registry>,
}

impl Generator {
    /// Create a generator over `storage` using the engines in `registry`.
    pub fn new(storage: Arc<dyn Storage>, registry: Arc<Registry>) -> Self {
        Self { storage, registry }
    }

    /// Run one generation and wait for every item to finish.
    ///
    /// Per-item failures are collected in the report; only problems with the
    /// output or template roots abort the run.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::StartAborted`] if the `on_start` hook drops
    /// its signal, [`GenerateError::OutputRoot`] if the output directory
    /// can't be created, and [`GenerateError::TemplateRoot`] if the template
    /// directory can't be listed.
    pub async fn generate(
        &self,
        config: GeneratorConfig,
        hooks: Hooks,
    ) -> Result<GenerationReport, GenerateError> {
        let Hooks {
            on_start,
            on_complete,
            on_each,
        } = hooks;

        if let Some(on_start) = on_start {
            let (signal, started) = StartSignal::new();
            on_start(signal);
            started.await.map_err(|_| GenerateError::StartAborted)?;
        }

        let counter = match on_complete {
            Some(hook) => ActionCounter::with_hook(hook),
            None => ActionCounter::new(),
        };
        let ctx = Arc::new(RunContext::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.registry),
            config,
            counter,
            on_each,
        ));

        tracing::info!(
            templates = %ctx.config.template_dir.display(),
            output = %ctx.config.output_dir.display(),
            "Generating"
        );
        prepare_output_directory(&ctx).await?;

        let root = ctx.counter.start();
        if let Err(e) = traverse_templates(Arc::clone(&ctx), ctx.config.template_dir.clone()).await
        {
            ctx.counter.disarm();
            return Err(GenerateError::TemplateRoot(e));
        }
        drop(root);
        ctx.counter.drained().await;

        let report = GenerationReport::from_events(ctx.take_events());
        tracing::info!(
            rendered = report.rendered,
            copied = report.copied,
            failed = report.failures,
            "Generation complete"
        );
        Ok(report)
    }
}

/// Ensure the output root exists as a directory.
///
/// # Errors
///
/// Returns [`GenerateError::OutputRoot`] if it can't be created.
pub async fn prepare_output_directory(ctx: &RunContext) -> Result<(), GenerateError> {
    let output = &ctx.config.output_dir;
    if let Ok(EntryKind::Directory) = ctx.storage.kind(output).await {
        return Ok(());
    }
    tracing::debug!(path = %output.display(), "Creating output directory");
    ctx.storage
        .create_dir_all(output)
        .await
        .map_err(GenerateError::OutputRoot)
}
