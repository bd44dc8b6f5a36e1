//! Run-scoped state shared by every pipeline stage.

use std::sync::{Arc, Mutex, PoisonError};

use stencil_render::Registry;
use stencil_storage::Storage;

use crate::config::GeneratorConfig;
use crate::content::ContentFetcher;
use crate::counter::ActionCounter;
use crate::event::ItemEvent;
use crate::hooks::EachHook;
use crate::partials::PartialCache;

/// State owned by one generation run.
///
/// Built fresh by [`Generator::generate`](crate::Generator::generate) and
/// passed to every stage, so concurrent runs never share caches or counters.
pub struct RunContext {
    pub(crate) storage: Arc<dyn Storage>,
    pub(crate) registry: Arc<Registry>,
    pub(crate) config: GeneratorConfig,
    pub(crate) counter: ActionCounter,
    pub(crate) content: Arc<ContentFetcher>,
    pub(crate) partials: Arc<PartialCache>,
    on_each: Option<EachHook>,
    events: Mutex<Vec<ItemEvent>>,
}

impl RunContext {
    /// Create run state for `config`.
    pub fn new(
        storage: Arc<dyn Storage>,
        registry: Arc<Registry>,
        config: GeneratorConfig,
        counter: ActionCounter,
        on_each: Option<EachHook>,
    ) -> Self {
        let content = Arc::new(ContentFetcher::new(
            Arc::clone(&storage),
            Arc::clone(&registry),
            config.shared_content_path(),
        ));
        let partials = Arc::new(PartialCache::new(
            Arc::clone(&storage),
            Arc::clone(&registry),
            config.template_dir.clone(),
        ));
        Self {
            storage,
            registry,
            config,
            counter,
            content,
            partials,
            on_each,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Settings for this run.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Outstanding-work counter.
    #[must_use]
    pub fn counter(&self) -> &ActionCounter {
        &self.counter
    }

    /// Partial cache for this run.
    #[must_use]
    pub fn partials(&self) -> &Arc<PartialCache> {
        &self.partials
    }

    /// Record a finished item and pass it to the `on_each` hook.
    pub(crate) fn report(&self, event: ItemEvent) {
        match &event {
            ItemEvent::Rendered { template, output } => {
                tracing::debug!(template = %template.display(), output = %output.display(), "Rendered");
            }
            ItemEvent::Copied {
                source,
                destination,
            } => {
                tracing::debug!(source = %source.display(), destination = %destination.display(), "Copied");
            }
            ItemEvent::Failed { source, error } => {
                tracing::warn!(path = %source.display(), %error, "Item failed");
            }
        }
        if let Some(hook) = &self.on_each {
            hook(&event);
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Drain the recorded events.
    pub fn take_events(&self) -> Vec<ItemEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
