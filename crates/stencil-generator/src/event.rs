//! Per-item outcomes and the run report.

use std::path::{Path, PathBuf};

use crate::error::ItemError;

/// Outcome of one unit of work.
#[derive(Debug)]
pub enum ItemEvent {
    /// A template was rendered and written.
    Rendered { template: PathBuf, output: PathBuf },
    /// A static file was copied.
    Copied {
        source: PathBuf,
        destination: PathBuf,
    },
    /// A template, static file, or directory could not be processed.
    Failed { source: PathBuf, error: ItemError },
}

impl ItemEvent {
    /// Path of the template-tree entry this event is about.
    #[must_use]
    pub fn source(&self) -> &Path {
        match self {
            Self::Rendered { template, .. } => template,
            Self::Copied { source, .. } | Self::Failed { source, .. } => source,
        }
    }

    /// Returns `true` for [`ItemEvent::Failed`].
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Summary of a finished run.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Templates rendered.
    pub rendered: usize,
    /// Static files copied.
    pub copied: usize,
    /// Items that failed.
    pub failures: usize,
    events: Vec<ItemEvent>,
}

impl GenerationReport {
    pub(crate) fn from_events(events: Vec<ItemEvent>) -> Self {
        let mut report = Self::default();
        for event in &events {
            match event {
                ItemEvent::Rendered { .. } => report.rendered += 1,
                ItemEvent::Copied { .. } => report.copied += 1,
                ItemEvent::Failed { .. } => report.failures += 1,
            }
        }
        report.events = events;
        report
    }

    /// Every event, in the order items finished.
    #[must_use]
    pub fn events(&self) -> &[ItemEvent] {
        &self.events
    }

    /// Failed items.
    pub fn failed(&self) -> impl Iterator<Item = (&Path, &ItemError)> {
        self.events.iter().filter_map(|event| match event {
            ItemEvent::Failed { source, error } => Some((source.as_path(), error)),
            _ => None,
        })
    }

    /// Returns `true` if no item failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures == 0
    }
}
