//! Caller hooks for a generation run.

use std::fmt;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::event::ItemEvent;

/// Called for every finished item.
pub type EachHook = Arc<dyn Fn(&ItemEvent) + Send + Sync>;

type StartHook = Box<dyn FnOnce(StartSignal) + Send>;
type CompleteHook = Box<dyn FnOnce() + Send>;

/// Permission to begin a run, handed to the `on_start` hook.
///
/// Generation waits until [`proceed`](Self::proceed) is called. Dropping the
/// signal instead aborts the run with
/// [`GenerateError::StartAborted`](crate::GenerateError::StartAborted).
#[derive(Debug)]
pub struct StartSignal {
    tx: oneshot::Sender<()>,
}

impl StartSignal {
    pub(crate) fn new() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Start generating.
    pub fn proceed(self) {
        // The receiver only goes away if the run itself was dropped.
        let _ = self.tx.send(());
    }
}

/// Optional callbacks for a run.
#[derive(Default)]
pub struct Hooks {
    /// Runs before any filesystem work; must call [`StartSignal::proceed`].
    pub on_start: Option<StartHook>,
    /// Runs once, after every item has finished.
    pub on_complete: Option<CompleteHook>,
    /// Runs for each rendered, copied, or failed item, before `on_complete`.
    pub on_each: Option<EachHook>,
}

impl Hooks {
    /// No hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start hook.
    #[must_use]
    pub fn with_on_start(mut self, hook: impl FnOnce(StartSignal) + Send + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    /// Set the completion hook.
    #[must_use]
    pub fn with_on_complete(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    /// Set the per-item hook.
    #[must_use]
    pub fn with_on_each(mut self, hook: impl Fn(&ItemEvent) + Send + Sync + 'static) -> Self {
        self.on_each = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_start", &self.on_start.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_each", &self.on_each.is_some())
            .finish()
    }
}
