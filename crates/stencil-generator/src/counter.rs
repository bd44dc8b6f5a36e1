//! Running-action counter.
//!
//! Tracks outstanding asynchronous work for one generation run and signals
//! completion exactly once when the last unit finishes. Work is represented
//! by [`ActionGuard`]s: taking a guard increments the count and dropping it
//! decrements, so increments and decrements always pair up.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

type CompletionHook = Box<dyn FnOnce() + Send>;

struct Inner {
    running: AtomicUsize,
    fired: AtomicBool,
    hook: Mutex<Option<CompletionHook>>,
    notify: Notify,
}

impl Inner {
    fn complete(&self) {
        if self.fired.swap(true, Ordering::AcqRel) {
            return;
        }
        let hook = self
            .hook
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(hook) = hook {
            hook();
        }
        self.notify.notify_waiters();
    }
}

/// Counter of in-flight work for a single run.
///
/// Cloning yields another handle to the same counter.
#[derive(Clone)]
pub struct ActionCounter {
    inner: Arc<Inner>,
}

impl ActionCounter {
    /// Create a counter without a completion hook.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a counter that runs `hook` when the count first returns to zero.
    #[must_use]
    pub fn with_hook(hook: impl FnOnce() + Send + 'static) -> Self {
        Self::build(Some(Box::new(hook)))
    }

    fn build(hook: Option<CompletionHook>) -> Self {
        Self {
            inner: Arc::new(Inner {
                running: AtomicUsize::new(0),
                fired: AtomicBool::new(false),
                hook: Mutex::new(hook),
                notify: Notify::new(),
            }),
        }
    }

    /// Register one unit of work.
    #[must_use = "dropping the guard immediately ends the unit of work"]
    pub fn start(&self) -> ActionGuard {
        self.inner.running.fetch_add(1, Ordering::AcqRel);
        ActionGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Number of units currently in flight.
    #[must_use]
    pub fn running(&self) -> usize {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Returns `true` once the count has drained to zero.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }

    /// Suppress the completion hook.
    ///
    /// Used when a run fails before any work is dispatched. [`drained`]
    /// resolves immediately afterwards.
    ///
    /// [`drained`]: Self::drained
    pub fn disarm(&self) {
        if !self.inner.fired.swap(true, Ordering::AcqRel) {
            self.inner
                .hook
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .take();
            self.inner.notify.notify_waiters();
        }
    }

    /// Wait until the count drains to zero.
    pub async fn drained(&self) {
        let notified = self.inner.notify.notified();
        if self.is_complete() {
            return;
        }
        notified.await;
    }
}

impl Default for ActionCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActionCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionCounter")
            .field("running", &self.running())
            .field("complete", &self.is_complete())
            .finish_non_exhaustive()
    }
}

/// One unit of in-flight work. Decrements the counter on drop.
pub struct ActionGuard {
    inner: Arc<Inner>,
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        if self.inner.running.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.complete();
        }
    }
}
