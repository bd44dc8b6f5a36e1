//! Partial resolution with ancestor inheritance.
//!
//! A template sees the partials of its own directory and of every ancestor
//! up to the template root. Each directory is scanned at most once per run:
//! concurrent requests for the same directory share one in-flight scan.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use stencil_render::{Partials, Registry};
use stencil_storage::{EntryKind, Storage};
use tokio::sync::OnceCell;
use tokio::task::JoinSet;

use crate::naming::TemplateName;

type Slot = Arc<OnceCell<Arc<Partials>>>;

/// Run-scoped cache of per-directory partial sets.
pub struct PartialCache {
    storage: Arc<dyn Storage>,
    registry: Arc<Registry>,
    root: PathBuf,
    slots: Mutex<HashMap<PathBuf, Slot>>,
    scans: AtomicUsize,
}

impl PartialCache {
    /// Create an empty cache for the template tree rooted at `root`.
    pub fn new(storage: Arc<dyn Storage>, registry: Arc<Registry>, root: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            registry,
            root: root.into(),
            slots: Mutex::new(HashMap::new()),
            scans: AtomicUsize::new(0),
        }
    }

    /// Partials visible from `dir`.
    ///
    /// Fetches `dir` and each of its ancestors up to the root concurrently,
    /// then merges root first so the deepest directory wins on collision.
    pub async fn fetch_partials(self: &Arc<Self>, dir: &Path) -> Partials {
        let chain = self.ancestor_chain(dir);

        let mut tasks = JoinSet::new();
        for (depth, dir) in chain.iter().cloned().enumerate() {
            let cache = Arc::clone(self);
            tasks.spawn(async move { (depth, cache.fetch_partials_with_cache(&dir).await) });
        }

        let mut resolved: Vec<Option<Arc<Partials>>> = vec![None; chain.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((depth, partials)) => resolved[depth] = Some(partials),
                Err(e) => std::panic::resume_unwind(e.into_panic()),
            }
        }

        let mut merged = Partials::new();
        for partials in resolved.into_iter().flatten() {
            merged.extend(
                partials
                    .iter()
                    .map(|(name, body)| (name.clone(), body.clone())),
            );
        }
        merged
    }

    /// Partials defined directly in `dir`, scanned at most once.
    ///
    /// Concurrent callers for the same directory wait on the first caller's
    /// scan and are woken in arrival order. Every caller receives the same
    /// `Arc`.
    pub async fn fetch_partials_with_cache(&self, dir: &Path) -> Arc<Partials> {
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            Arc::clone(slots.entry(dir.to_path_buf()).or_default())
        };

        if let Some(partials) = slot.get() {
            tracing::debug!(dir = %dir.display(), "Partial cache hit");
            return Arc::clone(partials);
        }

        let partials = slot
            .get_or_init(|| async { Arc::new(self.fetch_partials_in_dir(dir).await) })
            .await;
        Arc::clone(partials)
    }

    /// Scan `dir` for partials.
    ///
    /// A partial is a file whose name starts with `_` and whose tag is a
    /// registered renderer. Bodies are read concurrently. An unreadable
    /// directory yields an empty set.
    pub async fn fetch_partials_in_dir(&self, dir: &Path) -> Partials {
        self.scans.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(dir = %dir.display(), "Scanning for partials");

        let entries = match self.storage.list_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "No partials");
                return Partials::new();
            }
        };

        let mut tasks = JoinSet::new();
        for entry in entries {
            if entry.kind != EntryKind::File {
                continue;
            }
            let name = TemplateName::parse(&entry.name);
            let Some(key) = name.partial_key() else {
                continue;
            };
            if !name.tag().is_some_and(|tag| self.registry.has_renderer(tag)) {
                continue;
            }

            let key = key.to_owned();
            let path = dir.join(&entry.name);
            let storage = Arc::clone(&self.storage);
            tasks.spawn(async move {
                let body = match storage.read(&path).await {
                    Ok(raw) => String::from_utf8(raw).map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                (key, path, body)
            });
        }

        let mut partials = Partials::new();
        while let Some(joined) = tasks.join_next().await {
            let (key, path, body) = match joined {
                Ok(read) => read,
                Err(e) => std::panic::resume_unwind(e.into_panic()),
            };
            match body {
                Ok(body) => {
                    partials.insert(key, body);
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "Skipping unreadable partial");
                }
            }
        }
        partials
    }

    /// Returns `true` if `dir` has been scanned.
    #[must_use]
    pub fn is_cached(&self, dir: &Path) -> bool {
        self.slot(dir).is_some_and(|slot| slot.initialized())
    }

    /// Returns `true` if a scan of `dir` is in flight.
    #[must_use]
    pub fn is_pending(&self, dir: &Path) -> bool {
        self.slot(dir).is_some_and(|slot| !slot.initialized())
    }

    /// Number of directory scans performed.
    #[must_use]
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }

    fn slot(&self, dir: &Path) -> Option<Slot> {
        self.slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(dir)
            .cloned()
    }

    /// `dir` and its ancestors within the root, root first.
    fn ancestor_chain(&self, dir: &Path) -> Vec<PathBuf> {
        if !dir.starts_with(&self.root) {
            return vec![dir.to_path_buf()];
        }
        let mut chain: Vec<PathBuf> = dir
            .ancestors()
            .take_while(|p| p.starts_with(&self.root))
            .map(Path::to_path_buf)
            .collect();
        chain.reverse();
        chain
    }
}
