//! Template-tree traversal.

use std::path::PathBuf;
use std::sync::Arc;

use stencil_storage::{EntryKind, StorageError};

use crate::BoxFuture;
use crate::error::ItemError;
use crate::event::ItemEvent;
use crate::naming::TemplateName;
use crate::render::dispatch_render;
use crate::run::RunContext;
use crate::static_files::dispatch_static;

/// Mirror `dir` into the output tree and dispatch its files.
///
/// Sub-directories are created in the output tree before they are walked,
/// each in its own task. Files starting with `_` are partials and are skipped;
/// files whose tag is a registered renderer are rendered; everything else is
/// copied.
///
/// # Errors
///
/// Returns the listing error for `dir` itself. Failures below `dir` are
/// reported as [`ItemEvent::Failed`].
pub fn traverse_templates(
    ctx: Arc<RunContext>,
    dir: PathBuf,
) -> BoxFuture<'static, Result<(), StorageError>> {
    Box::pin(async move {
        let entries = ctx.storage.list_dir(&dir).await?;
        tracing::debug!(dir = %dir.display(), entries = entries.len(), "Walking");

        for entry in entries {
            let path = dir.join(&entry.name);
            if ctx.config.is_excluded(&path) {
                tracing::debug!(path = %path.display(), "Excluded");
                continue;
            }
            match entry.kind {
                EntryKind::Directory => descend(&ctx, path).await,
                EntryKind::File => dispatch_file(&ctx, path, &entry.name),
            }
        }
        Ok(())
    })
}

async fn descend(ctx: &Arc<RunContext>, dir: PathBuf) {
    let mirrored = ctx.config.mirror(&dir);
    if let Err(e) = ctx.storage.create_dir_all(&mirrored).await {
        ctx.report(ItemEvent::Failed {
            source: dir,
            error: ItemError::CreateDir(e),
        });
        return;
    }

    let guard = ctx.counter.start();
    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        if let Err(e) = traverse_templates(Arc::clone(&ctx), dir.clone()).await {
            ctx.report(ItemEvent::Failed {
                source: dir,
                error: ItemError::ListDir(e),
            });
        }
        drop(guard);
    });
}

fn dispatch_file(ctx: &Arc<RunContext>, path: PathBuf, file_name: &str) {
    let name = TemplateName::parse(file_name);
    if name.is_partial() {
        return;
    }
    if name.tag().is_some_and(|tag| ctx.registry.has_renderer(tag)) {
        dispatch_render(ctx, path);
    } else {
        dispatch_static(ctx, path);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use stencil_render::Registry;
    use stencil_storage::{MockStorage, Operation, Storage};

    use super::*;
    use crate::config::GeneratorConfig;
    use crate::counter::ActionCounter;

    fn context(storage: &Arc<MockStorage>, config: GeneratorConfig) -> Arc<RunContext> {
        Arc::new(RunContext::new(
            Arc::clone(storage) as Arc<dyn Storage>,
            Arc::new(Registry::with_defaults()),
            config,
            ActionCounter::new(),
            None,
        ))
    }

    async fn walk(ctx: &Arc<RunContext>) -> Vec<ItemEvent> {
        let root = ctx.counter().start();
        traverse_templates(Arc::clone(ctx), ctx.config().template_dir.clone())
            .await
            .unwrap();
        drop(root);
        ctx.counter().drained().await;
        ctx.take_events()
    }

    fn sources(events: &[ItemEvent]) -> Vec<&Path> {
        let mut sources: Vec<&Path> = events.iter().map(ItemEvent::source).collect();
        sources.sort();
        sources
    }

    #[tokio::test]
    async fn test_partials_are_never_rendered() {
        let storage = Arc::new(
            MockStorage::new()
                .with_file("t/_header.jinja", "H")
                .with_file("t/index.jinja", "{% include \"header\" %}")
                .with_dir("o"),
        );
        let ctx = context(&storage, GeneratorConfig::new("t", "o"));

        let events = walk(&ctx).await;

        assert_eq!(sources(&events), vec![Path::new("t/index.jinja")]);
        assert_eq!(storage.written("o/index.html").as_deref(), Some("H"));
        assert!(storage.written("o/_header.html").is_none());
    }

    #[tokio::test]
    async fn test_classifies_templates_and_static_files() {
        let storage = Arc::new(
            MockStorage::new()
                .with_file("t/index.jinja", "i")
                .with_file("t/index.jinja.swp", "swap")
                .with_file("t/logo.png", vec![1u8, 2])
                .with_file("t/.htaccess", "deny")
                .with_dir("o"),
        );
        let ctx = context(&storage, GeneratorConfig::new("t", "o"));

        let events = walk(&ctx).await;

        let rendered = events
            .iter()
            .filter(|e| matches!(e, ItemEvent::Rendered { .. }))
            .count();
        let copied = events
            .iter()
            .filter(|e| matches!(e, ItemEvent::Copied { .. }))
            .count();
        assert_eq!((rendered, copied), (1, 3));
        assert_eq!(storage.written("o/index.jinja.swp").as_deref(), Some("swap"));
        assert_eq!(storage.written("o/.htaccess").as_deref(), Some("deny"));
    }

    #[tokio::test]
    async fn test_directory_created_before_children_written() {
        let storage = Arc::new(
            MockStorage::new()
                .with_file("t/sub/page.jinja", "p")
                .with_file("t/sub/deeper/style.css", "s")
                .with_dir("o"),
        );
        let ctx = context(&storage, GeneratorConfig::new("t", "o"));

        walk(&ctx).await;

        let ops = storage.operations();
        let position = |op: &Operation| ops.iter().position(|o| o == op).unwrap();
        let sub = position(&Operation::CreateDir(PathBuf::from("o/sub")));
        let deeper = position(&Operation::CreateDir(PathBuf::from("o/sub/deeper")));
        let page = position(&Operation::Write(PathBuf::from("o/sub/page.html")));
        let style = position(&Operation::Copy {
            from: PathBuf::from("t/sub/deeper/style.css"),
            to: PathBuf::from("o/sub/deeper/style.css"),
        });
        assert!(sub < page);
        assert!(sub < deeper);
        assert!(deeper < style);
    }

    #[tokio::test]
    async fn test_excluded_entries_are_skipped() {
        let storage = Arc::new(
            MockStorage::new()
                .with_file("t/index.jinja", "i")
                .with_file("t/drafts/wip.jinja", "w")
                .with_file("t/notes.swp", "n")
                .with_dir("o"),
        );
        let config = GeneratorConfig::new("t", "o").with_exclude([
            glob::Pattern::new("drafts").unwrap(),
            glob::Pattern::new("*.swp").unwrap(),
        ]);
        let ctx = context(&storage, config);

        let events = walk(&ctx).await;

        assert_eq!(sources(&events), vec![Path::new("t/index.jinja")]);
        assert!(!storage.is_dir("o/drafts"));
        assert_eq!(storage.list_count("t/drafts"), 0);
    }

    #[tokio::test]
    async fn test_failed_mirror_skips_subtree() {
        let storage = Arc::new(
            MockStorage::new()
                .with_file("t/sub/page.jinja", "p")
                .with_file("o/sub", "a file in the way"),
        );
        let ctx = context(&storage, GeneratorConfig::new("t", "o"));

        let events = walk(&ctx).await;

        assert!(matches!(
            &events[..],
            [ItemEvent::Failed { error: ItemError::CreateDir(_), .. }]
        ));
        assert_eq!(storage.list_count("t/sub"), 0);
    }

    #[tokio::test]
    async fn test_root_listing_error_is_returned() {
        let storage = Arc::new(MockStorage::new());
        let ctx = context(&storage, GeneratorConfig::new("t", "o"));

        let err = traverse_templates(Arc::clone(&ctx), PathBuf::from("t"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }
}
