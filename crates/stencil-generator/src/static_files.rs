//! Static file handler.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ItemError;
use crate::event::ItemEvent;
use crate::run::RunContext;

/// Copy `source` to its mirrored location in the output tree.
///
/// A copy failure is reported as [`ItemEvent::Failed`] and is not retried.
pub fn dispatch_static(ctx: &Arc<RunContext>, source: PathBuf) {
    let destination = ctx.config.mirror(&source);
    let guard = ctx.counter.start();
    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        let event = match ctx.storage.copy(&source, &destination).await {
            Ok(()) => ItemEvent::Copied {
                source,
                destination,
            },
            Err(e) => ItemEvent::Failed {
                source,
                error: ItemError::Copy(e),
            },
        };
        ctx.report(event);
        drop(guard);
    });
}
