//! Render pipeline for a single template.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use stencil_render::{Content, RenderInput};

use crate::error::ItemError;
use crate::event::ItemEvent;
use crate::naming::TemplateName;
use crate::run::RunContext;

/// Render `template` in the background.
///
/// The run's counter stays raised until the result has been reported.
pub fn dispatch_render(ctx: &Arc<RunContext>, template: PathBuf) {
    let guard = ctx.counter.start();
    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        let event = match render_template(&ctx, &template).await {
            Ok(output) => ItemEvent::Rendered { template, output },
            Err(error) => ItemEvent::Failed {
                source: template,
                error,
            },
        };
        ctx.report(event);
        drop(guard);
    });
}

/// Render `template` and write the result; returns the output path.
///
/// Template body, shared content, per-template content, and partials are
/// fetched concurrently. Per-template content overrides shared content.
pub async fn render_template(ctx: &Arc<RunContext>, template: &Path) -> Result<PathBuf, ItemError> {
    let file_name = template
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = TemplateName::parse(&file_name);
    let renderer = ctx.registry.renderer_for(name.tag().unwrap_or_default())?;

    let config = &ctx.config;
    let relative = config.relative_dir(template);
    let content_path = config
        .content_dir
        .as_ref()
        .map(|dir| dir.join(relative).join(name.stem()));
    let output = config
        .output_dir
        .join(relative)
        .join(name.output_name(config.output_extension.as_deref()));
    let dir = template.parent().unwrap_or_else(|| Path::new(""));

    let (body, shared, content, partials) = tokio::join!(
        ctx.storage.read(template),
        ctx.content.shared(),
        async {
            match &content_path {
                Some(path) => ctx.content.fetch_content(path).await,
                None => Ok(Content::new()),
            }
        },
        ctx.partials.fetch_partials(dir),
    );

    let body = String::from_utf8(body.map_err(ItemError::ReadTemplate)?)?;
    let mut merged = Content::clone(&*shared?);
    merged.extend(content?);

    let rendered = renderer.render(&RenderInput {
        template: &body,
        content: &merged,
        partials: &partials,
    })?;

    ctx.storage
        .write(&output, rendered.as_bytes())
        .await
        .map_err(ItemError::Write)?;
    Ok(output)
}
