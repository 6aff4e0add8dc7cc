//! Renders content files to pages, skipping the ones that are up to date.

use std::path::Path;

use anyhow::Context as _;

use crate::assets::write_notebook_images;
use crate::cache::{BuildCache, CachedMetadata, content_hash};
use crate::content_tree::{ContentNode, ContentTree, NodeId};
use crate::document::{DocumentKind, RenderContext};
use crate::markdown::render_markdown;
use crate::metadata::{self, extract_title};
use crate::navigation::{NavigationItem, render_navigation};
use crate::template::{PageTemplate, PageVars};

/// Shared inputs for rendering pages.
#[derive(Debug, Clone, Copy)]
pub struct ProcessContext<'a> {
    pub output_dir: &'a Path,
    pub template: &'a PageTemplate,
    pub navigation: &'a [NavigationItem],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub generated: usize,
    pub skipped: usize,
}

impl ProcessStats {
    fn merge(&mut self, other: ProcessStats) {
        self.generated += other.generated;
        self.skipped += other.skipped;
    }
}

/// Walks the subtree under `id` and renders every file whose text or
/// template changed since the last build.
pub fn process_tree(
    tree: &ContentTree,
    id: NodeId,
    ctx: &ProcessContext<'_>,
    cache: &mut BuildCache,
) -> anyhow::Result<ProcessStats> {
    let node = tree.node(id);
    let mut stats = ProcessStats::default();

    match node.document_kind() {
        Some(kind) => match process_file(node, kind, ctx, cache)? {
            FileOutcome::Generated => stats.generated += 1,
            FileOutcome::UpToDate => stats.skipped += 1,
            FileOutcome::Ignored => {}
        },
        None => {
            for &child in tree.children(id) {
                stats.merge(process_tree(tree, child, ctx, cache)?);
            }
        }
    }

    Ok(stats)
}

enum FileOutcome {
    Generated,
    UpToDate,
    /// Unreadable or empty source. No page and no cache record.
    Ignored,
}

fn process_file(
    node: &ContentNode,
    kind: DocumentKind,
    ctx: &ProcessContext<'_>,
    cache: &mut BuildCache,
) -> anyhow::Result<FileOutcome> {
    let output = ctx.output_dir.join(&node.output_path);
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory: {}", parent.display()))?;
    }

    let source = match std::fs::read_to_string(&node.path) {
        Ok(source) => source,
        Err(err) => {
            tracing::warn!(path = %node.path.display(), %err, "skip unreadable source");
            return Ok(FileOutcome::Ignored);
        }
    };
    if source.is_empty() {
        return Ok(FileOutcome::Ignored);
    }

    let template_hash = ctx.template.hash();
    if !cache.needs_blog_regeneration(&node.path, &source, &output, template_hash) {
        tracing::info!(path = %node.output_path, "skipping (up to date)");
        cache.carry_forward(&node.path);
        return Ok(FileOutcome::UpToDate);
    }

    tracing::info!(path = %node.output_path, "processing");
    let depth = node.output_path.matches('/').count();
    let rendered = kind.render(
        &source,
        &RenderContext {
            asset_stem: node.stem(),
            depth,
        },
    );
    write_notebook_images(ctx.output_dir, &rendered.images);

    let nav = render_navigation(ctx.navigation, depth);
    let page = ctx.template.apply(&PageVars {
        title: &node.title,
        content: &rendered.html,
        toc: &rendered.toc,
        nav: &nav,
        depth,
    });
    std::fs::write(&output, page)
        .with_context(|| format!("write page: {}", output.display()))?;

    let (publish_date, timestamp) = match cache.previous(&node.path) {
        Some(previous) if !previous.publish_date.is_empty() => {
            (previous.publish_date.clone(), previous.timestamp)
        }
        _ => (node.publish_date.clone(), node.timestamp),
    };
    let file_mod_time = metadata::mod_time(&node.path).unwrap_or(node.timestamp);
    cache.record(
        &node.path,
        CachedMetadata {
            content_hash: content_hash(&source, template_hash),
            publish_date,
            timestamp,
            file_mod_time,
        },
    );

    Ok(FileOutcome::Generated)
}

/// Renders the Markdown files that sit directly in the content root to
/// `<output>/<stem>.html`. These pages are tracked by modification time.
pub fn process_pages(
    tree: &ContentTree,
    ctx: &ProcessContext<'_>,
    cache: &mut BuildCache,
) -> anyhow::Result<ProcessStats> {
    let mut stats = ProcessStats::default();
    let nav = render_navigation(ctx.navigation, 0);

    for &id in tree.children(tree.root()) {
        let node = tree.node(id);
        if node.document_kind() != Some(DocumentKind::Markdown) {
            continue;
        }

        let source = match std::fs::read_to_string(&node.path) {
            Ok(source) if !source.is_empty() => source,
            Ok(_) => continue,
            Err(err) => {
                tracing::warn!(path = %node.path.display(), %err, "skip unreadable page");
                continue;
            }
        };

        let file_name = format!("{}.html", node.stem());
        let output = ctx.output_dir.join(&file_name);
        if !cache.needs_page_regeneration(&node.path, &output) {
            tracing::info!(path = %file_name, "skipping (up to date)");
            cache.carry_forward(&node.path);
            stats.skipped += 1;
            continue;
        }

        tracing::info!(path = %file_name, "processing page");
        let title = extract_title(&source);
        let html = render_markdown(&source);
        let page = ctx.template.apply(&PageVars {
            title: &title,
            content: &html,
            toc: "",
            nav: &nav,
            depth: 0,
        });
        std::fs::write(&output, page)
            .with_context(|| format!("write page: {}", output.display()))?;

        let mod_time = metadata::mod_time(&node.path)?;
        cache.record(&node.path, CachedMetadata::page(mod_time));
        stats.generated += 1;
    }

    Ok(stats)
}
