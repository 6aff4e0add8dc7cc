use std::path::Path;

use anyhow::Context as _;

use crate::formats::{SearchEntry, SearchIndex};
use crate::posts::BlogPost;

pub const SEARCH_INDEX_FILE: &str = "blogs.json";
const UNCATEGORIZED: &str = "uncategorized";

pub fn build_search_index(posts: &[BlogPost]) -> SearchIndex {
    SearchIndex {
        blogs: posts
            .iter()
            .enumerate()
            .map(|(idx, post)| SearchEntry {
                id: idx + 1,
                title: post.title.clone(),
                excerpt: post.excerpt.clone(),
                category: if post.category.is_empty() {
                    UNCATEGORIZED.to_owned()
                } else {
                    post.category.clone()
                },
                publish_date: post.publish_date.clone(),
                url: post.output_path.clone(),
                timestamp: post.timestamp,
            })
            .collect(),
    }
}

/// Writes `blogs.json` under `output_dir` and returns the JSON text for
/// embedding in listing pages.
pub fn write_search_index(output_dir: &Path, posts: &[BlogPost]) -> anyhow::Result<String> {
    let index = build_search_index(posts);
    let json = serde_json::to_string_pretty(&index).context("serialize search index")?;
    let path = output_dir.join(SEARCH_INDEX_FILE);
    std::fs::write(&path, &json)
        .with_context(|| format!("write search index: {}", path.display()))?;
    tracing::info!(path = %path.display(), posts = index.blogs.len(), "wrote search index");
    Ok(json)
}
