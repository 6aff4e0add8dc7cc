use crate::cache::BuildCache;
use crate::content_tree::{ContentTree, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogPost {
    pub title: String,
    pub excerpt: String,
    /// Page path relative to the output root, also used as the link target.
    pub output_path: String,
    pub publish_date: String,
    pub timestamp: i64,
    /// Name of the enclosing folder, empty for posts at the blog root.
    pub category: String,
}

/// Projects the files under `section` that this build recorded to posts,
/// newest first. Sources the build ignored (empty or unreadable) have no
/// record and are left out.
///
/// Dates come from that record when it has one, so a post keeps the date it
/// was first published.
pub fn collect_posts(tree: &ContentTree, section: NodeId, cache: &BuildCache) -> Vec<BlogPost> {
    let mut posts: Vec<BlogPost> = tree
        .file_nodes(section)
        .into_iter()
        .filter_map(|id| {
            let node = tree.node(id);
            let record = cache.recorded(&node.path)?;
            let (publish_date, timestamp) = if record.publish_date.is_empty() {
                (node.publish_date.clone(), node.timestamp)
            } else {
                (record.publish_date.clone(), record.timestamp)
            };
            Some(BlogPost {
                title: node.title.clone(),
                excerpt: node.excerpt.clone(),
                output_path: node.output_path.clone(),
                publish_date,
                timestamp,
                category: category_of(tree, id),
            })
        })
        .collect();

    sort_newest_first(&mut posts);
    posts
}

pub fn sort_newest_first(posts: &mut [BlogPost]) {
    posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

fn category_of(tree: &ContentTree, id: NodeId) -> String {
    match tree.parent(id) {
        Some(parent) if parent != tree.root() => tree.node(parent).name.clone(),
        _ => String::new(),
    }
}
