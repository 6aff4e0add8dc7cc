use crate::content_tree::{ContentTree, NodeKind};
use crate::document::DocumentKind;
use crate::markdown::escape_html;

pub const BLOG_LISTING_PAGE: &str = "blogs.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationItem {
    pub display_name: String,
    /// Link target relative to the output root.
    pub url: String,
}

/// One entry per immediate child of the tree root, ordered by display name.
///
/// Files link to their own page. Folders link to `name/index.html` when they
/// carry an `index.md` and to the generated `name.html` listing otherwise.
pub fn generate_navigation(tree: &ContentTree) -> Vec<NavigationItem> {
    let mut items: Vec<NavigationItem> = tree
        .children(tree.root())
        .iter()
        .map(|&id| {
            let child = tree.node(id);
            let url = match child.kind {
                NodeKind::File(_) => child.output_path.clone(),
                NodeKind::Directory {
                    has_index_file: true,
                } => format!("{}/index.html", child.name),
                NodeKind::Directory {
                    has_index_file: false,
                } => format!("{}.html", child.name),
            };
            NavigationItem {
                display_name: child.display_name.clone(),
                url,
            }
        })
        .collect();

    items.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    items
}

/// Navigation for generated pages.
///
/// Only targets the build writes get a link: non-empty Markdown pages in the
/// content root, which land straight under the output root, and the blog
/// folder, which points at the blog listing. An empty source has no title.
pub fn site_navigation(tree: &ContentTree, blog_dir_name: &str) -> Vec<NavigationItem> {
    let mut items: Vec<NavigationItem> = tree
        .children(tree.root())
        .iter()
        .filter_map(|&id| {
            let child = tree.node(id);
            let url = match child.kind {
                NodeKind::File(DocumentKind::Markdown) if !child.title.is_empty() => {
                    format!("{}.html", child.stem())
                }
                NodeKind::Directory { .. } if child.name == blog_dir_name => {
                    BLOG_LISTING_PAGE.to_owned()
                }
                _ => return None,
            };
            Some(NavigationItem {
                display_name: child.display_name.clone(),
                url,
            })
        })
        .collect();

    items.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    items
}

/// Anchor tags for `items`, with each URL climbing `depth` directories.
pub fn render_navigation(items: &[NavigationItem], depth: usize) -> String {
    let prefix = "../".repeat(depth);
    items
        .iter()
        .map(|item| {
            format!(
                "<a href=\"{prefix}{}\">{}</a>",
                item.url,
                escape_html(&item.display_name)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn write(path: &Path, contents: &str) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn sample_tree(root: &Path) -> anyhow::Result<ContentTree> {
        write(&root.join("about.md"), "# About Me\n")?;
        write(&root.join("blog/tech/post.md"), "# Post\n")?;
        write(&root.join("projects/index.md"), "# Projects\n")?;
        write(&root.join("_drafts/wip.md"), "# WIP\n")?;
        ContentTree::build(root)?.ok_or_else(|| anyhow::anyhow!("no tree"))
    }

    #[test]
    fn items_follow_tree_rules_and_sort_by_display_name() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let tree = sample_tree(&temp.path().join("content"))?;

        let items = generate_navigation(&tree);
        let pairs: Vec<(&str, &str)> = items
            .iter()
            .map(|item| (item.display_name.as_str(), item.url.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("About Me", "content/about.html"),
                ("Blog", "blog.html"),
                ("Drafts", "_drafts.html"),
                ("Projects", "projects/index.html"),
            ]
        );
        Ok(())
    }

    #[test]
    fn site_navigation_links_only_generated_pages() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let root = temp.path().join("content");
        write(&root.join("empty.md"), "")?;
        write(&root.join("plots.ipynb"), "{}")?;
        let tree = sample_tree(&root)?;

        let items = site_navigation(&tree, "blog");
        let pairs: Vec<(&str, &str)> = items
            .iter()
            .map(|item| (item.display_name.as_str(), item.url.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("About Me", "about.html"), ("Blog", "blogs.html")]
        );
        Ok(())
    }

    #[test]
    fn render_prefixes_depth() {
        let items = vec![
            NavigationItem {
                display_name: "Blog".to_owned(),
                url: "blogs.html".to_owned(),
            },
            NavigationItem {
                display_name: "Q&A".to_owned(),
                url: "qa.html".to_owned(),
            },
        ];
        assert_eq!(
            render_navigation(&items, 2),
            "<a href=\"../../blogs.html\">Blog</a><a href=\"../../qa.html\">Q&amp;A</a>"
        );
        assert_eq!(
            render_navigation(&items[..1], 0),
            "<a href=\"blogs.html\">Blog</a>"
        );
    }
}
