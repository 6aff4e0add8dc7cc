use crate::content_tree::{ContentTree, NodeId};
use crate::markdown::escape_html;
use crate::navigation::BLOG_LISTING_PAGE;

/// Link to the listing of every post in `section`.
pub fn all_posts_url(tree: &ContentTree, section: NodeId) -> String {
    let name = &tree.node(section).name;
    if name == "blog" {
        BLOG_LISTING_PAGE.to_owned()
    } else {
        format!("{name}.html")
    }
}

/// Category menu for listing pages.
///
/// `current` is the category being listed, empty for the unfiltered listing.
/// A category is highlighted when its folder name occurs anywhere in
/// `current`, so `ai` is also active while `aiops` is listed.
pub fn generate_sidebar(tree: &ContentTree, section: NodeId, current: &str) -> String {
    let mut html = String::new();
    html.push_str("<aside class=\"blog-sidebar\">\n");
    html.push_str("    <nav class=\"sidebar-menu\">\n");
    html.push_str("        <h3>Categories</h3>\n");
    html.push_str("        <ul>\n");

    let all_posts = all_posts_url(tree, section);
    let all_active = current.is_empty() || current == all_posts;
    html.push_str(&format!(
        "            <li><a href=\"{all_posts}\"{}>All Posts</a></li>\n",
        active_class(all_active)
    ));

    for &child in tree.children(section) {
        if tree.node(child).is_directory() {
            render_category(tree, child, current, 1, &mut html);
        }
    }

    html.push_str("        </ul>\n");
    html.push_str("    </nav>\n");
    html.push_str("</aside>\n");
    html
}

fn render_category(tree: &ContentTree, id: NodeId, current: &str, nest: usize, html: &mut String) {
    let category = tree.node(id);
    let indent = " ".repeat(nest * 4);
    let active = current.contains(category.name.as_str());

    html.push_str(&format!("{indent}    <li class=\"category-item\">\n"));
    html.push_str(&format!(
        "{indent}        <a href=\"{}.html\"{}>{}</a>\n",
        category.name,
        active_class(active),
        escape_html(&category.display_name)
    ));

    let subcategories: Vec<NodeId> = tree
        .children(id)
        .iter()
        .copied()
        .filter(|&child| tree.node(child).is_directory())
        .collect();
    if !subcategories.is_empty() {
        html.push_str(&format!("{indent}        <ul class=\"subcategory-list\">\n"));
        for child in subcategories {
            render_category(tree, child, current, nest + 1, html);
        }
        html.push_str(&format!("{indent}        </ul>\n"));
    }

    html.push_str(&format!("{indent}    </li>\n"));
}

fn active_class(active: bool) -> &'static str {
    if active { " class=\"active\"" } else { "" }
}
