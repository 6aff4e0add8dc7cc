//! Paginated post listings.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::CategoryConfig;
use crate::content_tree::format_display_name;
use crate::markdown::escape_html;
use crate::posts::BlogPost;

pub const BLOG_LISTING_BASE: &str = "blogs";

/// Page-independent parts of a listing.
#[derive(Debug, Clone, Copy)]
pub struct ListingContext<'a> {
    /// Rendered category sidebar.
    pub sidebar: &'a str,
    /// Title and description overrides keyed by category folder name.
    pub categories: &'a BTreeMap<String, CategoryConfig>,
}

pub fn category_title(category: &str, overrides: &BTreeMap<String, CategoryConfig>) -> String {
    if category.is_empty() {
        return "All Posts".to_owned();
    }
    overrides
        .get(category)
        .and_then(|config| config.title.clone())
        .unwrap_or_else(|| format_display_name(category))
}

pub fn category_description(
    category: &str,
    overrides: &BTreeMap<String, CategoryConfig>,
) -> String {
    if category.is_empty() {
        return "All my blog posts".to_owned();
    }
    overrides
        .get(category)
        .and_then(|config| config.description.clone())
        .unwrap_or_else(|| format!("Posts in the {} category", format_display_name(category)))
}

pub fn page_count(total: usize, per_page: usize) -> usize {
    total.div_ceil(per_page.max(1))
}

/// File name of page `page` (1-based) of the listing named `base`.
pub fn page_file_name(base: &str, page: usize) -> String {
    if page <= 1 {
        format!("{base}.html")
    } else {
        format!("{base}-{page}.html")
    }
}

/// Renders page `page` of `posts`.
///
/// `category` is empty for the listing of every post. The filter list shows
/// the distinct categories of `posts`, so callers decide its scope by what
/// they pass in.
pub fn generate_blog_listing_html(
    posts: &[BlogPost],
    page: usize,
    per_page: usize,
    category: &str,
    search_json: &str,
    ctx: &ListingContext<'_>,
) -> String {
    let per_page = per_page.max(1);
    let total_pages = page_count(posts.len(), per_page);
    let start = page.saturating_sub(1).saturating_mul(per_page).min(posts.len());
    let end = (start + per_page).min(posts.len());

    let mut html = String::new();
    html.push_str("<div class=\"blog-container\">\n");
    html.push_str(ctx.sidebar);

    html.push_str("    <div class=\"blog-content\">\n");
    html.push_str(&format!(
        "        <h1>{}</h1>\n",
        escape_html(&category_title(category, ctx.categories))
    ));
    html.push_str(&format!(
        "        <p>{}</p>\n\n",
        escape_html(&category_description(category, ctx.categories))
    ));
    html.push_str("        <div class=\"blog-list\" id=\"search-results\">\n");
    for post in &posts[start..end] {
        render_post(post, category, &mut html);
    }
    html.push_str("        </div>\n");

    if total_pages > 1 {
        let base = if category.is_empty() {
            BLOG_LISTING_BASE
        } else {
            category
        };
        render_pagination(base, page, total_pages, &mut html);
    }
    html.push_str("    </div>\n");

    render_search_sidebar(posts, &mut html);
    html.push_str("</div>\n");

    if !search_json.is_empty() {
        html.push_str("<script>\n");
        html.push_str("// Embedded blog data to avoid CORS issues\n");
        html.push_str(&format!(
            "window.BLOG_DATA = {};\n",
            search_json.replace("</", "<\\/")
        ));
        html.push_str("</script>\n");
    }
    html.push_str("<script src=\"search.js\"></script>\n");
    html
}

fn render_post(post: &BlogPost, category: &str, html: &mut String) {
    html.push_str("            <article class=\"blog-item\">\n");

    let badge = if category.is_empty() {
        capitalize_first(&post.category)
    } else {
        post.output_path
            .split('/')
            .nth(2)
            .filter(|_| post.output_path.split('/').count() > 3)
            .map(format_display_name)
            .unwrap_or_default()
    };
    if !badge.is_empty() {
        html.push_str(&format!(
            "                <span class=\"category-badge\">{}</span>\n",
            escape_html(&badge)
        ));
    }

    let href = escape_html(&post.output_path);
    html.push_str(&format!(
        "                <h2><a href=\"{href}\">{}</a></h2>\n",
        escape_html(&post.title)
    ));
    html.push_str(&format!(
        "                <p class=\"blog-date\">Published on {}</p>\n",
        escape_html(&post.publish_date)
    ));
    if !post.excerpt.is_empty() {
        html.push_str(&format!(
            "                <p class=\"blog-excerpt\">{}</p>\n",
            escape_html(&post.excerpt)
        ));
    }
    html.push_str(&format!(
        "                <a href=\"{href}\" class=\"read-more\">Read more →</a>\n"
    ));
    html.push_str("            </article>\n");
}

fn render_pagination(base: &str, page: usize, total_pages: usize, html: &mut String) {
    html.push_str("\n<nav class=\"pagination\">\n");

    if page > 1 {
        html.push_str(&format!(
            "    <a href=\"{}\" class=\"pagination-btn\">&larr; Previous</a>\n",
            page_file_name(base, page - 1)
        ));
    } else {
        html.push_str("    <span class=\"pagination-btn disabled\">&larr; Previous</span>\n");
    }

    html.push_str("    <div class=\"pagination-numbers\">\n");
    for number in 1..=total_pages {
        if number == page {
            html.push_str(&format!(
                "        <span class=\"page-number active\">{number}</span>\n"
            ));
        } else {
            html.push_str(&format!(
                "        <a href=\"{}\" class=\"page-number\">{number}</a>\n",
                page_file_name(base, number)
            ));
        }
    }
    html.push_str("    </div>\n");

    if page < total_pages {
        html.push_str(&format!(
            "    <a href=\"{}\" class=\"pagination-btn\">Next &rarr;</a>\n",
            page_file_name(base, page + 1)
        ));
    } else {
        html.push_str("    <span class=\"pagination-btn disabled\">Next &rarr;</span>\n");
    }

    html.push_str("</nav>\n");
}

fn render_search_sidebar(posts: &[BlogPost], html: &mut String) {
    html.push_str("    <aside class=\"search-sidebar\">\n");
    html.push_str("        <div class=\"search-sidebar-sticky\">\n");
    html.push_str("            <h3>Search & Filter</h3>\n");
    html.push_str("            <input type=\"text\" id=\"blog-search\" placeholder=\"Search posts...\" aria-label=\"Search blogs\">\n");
    html.push_str("            \n");
    html.push_str("            <div class=\"search-filters\">\n");
    html.push_str("                <h4>Filter by Category</h4>\n");
    html.push_str("                <div class=\"category-filters\">\n");

    let categories: BTreeSet<&str> = posts
        .iter()
        .map(|post| post.category.as_str())
        .filter(|category| !category.is_empty())
        .collect();
    for category in categories {
        html.push_str(&format!(
            "                    <a href=\"#\" class=\"category-filter\" data-category=\"{}\">{}</a>\n",
            escape_html(category),
            escape_html(&format_display_name(category))
        ));
    }

    html.push_str("                </div>\n");
    html.push_str("            </div>\n");
    html.push_str("            \n");
    html.push_str("            <div class=\"sort-control\">\n");
    html.push_str("                <label for=\"blog-sort\">Sort by</label>\n");
    html.push_str("                <select id=\"blog-sort\">\n");
    html.push_str("                    <option value=\"date-desc\">Newest First</option>\n");
    html.push_str("                    <option value=\"date-asc\">Oldest First</option>\n");
    html.push_str("                    <option value=\"title-asc\">Title (A-Z)</option>\n");
    html.push_str("                    <option value=\"title-desc\">Title (Z-A)</option>\n");
    html.push_str("                </select>\n");
    html.push_str("            </div>\n");
    html.push_str("            \n");
    html.push_str("            <p id=\"result-count\" class=\"result-count\"></p>\n");
    html.push_str("        </div>\n");
    html.push_str("    </aside>\n");
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
