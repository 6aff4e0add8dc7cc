use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context as _;

use crate::cache::BuildCache;
use crate::cli::{BuildArgs, TreeArgs};
use crate::config::SiteConfig;
use crate::content_tree::ContentTree;
use crate::document::DocumentKind;
use crate::listing::{
    BLOG_LISTING_BASE, ListingContext, category_title, generate_blog_listing_html, page_count,
    page_file_name,
};
use crate::navigation::{NavigationItem, render_navigation, site_navigation};
use crate::posts::{BlogPost, collect_posts};
use crate::processor::{ProcessContext, ProcessStats, process_pages, process_tree};
use crate::search_index::write_search_index;
use crate::sidebar::generate_sidebar;
use crate::template::{PageTemplate, PageVars};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub pages: ProcessStats,
    pub posts: ProcessStats,
    pub post_count: usize,
    pub listing_pages: usize,
}

pub fn run(args: BuildArgs) -> anyhow::Result<()> {
    let config = SiteConfig::resolve(&args)?;
    tracing::debug!(?config, "resolved site config");

    let summary = build_site(&config)?;
    tracing::info!(
        pages_generated = summary.pages.generated,
        pages_skipped = summary.pages.skipped,
        posts_generated = summary.posts.generated,
        posts_skipped = summary.posts.skipped,
        posts = summary.post_count,
        listing_pages = summary.listing_pages,
        "site generation complete"
    );
    let skipped = summary.pages.skipped + summary.posts.skipped;
    if skipped > 0 {
        tracing::info!(skipped, "incremental build skipped up-to-date files");
    }
    Ok(())
}

/// Prints the outline of a content directory.
pub fn tree(args: TreeArgs) -> anyhow::Result<()> {
    let dir = Path::new(&args.dir);
    let tree = ContentTree::build(dir)?
        .with_context(|| format!("content directory not found: {}", dir.display()))?;
    print!("{}", tree.outline());
    Ok(())
}

/// Runs one full build: pages, blog posts, search index and listings.
pub fn build_site(config: &SiteConfig) -> anyhow::Result<BuildSummary> {
    let template = PageTemplate::load(&config.template)?;

    let content = ContentTree::build(&config.content_dir)?.with_context(|| {
        format!(
            "content directory not found: {}",
            config.content_dir.display()
        )
    })?;

    let output_dir = &config.output_dir;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("create output dir: {}", output_dir.display()))?;

    tracing::info!("build: assets");
    crate::assets::copy_static_assets(config);

    let mut cache = BuildCache::load(&config.cache_file);
    let blog_dir_name = config.blog_dir_name();
    let navigation = site_navigation(&content, &blog_dir_name);
    let ctx = ProcessContext {
        output_dir,
        template: &template,
        navigation: &navigation,
    };

    tracing::info!("build: pages");
    let pages = process_pages(&content, &ctx, &mut cache).context("process pages")?;

    let mut summary = BuildSummary {
        pages,
        ..BuildSummary::default()
    };

    match ContentTree::build(&config.blog_dir)? {
        Some(blog) => {
            tracing::info!("build: blog posts");
            summary.posts =
                process_tree(&blog, blog.root(), &ctx, &mut cache).context("process blog")?;

            let posts = collect_posts(&blog, blog.root(), &cache);
            summary.post_count = posts.len();

            tracing::info!("build: search index");
            let search_json = write_search_index(output_dir, &posts)?;

            tracing::info!("build: listings");
            let listings = Listings {
                tree: &blog,
                page_files: page_file_names(&content),
                config,
                template: &template,
                navigation: &navigation,
                search_json: &search_json,
            };
            summary.listing_pages = listings.write_all(&posts, &cache)?;
        }
        None => {
            tracing::warn!(path = %config.blog_dir.display(), "blog directory not found");
        }
    }

    cache.flush()?;
    Ok(summary)
}

/// Output file names of the pages rendered from the content root.
fn page_file_names(content: &ContentTree) -> BTreeSet<String> {
    content
        .children(content.root())
        .iter()
        .map(|&id| content.node(id))
        .filter(|node| node.document_kind() == Some(DocumentKind::Markdown))
        .filter(|node| !node.title.is_empty())
        .map(|node| format!("{}.html", node.stem()))
        .collect()
}

struct Listings<'a> {
    tree: &'a ContentTree,
    /// Page file names a folder listing must not overwrite.
    page_files: BTreeSet<String>,
    config: &'a SiteConfig,
    template: &'a PageTemplate,
    navigation: &'a [NavigationItem],
    search_json: &'a str,
}

impl Listings<'_> {
    /// Writes the listing of every post, then one listing per folder that
    /// holds posts anywhere below it.
    ///
    /// A folder listing whose file name is already taken, by a page or by an
    /// earlier folder of the same name, is skipped with a warning.
    fn write_all(&self, all_posts: &[BlogPost], cache: &BuildCache) -> anyhow::Result<usize> {
        let root = self.tree.root();
        let mut taken = self.page_files.clone();

        let main_listing = page_file_name(BLOG_LISTING_BASE, 1);
        if !taken.insert(main_listing.clone()) {
            tracing::warn!(listing = %main_listing, "blog listing overwrites a page of the same name");
        }
        let mut written = self.write_listing(BLOG_LISTING_BASE, "", all_posts)?;

        for dir in self.tree.directories(root) {
            let posts = collect_posts(self.tree, dir, cache);
            if posts.is_empty() {
                continue;
            }
            let node = self.tree.node(dir);
            let listing = page_file_name(&node.name, 1);
            if !taken.insert(listing.clone()) {
                tracing::warn!(
                    folder = %node.path.display(),
                    %listing,
                    "listing name already taken, skipping category listing"
                );
                continue;
            }
            written += self.write_listing(&node.name, &node.name, &posts)?;
        }

        Ok(written)
    }

    fn write_listing(&self, base: &str, category: &str, posts: &[BlogPost]) -> anyhow::Result<usize> {
        let per_page = self.config.posts_per_page;
        let sidebar = generate_sidebar(self.tree, self.tree.root(), category);
        let ctx = ListingContext {
            sidebar: &sidebar,
            categories: &self.config.categories,
        };
        let title = category_title(category, &self.config.categories);
        let nav = render_navigation(self.navigation, 0);

        let pages = page_count(posts.len(), per_page);
        for page in 1..=pages {
            let html =
                generate_blog_listing_html(posts, page, per_page, category, self.search_json, &ctx);
            let rendered = self.template.apply(&PageVars {
                title: &title,
                content: &html,
                toc: "",
                nav: &nav,
                depth: 0,
            });
            let path = self.config.output_dir.join(page_file_name(base, page));
            std::fs::write(&path, rendered)
                .with_context(|| format!("write listing page: {}", path.display()))?;
            tracing::info!(path = %path.display(), "generated listing page");
        }

        Ok(pages)
    }
}
