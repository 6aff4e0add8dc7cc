use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use mdsite::build::build_site;
use mdsite::cache::load_cache;
use mdsite::config::SiteConfig;
use mdsite::formats::SearchIndex;

const TEMPLATE: &str = "<!doctype html>\n<html>\n<head><title>{{TITLE}}</title><link rel=\"stylesheet\" href=\"{{CSS_PATH}}style.css\"></head>\n<body><nav>{{NAV}}</nav>{{TOC}}<main>{{CONTENT}}</main></body>\n</html>\n";

const PIXEL_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mP8/x8AAwMCAO+ip1sAAAAASUVORK5CYII=";

fn write(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

fn set_mtime(path: &Path, at: SystemTime) -> anyhow::Result<()> {
    fs::File::options().write(true).open(path)?.set_modified(at)?;
    Ok(())
}

fn fixture(root: &Path) -> anyhow::Result<SiteConfig> {
    write(&root.join("templates/template.html"), TEMPLATE)?;
    write(&root.join("templates/style.css"), "body { margin: 0; }\n")?;
    write(&root.join("templates/search.js"), "console.log('search');\n")?;
    write(&root.join("content/index.md"), "# Welcome\n\nHome page.\n")?;
    write(&root.join("content/about.md"), "# About\n\nWho I am.\n")?;
    write(&root.join("content/images/logo.png"), "png")?;
    write(&root.join("content/.git/HEAD"), "ref: refs/heads/main\n")?;
    write(
        &root.join("content/blog/hello.md"),
        "# Hello World\n\nA subtitle\n\nFirst post on the blog.\n\n## Details\n\nMore.\n",
    )?;
    write(
        &root.join("content/blog/tech/rust.md"),
        "# Learning Rust\n\nsubtitle\n\nOwnership and borrowing.\n",
    )?;
    write(
        &root.join("content/blog/tech/AI/agents.md"),
        "# Agents\n\nsubtitle\n\nTool-using models.\n",
    )?;
    write(&root.join("content/blog/tech/notes.txt"), "not a post")?;

    let notebook = serde_json::json!({
        "metadata": { "kernelspec": { "language": "python" } },
        "cells": [
            {
                "cell_type": "code",
                "execution_count": 1,
                "source": ["plot()"],
                "outputs": [
                    { "output_type": "display_data", "data": { "image/png": PIXEL_PNG_BASE64 } }
                ]
            },
            { "cell_type": "markdown", "source": ["# Plotting Notes\n", "text"] }
        ]
    });
    write(&root.join("content/blog/plots.ipynb"), &notebook.to_string())?;

    Ok(SiteConfig::default().rooted_at(root))
}

#[test]
fn full_build_writes_pages_posts_listings_and_index() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let config = fixture(temp.path())?;
    let docs = temp.path().join("docs");

    let summary = build_site(&config)?;
    assert_eq!(summary.pages.generated, 2);
    assert_eq!(summary.posts.generated, 4);
    assert_eq!(summary.post_count, 4);
    // blogs.html, tech.html, AI.html
    assert_eq!(summary.listing_pages, 3);

    let about = fs::read_to_string(docs.join("about.html"))?;
    assert!(about.contains("<title>About</title>"));
    assert!(about.contains("href=\"style.css\""));
    assert!(about.contains("<a href=\"blogs.html\">Blog</a>"));

    let agents = fs::read_to_string(docs.join("blog/tech/AI/agents.html"))?;
    assert!(agents.contains("<title>Agents</title>"));
    assert!(agents.contains("href=\"../../../style.css\""));
    assert!(agents.contains("<a href=\"../../../about.html\">About</a>"));

    let hello = fs::read_to_string(docs.join("blog/hello.html"))?;
    assert!(hello.contains("<nav class=\"toc\">"));
    assert!(hello.contains("<h2 id=\"details\">Details</h2>"));

    let plots = fs::read_to_string(docs.join("blog/plots.html"))?;
    assert!(plots.contains("<title>Plotting Notes</title>"));
    assert!(plots.contains("src=\"../images/notebooks/plots_cell1_out1.png\""));
    assert!(docs.join("images/notebooks/plots_cell1_out1.png").is_file());

    assert!(!docs.join("blog/tech/notes.html").exists());
    assert!(docs.join("style.css").is_file());
    assert!(docs.join("search.js").is_file());
    assert!(docs.join("images/logo.png").is_file());

    let blogs = fs::read_to_string(docs.join("blogs.html"))?;
    assert!(blogs.contains("<h1>All Posts</h1>"));
    assert!(blogs.contains("window.BLOG_DATA = "));
    assert!(blogs.contains("<a href=\"blog/tech/rust.html\">Learning Rust</a>"));
    let tech = fs::read_to_string(docs.join("tech.html"))?;
    assert!(tech.contains("<h1>Tech</h1>"));
    assert!(tech.contains("<span class=\"category-badge\">AI</span>"));
    assert!(!tech.contains("<a href=\"blog/hello.html\">"));
    assert!(docs.join("AI.html").is_file());

    let index: SearchIndex = serde_json::from_str(&fs::read_to_string(docs.join("blogs.json"))?)?;
    assert_eq!(index.blogs.len(), 4);
    assert!(index.blogs.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    let hello_entry = index
        .blogs
        .iter()
        .find(|entry| entry.title == "Hello World")
        .ok_or_else(|| anyhow::anyhow!("hello missing from index"))?;
    assert_eq!(hello_entry.category, "uncategorized");
    assert_eq!(hello_entry.url, "blog/hello.html");
    Ok(())
}

#[test]
fn second_build_skips_everything_and_keeps_cache_identical() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let config = fixture(temp.path())?;

    build_site(&config)?;
    let first_cache = fs::read_to_string(&config.cache_file)?;

    let summary = build_site(&config)?;
    assert_eq!(summary.pages.generated, 0);
    assert_eq!(summary.posts.generated, 0);
    assert_eq!(summary.pages.skipped, 2);
    assert_eq!(summary.posts.skipped, 4);
    assert_eq!(fs::read_to_string(&config.cache_file)?, first_cache);
    Ok(())
}

#[test]
fn touching_a_page_regenerates_it_but_not_posts() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let config = fixture(temp.path())?;
    build_site(&config)?;

    let yesterday = SystemTime::now() - Duration::from_secs(24 * 60 * 60);
    set_mtime(&temp.path().join("content/about.md"), yesterday)?;
    let post = temp.path().join("content/blog/hello.md");
    let before = load_cache(&config.cache_file);
    set_mtime(&post, yesterday)?;

    let summary = build_site(&config)?;
    assert_eq!(summary.pages.generated, 1);
    assert_eq!(summary.posts.generated, 0);

    let after = load_cache(&config.cache_file);
    let key = post.to_string_lossy().into_owned();
    assert_eq!(after[&key].publish_date, before[&key].publish_date);
    assert_eq!(after[&key].timestamp, before[&key].timestamp);
    Ok(())
}

#[test]
fn edited_post_is_regenerated_with_its_original_date() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let config = fixture(temp.path())?;
    let post = temp.path().join("content/blog/tech/rust.md");

    build_site(&config)?;
    let key = post.to_string_lossy().into_owned();
    let mut cache = load_cache(&config.cache_file);
    let record = cache
        .get_mut(&key)
        .ok_or_else(|| anyhow::anyhow!("rust.md not cached"))?;
    record.publish_date = "March 3, 2024 at 10:15 AM".to_owned();
    record.timestamp = 1_709_460_900;
    mdsite::cache::save_cache(&config.cache_file, &cache)?;

    write(&post, "# Learning Rust\n\nsubtitle\n\nLifetimes too.\n")?;
    let summary = build_site(&config)?;
    assert_eq!(summary.posts.generated, 1);

    let after = load_cache(&config.cache_file);
    assert_eq!(after[&key].publish_date, "March 3, 2024 at 10:15 AM");
    assert_eq!(after[&key].timestamp, 1_709_460_900);

    let page = fs::read_to_string(temp.path().join("docs/blog/tech/rust.html"))?;
    assert!(page.contains("Lifetimes too."));
    let blogs = fs::read_to_string(temp.path().join("docs/blogs.html"))?;
    assert!(blogs.contains("Published on March 3, 2024 at 10:15 AM"));
    Ok(())
}

#[test]
fn template_change_rebuilds_every_post_only() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let config = fixture(temp.path())?;
    build_site(&config)?;

    write(&config.template, &TEMPLATE.replace("<main>", "<main class=\"v2\">"))?;
    let summary = build_site(&config)?;
    assert_eq!(summary.posts.generated, 4);
    assert_eq!(summary.pages.generated, 0);

    let hello = fs::read_to_string(temp.path().join("docs/blog/hello.html"))?;
    assert!(hello.contains("<main class=\"v2\">"));
    Ok(())
}

#[test]
fn deleted_sources_drop_out_of_the_cache() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let config = fixture(temp.path())?;
    build_site(&config)?;

    let agents = temp.path().join("content/blog/tech/AI/agents.md");
    fs::remove_file(&agents)?;
    let summary = build_site(&config)?;
    assert_eq!(summary.post_count, 3);

    let cache = load_cache(&config.cache_file);
    assert!(!cache.contains_key(agents.to_string_lossy().as_ref()));
    assert_eq!(cache.len(), 5);
    Ok(())
}

#[test]
fn missing_template_or_content_root_is_fatal() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let config = fixture(temp.path())?;

    fs::remove_file(&config.template)?;
    let err = build_site(&config).err().ok_or_else(|| anyhow::anyhow!("expected failure"))?;
    assert!(format!("{err:#}").contains("read template"));
    assert!(!temp.path().join("docs").exists());

    write(&config.template, TEMPLATE)?;
    fs::remove_dir_all(temp.path().join("content"))?;
    let err = build_site(&config).err().ok_or_else(|| anyhow::anyhow!("expected failure"))?;
    assert!(format!("{err:#}").contains("content directory not found"));
    Ok(())
}

#[test]
fn empty_post_is_left_out_of_listings_and_index() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let config = fixture(temp.path())?;
    write(&temp.path().join("content/blog/tech/draft.md"), "")?;
    let docs = temp.path().join("docs");

    let summary = build_site(&config)?;
    assert_eq!(summary.post_count, 4);
    assert!(!docs.join("blog/tech/draft.html").exists());

    for listing in ["blogs.html", "tech.html"] {
        let html = fs::read_to_string(docs.join(listing))?;
        assert!(!html.contains("draft.html"), "{listing} links the empty draft");
    }
    let index: SearchIndex = serde_json::from_str(&fs::read_to_string(docs.join("blogs.json"))?)?;
    assert_eq!(index.blogs.len(), 4);
    assert!(index.blogs.iter().all(|entry| !entry.title.is_empty()));
    Ok(())
}

#[test]
fn navigation_only_links_generated_pages() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let config = fixture(temp.path())?;
    write(&temp.path().join("content/projects/index.md"), "# Projects\n")?;
    write(&temp.path().join("content/notes/one.md"), "# One\n")?;
    write(&temp.path().join("content/empty.md"), "")?;
    let docs = temp.path().join("docs");

    build_site(&config)?;
    let about = fs::read_to_string(docs.join("about.html"))?;
    assert!(about.contains(
        "<nav><a href=\"about.html\">About</a><a href=\"blogs.html\">Blog</a><a href=\"index.html\">Welcome</a></nav>"
    ));
    assert!(!docs.join("projects/index.html").exists());
    assert!(!docs.join("notes.html").exists());
    assert!(!docs.join("empty.html").exists());
    Ok(())
}

#[test]
fn category_listing_never_replaces_a_page() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let config = fixture(temp.path())?;
    write(&temp.path().join("content/blog/about/x.md"), "# X\n\nsub\n\nBody.\n")?;
    write(&temp.path().join("content/blog/misc/AI/y.md"), "# Y\n\nsub\n\nBody.\n")?;

    let summary = build_site(&config)?;
    // blogs.html, blogs-2.html, misc.html, AI.html from misc/AI, tech.html
    assert_eq!(summary.listing_pages, 5);
    let ai = fs::read_to_string(temp.path().join("docs/AI.html"))?;
    assert!(ai.contains("<a href=\"blog/misc/AI/y.html\">"));
    assert!(!ai.contains("<a href=\"blog/tech/AI/agents.html\">"));

    let about = fs::read_to_string(temp.path().join("docs/about.html"))?;
    assert!(about.contains("<title>About</title>"));
    assert!(!about.contains("window.BLOG_DATA"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn unreadable_blog_folder_fails_the_build() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt as _;

    let temp = tempfile::TempDir::new()?;
    let config = fixture(temp.path())?;
    let locked = temp.path().join("content/blog/tech");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

    // Privileged users can still list the folder.
    let result = if fs::read_dir(&locked).is_ok() {
        None
    } else {
        Some(build_site(&config))
    };
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;

    if let Some(result) = result {
        let err = result.err().ok_or_else(|| anyhow::anyhow!("expected failure"))?;
        assert!(format!("{err:#}").contains("read directory"));
    }
    Ok(())
}
