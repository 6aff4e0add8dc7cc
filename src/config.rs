//! Site configuration.
//!
//! Read from `site.yaml` in the working directory when present, or from the
//! file passed with `--config`. Every field has a default, and command-line
//! flags win over file values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::cli::BuildArgs;

pub const DEFAULT_CONFIG_FILE: &str = "site.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Plain pages and the navigation tree.
    pub content_dir: PathBuf,
    /// Root of the blog tree.
    pub blog_dir: PathBuf,
    pub output_dir: PathBuf,
    pub template: PathBuf,
    pub stylesheet: PathBuf,
    pub search_script: PathBuf,
    /// Static images copied to `<output>/images`.
    pub images_dir: PathBuf,
    pub cname: PathBuf,
    pub cache_file: PathBuf,
    pub posts_per_page: usize,
    /// Listing header overrides keyed by category folder name.
    pub categories: BTreeMap<String, CategoryConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            blog_dir: PathBuf::from("content/blog"),
            output_dir: PathBuf::from("docs"),
            template: PathBuf::from("templates/template.html"),
            stylesheet: PathBuf::from("templates/style.css"),
            search_script: PathBuf::from("templates/search.js"),
            images_dir: PathBuf::from("content/images"),
            cname: PathBuf::from("CNAME"),
            cache_file: PathBuf::from(".build_cache"),
            posts_per_page: 5,
            categories: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(text).context("parse site config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read site config: {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("load site config: {}", path.display()))
    }

    /// Configuration for a `build` invocation.
    pub fn resolve(args: &BuildArgs) -> anyhow::Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(Path::new(path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Some(content) = &args.content {
            config.content_dir = PathBuf::from(content);
            config.blog_dir = config.content_dir.join("blog");
            config.images_dir = config.content_dir.join("images");
        }
        if let Some(output) = &args.output {
            config.output_dir = PathBuf::from(output);
        }
        if let Some(template) = &args.template {
            config.template = PathBuf::from(template);
        }
        if let Some(cache_file) = &args.cache_file {
            config.cache_file = PathBuf::from(cache_file);
        }

        config.validate()?;
        Ok(config)
    }

    /// The same configuration with every relative path placed under `root`.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        for path in [
            &mut self.content_dir,
            &mut self.blog_dir,
            &mut self.output_dir,
            &mut self.template,
            &mut self.stylesheet,
            &mut self.search_script,
            &mut self.images_dir,
            &mut self.cname,
            &mut self.cache_file,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }

    /// Folder name of the blog root, which prefixes every post URL.
    pub fn blog_dir_name(&self) -> String {
        self.blog_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "blog".to_owned())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.posts_per_page == 0 {
            anyhow::bail!("posts_per_page must be at least 1");
        }
        Ok(())
    }
}
