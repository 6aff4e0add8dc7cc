use std::path::Path;

use anyhow::Context as _;
use sha2::{Digest as _, Sha256};

const PLACEHOLDERS: [&str; 5] = ["{{TITLE}}", "{{CONTENT}}", "{{TOC}}", "{{CSS_PATH}}", "{{NAV}}"];

/// Values substituted into a page template.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageVars<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub toc: &'a str,
    /// Rendered navigation links, already relative to the page.
    pub nav: &'a str,
    pub depth: usize,
}

#[derive(Debug, Clone)]
pub struct PageTemplate {
    source: String,
    hash: String,
}

impl PageTemplate {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("read template: {}", path.display()))?;
        if source.trim().is_empty() {
            anyhow::bail!("template is empty: {}", path.display());
        }
        Ok(Self::from_source(source))
    }

    pub fn from_source(source: String) -> Self {
        let hash = hex::encode(Sha256::digest(source.as_bytes()));
        Self { source, hash }
    }

    /// Hex SHA-256 of the template text. Folded into every post fingerprint.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Replaces every placeholder occurrence in one pass. Inserted values are
    /// never scanned again, so content containing `{{...}}` is left alone.
    pub fn apply(&self, vars: &PageVars<'_>) -> String {
        let css_path = "../".repeat(vars.depth);
        let mut out = String::with_capacity(self.source.len() + vars.content.len());
        let mut rest = self.source.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            match PLACEHOLDERS.iter().find(|token| tail.starts_with(**token)) {
                Some(token) => {
                    out.push_str(match *token {
                        "{{TITLE}}" => vars.title,
                        "{{CONTENT}}" => vars.content,
                        "{{TOC}}" => vars.toc,
                        "{{CSS_PATH}}" => css_path.as_str(),
                        _ => vars.nav,
                    });
                    rest = &tail[token.len()..];
                }
                None => {
                    out.push_str("{{");
                    rest = &tail[2..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}
