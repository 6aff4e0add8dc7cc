use std::path::Path;

use crate::markdown::render_markdown;
use crate::metadata::{DEFAULT_EXCERPT_LENGTH, extract_excerpt, extract_title};
use crate::notebook::{self, NOTEBOOK_EXCERPT};
use crate::toc::generate_toc;

/// Source formats the site understands, decided once from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Markdown,
    Notebook,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub title: String,
    pub excerpt: String,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// File stem used to name extracted notebook images.
    pub asset_stem: &'a str,
    /// Number of directories between the page and the output root.
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct RenderedDocument {
    pub html: String,
    pub toc: String,
    pub images: Vec<ExtractedImage>,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "md" => Some(Self::Markdown),
            "ipynb" => Some(Self::Notebook),
            _ => None,
        }
    }

    pub fn describe(self, source: &str, path: &Path) -> DocumentSummary {
        match self {
            Self::Markdown => DocumentSummary {
                title: extract_title(source),
                excerpt: extract_excerpt(source, DEFAULT_EXCERPT_LENGTH),
            },
            Self::Notebook => DocumentSummary {
                title: notebook::title_or_stem(source, path),
                excerpt: NOTEBOOK_EXCERPT.to_owned(),
            },
        }
    }

    pub fn render(self, source: &str, ctx: &RenderContext<'_>) -> RenderedDocument {
        match self {
            Self::Markdown => RenderedDocument {
                html: render_markdown(source),
                toc: generate_toc(source),
                images: Vec::new(),
            },
            Self::Notebook => {
                let (html, images) = notebook::render_notebook(source, ctx);
                RenderedDocument {
                    html,
                    toc: String::new(),
                    images,
                }
            }
        }
    }
}
