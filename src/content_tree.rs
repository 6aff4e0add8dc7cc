//! Hierarchical view of a content directory.
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. The
//! root is always the first node. Parent links are plain indices used for
//! upward lookups only.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::document::DocumentKind;
use crate::metadata;

const IMAGES_DIR_NAME: &str = "images";
const INDEX_FILE_NAME: &str = "index.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File(DocumentKind),
    Directory { has_index_file: bool },
}

#[derive(Debug, Clone)]
pub struct ContentNode {
    /// Raw filesystem entry name.
    pub name: String,
    pub display_name: String,
    /// Source path on disk.
    pub path: PathBuf,
    /// `/`-joined path of the generated page, relative to the output root.
    pub output_path: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub title: String,
    pub excerpt: String,
    pub publish_date: String,
    pub timestamp: i64,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl ContentNode {
    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File(_))
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn document_kind(&self) -> Option<DocumentKind> {
        match self.kind {
            NodeKind::File(kind) => Some(kind),
            NodeKind::Directory { .. } => None,
        }
    }

    pub fn has_index_file(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Directory {
                has_index_file: true
            }
        )
    }

    /// Source file name without its extension.
    pub fn stem(&self) -> &str {
        strip_extension(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct ContentTree {
    nodes: Vec<ContentNode>,
}

impl ContentTree {
    /// Scans `root` recursively.
    ///
    /// Returns `Ok(None)` when `root` does not exist or is not a directory or
    /// content file. A directory that cannot be listed fails the whole scan.
    pub fn build(root: &Path) -> anyhow::Result<Option<ContentTree>> {
        if !root.exists() {
            return Ok(None);
        }

        let mut tree = ContentTree { nodes: Vec::new() };
        let built = tree.add_entry(root, None)?;
        Ok(built.map(|_| tree))
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> &ContentNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All file nodes under `id` in depth-first, tree order.
    pub fn file_nodes(&self, id: NodeId) -> Vec<NodeId> {
        let mut files = Vec::new();
        self.collect_files(id, &mut files);
        files
    }

    fn collect_files(&self, id: NodeId, files: &mut Vec<NodeId>) {
        let node = self.node(id);
        if node.is_file() {
            files.push(id);
            return;
        }
        for &child in &node.children {
            self.collect_files(child, files);
        }
    }

    /// Directory nodes strictly below `id`, depth-first.
    pub fn directories(&self, id: NodeId) -> Vec<NodeId> {
        let mut dirs = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if self.node(next).is_directory() {
                dirs.push(next);
                stack.extend(self.children(next).iter().rev().copied());
            }
        }
        dirs
    }

    /// Indented `[DIR]`/`[FILE]` listing of the tree.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(self.root(), 0, &mut out);
        out
    }

    fn write_outline(&self, id: NodeId, indent: usize, out: &mut String) {
        let node = self.node(id);
        let pad = "  ".repeat(indent);
        match node.kind {
            NodeKind::Directory { has_index_file } => {
                let _ = write!(out, "{pad}[DIR] {}", node.name);
                if has_index_file {
                    out.push_str(" (has index.md)");
                }
            }
            NodeKind::File(_) => {
                let _ = write!(out, "{pad}[FILE] {}", node.name);
                if !node.title.is_empty() {
                    let _ = write!(out, " - \"{}\"", node.title);
                }
            }
        }
        out.push('\n');
        for &child in &node.children {
            self.write_outline(child, indent + 1, out);
        }
    }

    fn add_entry(&mut self, path: &Path, parent: Option<NodeId>) -> anyhow::Result<Option<NodeId>> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("stat content entry: {}", path.display()))?;
        let name = entry_name(path);
        let depth = parent.map_or(0, |id| self.node(id).depth + 1);

        if meta.is_dir() {
            let output_path = self.output_path_for(parent, &name);
            let id = self.push(ContentNode {
                display_name: format_display_name(&name),
                output_path,
                kind: NodeKind::Directory {
                    has_index_file: path.join(INDEX_FILE_NAME).is_file(),
                },
                name,
                path: path.to_path_buf(),
                depth,
                title: String::new(),
                excerpt: String::new(),
                publish_date: String::new(),
                timestamp: 0,
                parent,
                children: Vec::new(),
            });

            for entry in list_entries(path)? {
                if let Some(child) = self.add_entry(&entry, Some(id))? {
                    self.nodes[id.0].children.push(child);
                }
            }
            return Ok(Some(id));
        }

        if !meta.is_file() {
            return Ok(None);
        }
        let Some(kind) = DocumentKind::from_path(path) else {
            return Ok(None);
        };

        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "skip unreadable content file");
                return Ok(None);
            }
        };

        let (title, excerpt, publish_date, timestamp) = if source.is_empty() {
            (String::new(), String::new(), String::new(), 0)
        } else {
            let summary = kind.describe(&source, path);
            let (publish_date, timestamp) = file_dates(path);
            (summary.title, summary.excerpt, publish_date, timestamp)
        };

        let output_path =
            self.output_path_for(parent, &format!("{}.html", strip_extension(&name)));
        let display_name = if title.is_empty() {
            format_display_name(&name)
        } else {
            title.clone()
        };

        Ok(Some(self.push(ContentNode {
            name,
            display_name,
            path: path.to_path_buf(),
            output_path,
            kind: NodeKind::File(kind),
            depth,
            title,
            excerpt,
            publish_date,
            timestamp,
            parent,
            children: Vec::new(),
        })))
    }

    fn push(&mut self, node: ContentNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn output_path_for(&self, parent: Option<NodeId>, segment: &str) -> String {
        match parent {
            Some(id) => format!("{}/{segment}", self.node(id).output_path),
            None => segment.to_owned(),
        }
    }
}

/// Humanizes a file or folder name: drops the extension, turns `-` and `_`
/// into spaces and upper-cases the first letter of every word.
pub fn format_display_name(name: &str) -> String {
    let base = strip_extension(name);

    let mut display = String::with_capacity(base.len());
    let mut capitalize = true;
    for c in base.chars() {
        let c = if c == '-' || c == '_' { ' ' } else { c };
        if c == ' ' {
            capitalize = true;
            display.push(c);
        } else if capitalize && c.is_alphabetic() {
            display.extend(c.to_uppercase());
            capitalize = false;
        } else {
            display.push(c);
        }
    }
    display.trim().to_owned()
}

fn strip_extension(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn list_entries(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read directory: {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("read directory entry: {}", dir.display()))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name == IMAGES_DIR_NAME {
            continue;
        }
        entries.push(entry.path());
    }
    entries.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    Ok(entries)
}

fn file_dates(path: &Path) -> (String, i64) {
    match (metadata::mod_date(path), metadata::mod_time(path)) {
        (Ok(date), Ok(time)) => (date, time),
        (Err(err), _) | (_, Err(err)) => {
            tracing::warn!(path = %path.display(), "{err:#}");
            (String::new(), 0)
        }
    }
}
