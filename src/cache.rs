//! Incremental build cache.
//!
//! One record per source file, stored one per line as
//! `path hash timestamp fileModTime publishDate`. The publish date is free
//! text and always last on the line.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use sha2::{Digest as _, Sha256};

use crate::metadata;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedMetadata {
    pub content_hash: u64,
    pub publish_date: String,
    pub timestamp: i64,
    pub file_mod_time: i64,
}

impl CachedMetadata {
    /// Record for a plain page, which only tracks the source modification time.
    pub fn page(file_mod_time: i64) -> Self {
        Self {
            file_mod_time,
            ..Self::default()
        }
    }
}

pub type CacheMap = BTreeMap<String, CachedMetadata>;

/// Fingerprint of a source document rendered with a given template.
pub fn content_hash(source: &str, template_hash: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(template_hash.as_bytes());
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

pub fn cache_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Reads a cache file. A missing or unreadable file is an empty cache.
pub fn load_cache(path: &Path) -> CacheMap {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return CacheMap::new(),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "ignore unreadable build cache");
            return CacheMap::new();
        }
    };
    parse_cache(&text)
}

pub fn parse_cache(text: &str) -> CacheMap {
    let mut cache = CacheMap::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some((key, record)) => {
                cache.insert(key, record);
            }
            None => tracing::warn!(line = idx + 1, "skip malformed build cache line"),
        }
    }
    cache
}

fn parse_line(line: &str) -> Option<(String, CachedMetadata)> {
    let (path, rest) = next_token(line)?;
    let (hash, rest) = next_token(rest)?;
    let (timestamp, rest) = next_token(rest)?;
    let (file_mod_time, rest) = next_token(rest)?;
    let publish_date = rest.strip_prefix(' ').unwrap_or(rest);

    Some((
        path.to_owned(),
        CachedMetadata {
            content_hash: hash.parse().ok()?,
            publish_date: publish_date.to_owned(),
            timestamp: timestamp.parse().ok()?,
            file_mod_time: file_mod_time.parse().ok()?,
        },
    ))
}

fn next_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    let end = input
        .find(char::is_whitespace)
        .unwrap_or(input.len());
    Some((&input[..end], &input[end..]))
}

pub fn render_cache(cache: &CacheMap) -> String {
    let mut out = String::new();
    for (path, record) in cache {
        out.push_str(&format!(
            "{path} {} {} {} {}\n",
            record.content_hash, record.timestamp, record.file_mod_time, record.publish_date
        ));
    }
    out
}

/// Overwrites `path` with every record in key order.
pub fn save_cache(path: &Path, cache: &CacheMap) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create cache directory: {}", parent.display()))?;
    }
    std::fs::write(path, render_cache(cache))
        .with_context(|| format!("write build cache: {}", path.display()))
}

/// Plain pages are rebuilt when the output is missing, the source is unknown
/// or its modification time moved.
pub fn needs_page_regeneration(source: &Path, output: &Path, cache: &CacheMap) -> bool {
    if !output.exists() {
        return true;
    }
    let Some(record) = cache.get(&cache_key(source)) else {
        return true;
    };
    match metadata::mod_time(source) {
        Ok(mod_time) => mod_time != record.file_mod_time,
        Err(_) => true,
    }
}

/// Blog posts are rebuilt when the output is missing, the source is unknown
/// or the hash of its text plus the template changed.
pub fn needs_blog_regeneration(
    source: &Path,
    content: &str,
    output: &Path,
    template_hash: &str,
    cache: &CacheMap,
) -> bool {
    if !output.exists() {
        return true;
    }
    match cache.get(&cache_key(source)) {
        Some(record) => record.content_hash != content_hash(content, template_hash),
        None => true,
    }
}

/// Previous records plus the records for the build in progress.
///
/// Only files recorded or carried forward during this build end up in the
/// flushed cache, so entries for deleted sources disappear.
#[derive(Debug)]
pub struct BuildCache {
    path: PathBuf,
    previous: CacheMap,
    next: CacheMap,
}

impl BuildCache {
    pub fn load(path: &Path) -> Self {
        let previous = load_cache(path);
        tracing::debug!(path = %path.display(), entries = previous.len(), "loaded build cache");
        Self {
            path: path.to_path_buf(),
            previous,
            next: CacheMap::new(),
        }
    }

    pub fn previous(&self, source: &Path) -> Option<&CachedMetadata> {
        self.previous.get(&cache_key(source))
    }

    pub fn recorded(&self, source: &Path) -> Option<&CachedMetadata> {
        self.next.get(&cache_key(source))
    }

    pub fn needs_page_regeneration(&self, source: &Path, output: &Path) -> bool {
        needs_page_regeneration(source, output, &self.previous)
    }

    pub fn needs_blog_regeneration(
        &self,
        source: &Path,
        content: &str,
        output: &Path,
        template_hash: &str,
    ) -> bool {
        needs_blog_regeneration(source, content, output, template_hash, &self.previous)
    }

    /// Keeps the previous record for a file that was skipped.
    pub fn carry_forward(&mut self, source: &Path) {
        let key = cache_key(source);
        if let Some(record) = self.previous.get(&key) {
            self.next.insert(key, record.clone());
        }
    }

    pub fn record(&mut self, source: &Path, record: CachedMetadata) {
        self.next.insert(cache_key(source), record);
    }

    pub fn entries(&self) -> &CacheMap {
        &self.next
    }

    pub fn flush(&self) -> anyhow::Result<()> {
        save_cache(&self.path, &self.next)?;
        tracing::debug!(path = %self.path.display(), entries = self.next.len(), "saved build cache");
        Ok(())
    }
}
