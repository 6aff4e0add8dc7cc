use std::path::Path;

use anyhow::Context as _;
use chrono::{DateTime, Local, TimeZone as _};

pub const UNTITLED: &str = "Untitled";
pub const DEFAULT_EXCERPT_LENGTH: usize = 200;

const PUBLISH_DATE_FORMAT: &str = "%B %d, %Y at %I:%M %p";

/// Returns the text after `# ` on the first level-one heading line.
pub fn extract_title(markdown: &str) -> String {
    markdown
        .lines()
        .find_map(|line| line.strip_prefix("# ").filter(|rest| !rest.is_empty()))
        .map(str::to_owned)
        .unwrap_or_else(|| UNTITLED.to_owned())
}

/// Builds a plain-text excerpt from the first paragraph lines of a document.
///
/// Heading lines are dropped, and so is the first non-empty line that follows
/// a heading (treated as a subtitle). The remaining non-empty lines are joined
/// with single spaces until `max_length` characters have been collected.
/// Longer excerpts are cut back to the last space at or before `max_length`
/// and suffixed with `...`.
pub fn extract_excerpt(markdown: &str, max_length: usize) -> String {
    let mut excerpt = String::new();
    let mut seen_header = false;
    let mut skipped_subtitle = false;

    for line in markdown.lines() {
        if line.starts_with('#') {
            seen_header = true;
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if seen_header && !skipped_subtitle {
            skipped_subtitle = true;
            continue;
        }

        if !excerpt.is_empty() {
            excerpt.push(' ');
        }
        excerpt.push_str(line);

        if excerpt.chars().count() >= max_length {
            break;
        }
    }

    truncate_at_word(excerpt, max_length)
}

fn truncate_at_word(excerpt: String, max_length: usize) -> String {
    let Some((cut, _)) = excerpt.char_indices().nth(max_length) else {
        return excerpt;
    };

    let mut truncated = &excerpt[..cut];
    if let Some(last_space) = truncated.rfind(' ') {
        truncated = &truncated[..last_space];
    }
    format!("{truncated}...")
}

/// Last-write time of `path` in seconds since the Unix epoch.
pub fn mod_time(path: &Path) -> anyhow::Result<i64> {
    Ok(modified_at(path)?.timestamp())
}

/// Last-write time of `path` formatted for display in local time.
pub fn mod_date(path: &Path) -> anyhow::Result<String> {
    Ok(modified_at(path)?.format(PUBLISH_DATE_FORMAT).to_string())
}

/// Formats a Unix timestamp the same way as [`mod_date`].
pub fn format_publish_date(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(at) => at.format(PUBLISH_DATE_FORMAT).to_string(),
        None => String::new(),
    }
}

fn modified_at(path: &Path) -> anyhow::Result<DateTime<Local>> {
    let modified = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("stat modification time: {}", path.display()))?;
    Ok(modified.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_comes_from_first_h1() {
        assert_eq!(extract_title("# Hello World\nbody"), "Hello World");
        assert_eq!(extract_title("intro\n## Sub\n# Real Title\n# Other"), "Real Title");
    }

    #[test]
    fn title_defaults_to_untitled() {
        assert_eq!(extract_title("no heading here\n##Not one"), "Untitled");
        assert_eq!(extract_title("# "), "Untitled");
        assert_eq!(extract_title(""), "Untitled");
    }

    #[test]
    fn excerpt_skips_headers_and_subtitle() {
        let md = "# Title\n\n*A subtitle*\n\nFirst paragraph line.\nSecond line.\n";
        assert_eq!(
            extract_excerpt(md, DEFAULT_EXCERPT_LENGTH),
            "First paragraph line. Second line."
        );
    }

    #[test]
    fn excerpt_without_header_keeps_first_line() {
        let md = "Plain start.\nMore text.";
        assert_eq!(extract_excerpt(md, 200), "Plain start. More text.");
    }

    #[test]
    fn short_excerpt_has_no_ellipsis() {
        let excerpt = extract_excerpt("# T\nsub\nshort body", 200);
        assert_eq!(excerpt, "short body");
        assert!(!excerpt.ends_with("..."));
    }

    #[test]
    fn long_excerpt_is_cut_at_word_boundary() {
        let body = "alpha beta gamma delta epsilon zeta eta theta";
        let excerpt = extract_excerpt(body, 20);
        assert_eq!(excerpt, "alpha beta gamma...");
        assert!(excerpt.trim_end_matches("...").chars().count() <= 20);
    }

    #[test]
    fn excerpt_truncation_respects_multibyte_text() {
        let body = "日本語 のテキスト です とても 長い 文章";
        let excerpt = extract_excerpt(body, 10);
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.trim_end_matches("...").chars().count() <= 10);
    }

    #[test]
    fn mod_date_matches_mod_time() -> anyhow::Result<()> {
        let temp = tempfile::NamedTempFile::new()?;
        let timestamp = mod_time(temp.path())?;
        assert_eq!(mod_date(temp.path())?, format_publish_date(timestamp));
        assert!(mod_date(temp.path())?.contains(" at "));
        Ok(())
    }

    #[test]
    fn mod_time_of_missing_file_is_an_error() {
        assert!(mod_time(Path::new("does/not/exist.md")).is_err());
    }
}
