use crate::markdown::{escape_html, headings};

/// Builds the page table of contents from Markdown headings.
///
/// The first level-one heading is the page title and is left out. Returns an
/// empty string when no other heading exists.
pub fn generate_toc(markdown: &str) -> String {
    let mut seen_title = false;
    let mut items = String::new();

    for heading in headings(markdown) {
        if heading.level == 1 && !seen_title {
            seen_title = true;
            continue;
        }

        let indent = "    ".repeat(usize::from(heading.level.saturating_sub(2)));
        items.push_str(&format!(
            "{indent}        <li class=\"toc-level-{}\"><a href=\"#{}\">{}</a></li>\n",
            heading.level,
            heading_anchor(&heading.text),
            escape_html(&heading.text)
        ));
    }

    if items.is_empty() {
        return String::new();
    }

    let mut toc = String::new();
    toc.push_str("<nav class=\"toc\">\n");
    toc.push_str("    <h3>Table of Contents</h3>\n");
    toc.push_str("    <ul>\n");
    toc.push_str(&items);
    toc.push_str("    </ul>\n");
    toc.push_str("</nav>\n");
    toc
}

/// Lowercases, turns spaces into `-` and drops everything that is not an
/// ASCII letter, digit or `-`.
pub fn heading_anchor(text: &str) -> String {
    text.chars()
        .map(|c| if c == ' ' { '-' } else { c.to_ascii_lowercase() })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}
