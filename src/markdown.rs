use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::toc::heading_anchor;

/// A heading found in a Markdown document, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// Renders a Markdown document to an HTML fragment.
///
/// Headings get an `id` derived from their text so that table-of-contents
/// links resolve inside the page.
pub fn render_markdown(markdown: &str) -> String {
    let events = with_heading_anchors(Parser::new_ext(markdown, options()));
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, events.into_iter());
    html
}

pub fn headings(markdown: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut current: Option<(u8, String)> = None;

    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((heading_level(level), String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = current.take() {
                    headings.push(Heading {
                        level,
                        text: text.trim().to_owned(),
                    });
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, buf)) = current.as_mut() {
                    buf.push_str(&text);
                }
            }
            _ => {}
        }
    }

    headings
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn with_heading_anchors<'a>(parser: Parser<'a>) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    let mut heading: Option<(Tag<'a>, Vec<Event<'a>>)> = None;

    for event in parser {
        match event {
            Event::Start(tag @ Tag::Heading { .. }) => heading = Some((tag, Vec::new())),
            Event::End(TagEnd::Heading(level)) => {
                if let Some((tag, inner)) = heading.take() {
                    events.push(Event::Start(anchored(tag, &inner)));
                    events.extend(inner);
                }
                events.push(Event::End(TagEnd::Heading(level)));
            }
            event => match heading.as_mut() {
                Some((_, inner)) => inner.push(event),
                None => events.push(event),
            },
        }
    }

    events
}

fn anchored<'a>(tag: Tag<'a>, inner: &[Event<'a>]) -> Tag<'a> {
    match tag {
        Tag::Heading {
            level,
            id,
            classes,
            attrs,
        } => {
            let id = id.or_else(|| {
                let text: String = inner
                    .iter()
                    .filter_map(|event| match event {
                        Event::Text(text) | Event::Code(text) => Some(text.as_ref()),
                        _ => None,
                    })
                    .collect();
                let anchor = heading_anchor(text.trim());
                (!anchor.is_empty()).then(|| CowStr::from(anchor))
            });
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_common_constructs() {
        let html = render_markdown(
            "# Title\n\nSome **bold** and *italic* with `code`.\n\n- one\n- two\n\n[link](https://example.com)\n",
        );
        assert!(html.contains("<h1 id=\"title\">Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
        assert!(html.contains("<code>code</code>"));
        assert!(html.contains("<li>one</li>"));
        assert!(html.contains("<a href=\"https://example.com\">link</a>"));
    }

    #[test]
    fn renders_tables_and_fenced_code() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n\n```\nlet x = 1 < 2;\n```\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>a</th>"));
        assert!(html.contains("<td>2</td>"));
        assert!(html.contains("let x = 1 &lt; 2;"));
    }

    #[test]
    fn heading_ids_use_anchor_rules() {
        let html = render_markdown("## Getting Started: `cargo` & you\n");
        assert!(html.contains("<h2 id=\"getting-started-cargo--you\">"));
    }

    #[test]
    fn headings_skip_code_fences() {
        let found = headings("# Title\n\n```python\n# not a heading\n```\n\n## Real\n");
        assert_eq!(
            found,
            vec![
                Heading {
                    level: 1,
                    text: "Title".to_owned()
                },
                Heading {
                    level: 2,
                    text: "Real".to_owned()
                },
            ]
        );
    }

    #[test]
    fn escape_html_escapes_markup() {
        assert_eq!(
            escape_html("<a href=\"x\">Tom & Jerry's</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }
}
