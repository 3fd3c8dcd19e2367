//! Markdown document parser.

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;

use crate::comments::extract_doc_blocks;
use crate::frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};

/// A parsed documentation source.
#[derive(Debug, Clone, Default)]
pub struct ParsedDoc {
    /// Parsed frontmatter (if present)
    pub frontmatter: Option<Frontmatter>,

    /// Rendered HTML
    pub html: String,

    /// Table of contents entries
    pub toc: Vec<TocEntry>,
}

impl ParsedDoc {
    /// Frontmatter, or defaults when the source has none.
    pub fn meta(&self) -> Frontmatter {
        self.frontmatter.clone().unwrap_or_default()
    }
}

/// A table of contents entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TocEntry {
    /// Heading text
    pub title: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (1-6)
    pub level: u8,
}

/// Errors that can occur when parsing documentation.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

/// Parse a markdown guide.
///
/// Extracts frontmatter, renders HTML and generates a table of contents.
/// Headings without an explicit id get `h<level>-<slug>`.
pub fn parse_markdown(source: &str) -> Result<ParsedDoc, ParseError> {
    let (frontmatter, content) = extract_frontmatter(source)?;
    let (html, toc) = render(content);

    Ok(ParsedDoc {
        frontmatter,
        html,
        toc,
    })
}

/// Parse the `/*md` documentation blocks of a stylesheet.
///
/// Blocks are joined in source order; the first may carry frontmatter.
pub fn parse_stylesheet_doc(source: &str) -> Result<ParsedDoc, ParseError> {
    let blocks = extract_doc_blocks(source);
    if blocks.is_empty() {
        return Ok(ParsedDoc::default());
    }

    parse_markdown(&blocks.join("\n\n"))
}

fn render(content: &str) -> (String, Vec<TocEntry>) {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES;

    let mut events: Vec<Event<'_>> = Parser::new_ext(content, options).collect();

    // (event index, heading text)
    let mut headings = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (idx, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Heading { .. }) => current = Some((idx, String::new())),
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, ref mut title)) = current {
                    title.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(heading) = current.take() {
                    headings.push(heading);
                }
            }
            _ => {}
        }
    }

    let mut toc = Vec::with_capacity(headings.len());
    for (idx, title) in headings {
        if let Event::Start(Tag::Heading { level, id, .. }) = &mut events[idx] {
            let level = *level as u8;
            let anchor = match id {
                Some(explicit) => explicit.to_string(),
                None => format!("h{}-{}", level, slugify(&title)),
            };
            *id = Some(anchor.clone().into());
            toc.push(TocEntry {
                title,
                id: anchor,
                level,
            });
        }
    }

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());

    (html_output, toc)
}

/// Convert a heading to a URL-safe slug.
fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
