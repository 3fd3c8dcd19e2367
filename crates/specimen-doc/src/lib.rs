//! Documentation for style guide pages.
//!
//! Stylesheets document themselves with `/*md ... */` comment blocks; guides
//! are plain markdown files. Both may open with YAML frontmatter and are
//! rendered to HTML with a heading table of contents.

pub mod comments;
pub mod frontmatter;
pub mod parser;

pub use comments::extract_doc_blocks;
pub use frontmatter::Frontmatter;
pub use parser::{parse_markdown, parse_stylesheet_doc, ParseError, ParsedDoc, TocEntry};
