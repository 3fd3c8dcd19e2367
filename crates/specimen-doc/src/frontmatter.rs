//! YAML frontmatter at the top of a documentation block.

use serde::Deserialize;

const FENCE: &str = "---";

/// Page settings from the frontmatter of a component or guide.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Frontmatter {
    /// Page title, defaults to the file name
    pub title: Option<String>,

    /// Short description shown in listings
    pub description: Option<String>,

    /// Position in listings, lowest first
    pub order: Option<i32>,

    pub deprecated: bool,

    /// `false` for components whose statistics are noise (layout helpers)
    pub stats: bool,
}

impl Default for Frontmatter {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            order: None,
            deprecated: false,
            stats: true,
        }
    }
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Frontmatter opened on line {0} is never closed with ---")]
    Unclosed(usize),

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

/// Split leading frontmatter off `source`.
///
/// The block must start on the first non-blank line with a `---` fence and
/// end with another `---` line. Returns the settings, if any, and the body.
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, &str), FrontmatterError> {
    let start = source.len() - source.trim_start().len();
    let mut lines = LineOffsets::new(&source[start..], start);

    let Some((open_line, _, body_start)) = lines.next() else {
        return Ok((None, source));
    };
    if open_line.trim_end() != FENCE {
        return Ok((None, source));
    }

    let opened_at = source[..start].matches('\n').count() + 1;

    for (line, line_start, line_end) in lines {
        if line.trim_end() != FENCE {
            continue;
        }

        let yaml = source[body_start..line_start].trim();
        let frontmatter = if yaml.is_empty() {
            Frontmatter::default()
        } else {
            serde_yaml::from_str(yaml)?
        };

        return Ok((Some(frontmatter), source[line_end..].trim_start()));
    }

    Err(FrontmatterError::Unclosed(opened_at))
}

/// Lines of a string with their byte range in the enclosing source.
struct LineOffsets<'a> {
    rest: &'a str,
    offset: usize,
}

impl<'a> LineOffsets<'a> {
    fn new(text: &'a str, offset: usize) -> Self {
        Self { rest: text, offset }
    }
}

impl<'a> Iterator for LineOffsets<'a> {
    /// (line without newline, start, end including newline)
    type Item = (&'a str, usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let len = self.rest.find('\n').map_or(self.rest.len(), |i| i + 1);
        let (line, rest) = self.rest.split_at(len);
        let start = self.offset;

        self.rest = rest;
        self.offset += len;

        Some((line.trim_end_matches(['\n', '\r']), start, start + len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_component_settings() {
        let source = "---\ntitle: Button\ndescription: Clickable\norder: 2\ndeprecated: true\n---\n\n# Button\n";

        let (fm, body) = extract_frontmatter(source).unwrap();

        assert_eq!(
            fm,
            Some(Frontmatter {
                title: Some("Button".to_string()),
                description: Some("Clickable".to_string()),
                order: Some(2),
                deprecated: true,
                stats: true,
            })
        );
        assert_eq!(body, "# Button\n");
    }

    #[test]
    fn stats_can_be_disabled() {
        let (fm, body) = extract_frontmatter("---\nstats: false\n---\n# Layout").unwrap();

        let fm = fm.unwrap();
        assert!(!fm.stats);
        assert_eq!(fm.title, None);
        assert_eq!(body, "# Layout");
    }

    #[test]
    fn body_without_fence_is_untouched() {
        let source = "# Notes\n\n---\n\nA rule, not frontmatter.";

        assert_eq!(extract_frontmatter(source).unwrap(), (None, source));
    }

    #[test]
    fn empty_block_gives_defaults() {
        let (fm, body) = extract_frontmatter("\n---\n---\nBody").unwrap();

        assert_eq!(fm, Some(Frontmatter::default()));
        assert_eq!(body, "Body");
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let (fm, body) = extract_frontmatter("---\r\ntitle: Card\r\n---\r\nBody").unwrap();

        assert_eq!(fm.unwrap().title.as_deref(), Some("Card"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn unclosed_block_reports_its_line() {
        let result = extract_frontmatter("\n\n---\ntitle: Test\n# No closing");

        assert!(matches!(result, Err(FrontmatterError::Unclosed(3))));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = extract_frontmatter("---\ntitle: [broken\n---\n");

        assert!(matches!(result, Err(FrontmatterError::InvalidYaml(_))));
    }
}
