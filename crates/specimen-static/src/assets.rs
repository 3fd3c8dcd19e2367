//! Built-in guide stylesheet.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

/// The built-in stylesheet could not be minified.
#[derive(Debug, thiserror::Error)]
#[error("Failed to minify guide stylesheet: {0}")]
pub struct MinifyError(String);

/// Built-in assets written next to the pages.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Location of the guide stylesheet inside `guide_dest`.
    pub const CSS_PATH: &'static str = "assets/specimen.css";

    pub fn generate_css() -> String {
        DEFAULT_CSS.to_string()
    }

    /// Guide stylesheet, minified. Falls back to the readable source.
    pub fn guide_css() -> String {
        Self::minify_css(DEFAULT_CSS).unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            Self::generate_css()
        })
    }

    pub fn minify_css(css: &str) -> Result<String, MinifyError> {
        let sheet =
            StyleSheet::parse(css, ParserOptions::default()).map_err(|e| MinifyError(e.to_string()))?;

        let printed = sheet
            .to_css(PrinterOptions {
                minify: true,
                ..PrinterOptions::default()
            })
            .map_err(|e| MinifyError(e.to_string()))?;

        Ok(printed.code)
    }
}

const DEFAULT_CSS: &str = r#"/* specimen guide theme */

:root {
  --sidebar-width: 260px;
  --content-max-width: 960px;
  --guide-bg: #ffffff;
  --guide-fg: #1f2328;
  --guide-muted: #f6f8fa;
  --guide-border: #d0d7de;
  --guide-accent: #0969da;
  --guide-warning: #9a6700;
}

* {
  box-sizing: border-box;
}

body.guide {
  margin: 0;
  font-family: system-ui, -apple-system, sans-serif;
  background: var(--guide-bg);
  color: var(--guide-fg);
  line-height: 1.5;
}

.layout {
  display: grid;
  grid-template-columns: var(--sidebar-width) 1fr;
  min-height: 100vh;
}

.sidebar {
  background: var(--guide-muted);
  border-right: 1px solid var(--guide-border);
  padding: 1.5rem;
  position: sticky;
  top: 0;
  height: 100vh;
  overflow-y: auto;
}

.nav-logo {
  font-weight: 700;
  color: var(--guide-fg);
  text-decoration: none;
}

.nav-list,
.nav-children,
.listing {
  list-style: none;
  padding: 0;
}

.nav-children {
  margin-left: 1rem;
}

.nav-item a {
  display: block;
  padding: 0.25rem 0.5rem;
  color: var(--guide-fg);
  text-decoration: none;
  border-radius: 4px;
}

.nav-item.active > a {
  background: var(--guide-accent);
  color: var(--guide-bg);
}

.main {
  padding: 2rem;
  max-width: var(--content-max-width);
}

.page-category {
  text-transform: uppercase;
  font-size: 0.75rem;
  color: var(--guide-accent);
}

.notice-deprecated {
  border-left: 4px solid var(--guide-warning);
  padding: 0.5rem 1rem;
  background: var(--guide-muted);
}

.stats table {
  border-collapse: collapse;
  margin: 1rem 0;
}

.stats th,
.stats td {
  border: 1px solid var(--guide-border);
  padding: 0.25rem 0.75rem;
  text-align: left;
}

.stats-preview {
  display: inline-block;
  width: 2rem;
  height: 2rem;
  background-size: contain;
  background-repeat: no-repeat;
}

.source pre {
  background: var(--guide-muted);
  padding: 1rem;
  overflow-x: auto;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guide_css_is_minified() {
        let source = AssetPipeline::generate_css();
        let css = AssetPipeline::guide_css();

        assert!(css.len() < source.len());
        assert!(css.contains(".layout{"));
        assert!(!css.contains("/* specimen"));
    }

    #[test]
    fn minify_rejects_invalid_css() {
        assert!(AssetPipeline::minify_css("%%% {").is_err());
    }
}
