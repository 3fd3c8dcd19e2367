//! Per-component statistics.

use std::collections::HashMap;
use std::path::Path;

use lightningcss::properties::custom::{TokenList, TokenOrValue};
use lightningcss::properties::{Property, PropertyId};
use lightningcss::rules::font_face::{FontFaceProperty, FontFaceRule, Source};
use lightningcss::rules::style::StyleRule;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::traits::ToCss;
use lightningcss::values::image::Image;
use serde::Serialize;

use crate::compiler::{CompileError, StylesheetCompiler};
use crate::data_uri::{measure_uris, DataUriSummary};

/// How often a property is declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyUsage {
    pub name: String,
    pub count: usize,
}

/// Statistics derived from a compiled stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentStats {
    /// Selectors in order of first appearance
    pub selectors: Vec<String>,
    /// Number of style rules
    pub rules: usize,
    /// Number of declarations, font-face descriptors included
    pub declarations: usize,
    /// Declared properties, most used first
    pub properties: Vec<PropertyUsage>,
    /// Number of `@font-face` blocks
    pub font_faces: usize,
    /// Embedded data URIs
    pub data_uri: DataUriSummary,
}

/// A compiled stylesheet and its statistics.
#[derive(Debug, Clone)]
pub struct CompiledStylesheet {
    pub css: String,
    pub stats: ComponentStats,
}

/// Compile `path` and collect its statistics.
///
/// Compile failures are returned as-is.
pub fn extract(
    compiler: &dyn StylesheetCompiler,
    path: &Path,
) -> Result<CompiledStylesheet, CompileError> {
    let css = compiler.compile(path)?;
    let stats = collect_stats(&css);

    tracing::debug!(
        "{} ({}): {} rules, {} data URIs ({})",
        path.display(),
        compiler.name(),
        stats.rules,
        stats.data_uri.data.len(),
        stats.data_uri.total.fmt
    );

    Ok(CompiledStylesheet { css, stats })
}

/// Collect statistics from compiled CSS text.
///
/// Rules the parser cannot read are skipped, so a partially broken
/// stylesheet still reports what it can.
pub fn collect_stats(css: &str) -> ComponentStats {
    let options = ParserOptions {
        error_recovery: true,
        ..ParserOptions::default()
    };

    let stylesheet = match StyleSheet::parse(css, options) {
        Ok(stylesheet) => stylesheet,
        Err(e) => {
            tracing::warn!("Could not read compiled CSS for statistics: {}", e);
            return Collector::default().finish();
        }
    };

    let mut collector = Collector::default();
    collector.visit_rules(&stylesheet.rules.0);
    collector.finish()
}

/// Running totals while walking a parsed stylesheet.
#[derive(Default)]
struct Collector<'a> {
    selectors: Vec<String>,
    rules: usize,
    declarations: usize,
    font_faces: usize,
    counts: HashMap<String, usize>,
    backgrounds: Vec<&'a str>,
    background_images: Vec<&'a str>,
    font_sources: Vec<&'a str>,
}

impl<'a> Collector<'a> {
    fn visit_rules<'i>(&mut self, rules: &'a [CssRule<'i>]) {
        for rule in rules {
            match rule {
                CssRule::Style(style) => self.visit_style(style),
                CssRule::Nesting(nesting) => self.visit_style(&nesting.style),
                CssRule::FontFace(font_face) => self.visit_font_face(font_face),
                CssRule::Media(media) => self.visit_rules(&media.rules.0),
                CssRule::Supports(supports) => self.visit_rules(&supports.rules.0),
                CssRule::LayerBlock(layer) => self.visit_rules(&layer.rules.0),
                CssRule::Container(container) => self.visit_rules(&container.rules.0),
                CssRule::Scope(scope) => self.visit_rules(&scope.rules.0),
                CssRule::StartingStyle(starting) => self.visit_rules(&starting.rules.0),
                CssRule::MozDocument(document) => self.visit_rules(&document.rules.0),
                _ => {}
            }
        }
    }

    fn visit_style<'i>(&mut self, style: &'a StyleRule<'i>) {
        self.rules += 1;

        for selector in style.selectors.0.iter() {
            let Ok(text) = selector.to_css_string(PrinterOptions::default()) else {
                continue;
            };
            if !self.selectors.contains(&text) {
                self.selectors.push(text);
            }
        }

        let block = &style.declarations;
        for property in block.declarations.iter().chain(&block.important_declarations) {
            self.visit_property(property);
        }

        self.visit_rules(&style.rules.0);
    }

    fn visit_property<'i>(&mut self, property: &'a Property<'i>) {
        self.declarations += 1;
        *self.counts.entry(property_name(property)).or_default() += 1;

        match property {
            Property::Background(layers) => {
                for layer in layers.iter() {
                    image_urls(&layer.image, &mut self.backgrounds);
                }
            }
            Property::BackgroundImage(images) => {
                for image in images.iter() {
                    image_urls(image, &mut self.background_images);
                }
            }
            Property::Unparsed(unparsed) => match unparsed.property_id {
                PropertyId::Background => token_urls(&unparsed.value, &mut self.backgrounds),
                PropertyId::BackgroundImage => {
                    token_urls(&unparsed.value, &mut self.background_images)
                }
                _ => {}
            },
            _ => {}
        }
    }

    fn visit_font_face<'i>(&mut self, font_face: &'a FontFaceRule<'i>) {
        self.font_faces += 1;
        self.declarations += font_face.properties.len();

        for property in &font_face.properties {
            if let FontFaceProperty::Source(sources) = property {
                self.font_sources.extend(sources.iter().filter_map(|source| match source {
                    Source::Url(source) => Some(&*source.url.url),
                    Source::Local(_) => None,
                }));
            }
        }
    }

    fn finish(self) -> ComponentStats {
        let mut properties: Vec<PropertyUsage> = self
            .counts
            .into_iter()
            .map(|(name, count)| PropertyUsage { name, count })
            .collect();
        properties.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        let uris = self
            .backgrounds
            .into_iter()
            .chain(self.background_images)
            .chain(self.font_sources);

        ComponentStats {
            selectors: self.selectors,
            rules: self.rules,
            declarations: self.declarations,
            properties,
            font_faces: self.font_faces,
            data_uri: measure_uris(uris),
        }
    }
}

/// Property name as written, vendor prefix included.
fn property_name(property: &Property<'_>) -> String {
    let id = property.property_id();
    id.to_css_string(PrinterOptions::default())
        .unwrap_or_else(|_| id.name().to_string())
}

fn image_urls<'a>(image: &'a Image<'_>, out: &mut Vec<&'a str>) {
    match image {
        Image::Url(url) => out.push(&url.url),
        Image::ImageSet(set) => {
            for option in &set.options {
                image_urls(&option.image, out);
            }
        }
        _ => {}
    }
}

fn token_urls<'a>(tokens: &'a TokenList<'_>, out: &mut Vec<&'a str>) {
    for token in &tokens.0 {
        match token {
            TokenOrValue::Url(url) => out.push(&url.url),
            TokenOrValue::Function(function) => token_urls(&function.arguments, out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::LightningCompiler;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    const CSS: &str = r#"
.b-card { color: red; background: url(data:image/png;base64,AAAAAAAA) no-repeat; }
.b-card__title, .b-card { color: blue; font-weight: bold; }
.b-card__icon { background-image: url(data:image/gif;base64,AA); }
@font-face { font-family: Icons; src: url(data:font/woff2;base64,AAAAAAAAAAAAAAAA) format("woff2"); }
"#;

    #[test]
    fn collects_selectors_and_counts() {
        let stats = collect_stats(CSS);

        assert_eq!(stats.selectors, vec![".b-card", ".b-card__title", ".b-card__icon"]);
        assert_eq!(stats.rules, 3);
        assert_eq!(stats.font_faces, 1);
        assert_eq!(stats.declarations, 7);
        assert_eq!(
            stats.properties[0],
            PropertyUsage {
                name: "color".to_string(),
                count: 2
            }
        );
        assert_eq!(stats.properties[1].name, "background");
    }

    #[test]
    fn feeds_backgrounds_and_font_sources_to_analyzer() {
        let stats = collect_stats(CSS);
        let kinds: Vec<&str> = stats.data_uri.data.iter().map(|e| e.kind.as_str()).collect();

        assert_eq!(kinds, vec!["font", "image", "image"]);
        assert_eq!(stats.data_uri.data[1].type_raw, "image/png;base64");
        assert_eq!(
            stats.data_uri.total.raw,
            stats.data_uri.data.iter().map(|e| e.size_raw).sum::<usize>()
        );
    }

    #[test]
    fn component_without_assets_has_empty_summary() {
        let stats = collect_stats(".plain { color: red; background: #fff url(bg.png); }");

        assert!(stats.data_uri.data.is_empty());
        assert_eq!(stats.data_uri.total.raw, 0);
    }

    #[test]
    fn extract_compiles_then_measures() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("_badge.scss");
        fs::write(
            &path,
            ".b-badge { background-image: url(data:image/png;base64,iVBORw0KGgo=); }",
        )
        .unwrap();

        let compiled = extract(&LightningCompiler::new(), &path).unwrap();

        assert!(compiled.css.contains(".b-badge"));
        assert_eq!(compiled.stats.selectors, vec![".b-badge"]);
        assert_eq!(compiled.stats.data_uri.data.len(), 1);
        assert_eq!(compiled.stats.data_uri.data[0].kind, "image");
    }

    #[test]
    fn data_uri_size_matches_source_bytes() {
        const PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
        let temp = tempdir().unwrap();
        let path = temp.path().join("_dot.scss");
        let source = format!(".b-dot {{ background: url({}) no-repeat; }}", PNG);
        fs::write(&path, &source).unwrap();

        let compiled = extract(&LightningCompiler::new(), &path).unwrap();

        assert_eq!(compiled.css, source);
        assert_eq!(compiled.stats.data_uri.data[0].size_raw, PNG.len());
        assert_eq!(compiled.stats.data_uri.total.raw, PNG.len());
    }

    #[test]
    fn walks_group_rules_and_important_declarations() {
        let css = r#"
@media (min-width: 600px) {
  .b-nav { display: flex !important; background-image: url("data:image/gif;base64,AA"); }
}
@supports (display: grid) {
  .b-nav__item { display: grid; }
}
"#;

        let stats = collect_stats(css);

        assert_eq!(stats.selectors, vec![".b-nav", ".b-nav__item"]);
        assert_eq!(stats.rules, 2);
        assert_eq!(stats.declarations, 3);
        assert_eq!(
            stats.properties[0],
            PropertyUsage {
                name: "display".to_string(),
                count: 2
            }
        );
        assert_eq!(stats.data_uri.data.len(), 1);
        assert_eq!(stats.data_uri.data[0].size_raw, "data:image/gif;base64,AA".len());
    }

    #[test]
    fn unreadable_rules_are_skipped() {
        let stats = collect_stats("%%% { color: red; } .b-ok { color: blue; }");

        assert_eq!(stats.selectors, vec![".b-ok"]);
        assert_eq!(stats.rules, 1);
    }

    #[test]
    fn extract_propagates_compile_errors() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("_broken.scss");
        fs::write(&path, "%%% { color: red; }").unwrap();

        let result = extract(&LightningCompiler::new(), &path);

        assert!(matches!(result, Err(CompileError::Syntax { .. })));
    }
}
