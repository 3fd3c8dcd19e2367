//! Template engine for rendering style guide pages.
//!
//! Page templates (`guide`, `category`, `index`) and partials (`assetshead`,
//! `assetsfooter`, `navigation`, `stats`) share one namespace. Built-ins are
//! served by a loader; project overrides are registered up front and so take
//! precedence. Including an unknown partial is an error.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, ErrorKind};
use serde::Serialize;
use specimen_doc::TocEntry;
use specimen_stats::ComponentStats;

use crate::discovery::SourceKind;

/// A page link in navigation and listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavItem {
    /// Display title
    pub title: String,
    /// Page file name
    pub path: String,
    pub kind: SourceKind,
}

/// A category and its pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavCategory {
    pub name: String,
    /// Category page, when category pages are written
    pub path: Option<String>,
    pub items: Vec<NavItem>,
}

/// Navigation shared by every page of a build.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Navigation {
    /// Pages at the source root
    pub root: Vec<NavItem>,
    pub categories: Vec<NavCategory>,
}

/// Context for a component or guide page.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext<'a> {
    pub site_title: &'a str,
    pub id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub kind: SourceKind,
    pub deprecated: bool,
    /// Compiled CSS
    pub css: Option<&'a str>,
    /// Rendered documentation HTML
    pub doc: &'a str,
    pub toc: &'a [TocEntry],
    pub stats: Option<&'a ComponentStats>,
    pub nav: &'a Navigation,
    /// Links to project stylesheets
    pub stylesheets: &'a [String],
    pub internal_assets: bool,
}

/// A built page in aggregation listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSummary {
    pub id: String,
    pub title: String,
    pub path: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub kind: SourceKind,
    pub deprecated: bool,
    pub order: Option<i32>,
    /// Formatted data URI total, for pages with statistics
    pub data_uri_total: Option<String>,
}

/// Context for the index and category pages.
#[derive(Debug, Clone, Serialize)]
pub struct ListingContext<'a> {
    pub site_title: &'a str,
    pub title: &'a str,
    /// Category name on category pages
    pub category: Option<&'a str>,
    pub pages: &'a [PageSummary],
    pub nav: &'a Navigation,
    pub stylesheets: &'a [String],
    pub internal_assets: bool,
}

/// Errors that can occur while loading or rendering templates.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Failed to read template {name} from {path}: {source}")]
    Read {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Missing partial in {template}: {message}")]
    MissingPartial { template: String, message: String },

    #[error("Failed to render {template}: {source}")]
    Render {
        template: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a template engine with the built-in templates only.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_loader(|name| Ok(builtin(name).map(str::to_string)));

        Self { env }
    }

    /// Create a template engine with project overrides for partials and
    /// page templates. Override files are read immediately.
    pub fn with_overrides(
        partials: &BTreeMap<String, PathBuf>,
        templates: &BTreeMap<String, PathBuf>,
    ) -> Result<Self, TemplateError> {
        let mut engine = Self::new();

        for (name, path) in partials.iter().chain(templates) {
            engine.add_override(name, path)?;
        }

        Ok(engine)
    }

    fn add_override(&mut self, name: &str, path: &Path) -> Result<(), TemplateError> {
        let source = fs::read_to_string(path).map_err(|e| TemplateError::Read {
            name: name.to_string(),
            path: path.to_path_buf(),
            source: e,
        })?;

        self.env
            .add_template_owned(name.to_string(), source)
            .map_err(|e| TemplateError::Render {
                template: name.to_string(),
                source: e,
            })?;

        tracing::debug!("Template {} overridden by {}", name, path.display());
        Ok(())
    }

    /// Render a named template.
    pub fn render<S: Serialize>(&self, template: &str, context: &S) -> Result<String, TemplateError> {
        let tmpl = self.env.get_template(template).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => TemplateError::UnknownTemplate(template.to_string()),
            _ => TemplateError::Render {
                template: template.to_string(),
                source: e,
            },
        })?;

        tmpl.render(context).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => TemplateError::MissingPartial {
                template: template.to_string(),
                message: e.to_string(),
            },
            _ => TemplateError::Render {
                template: template.to_string(),
                source: e,
            },
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin(name: &str) -> Option<&'static str> {
    match name {
        "guide" => Some(GUIDE_TEMPLATE),
        "category" | "index" => Some(LISTING_TEMPLATE),
        "assetshead" => Some(ASSETS_HEAD_PARTIAL),
        "assetsfooter" => Some(ASSETS_FOOTER_PARTIAL),
        "navigation" => Some(NAVIGATION_PARTIAL),
        "stats" => Some(STATS_PARTIAL),
        _ => None,
    }
}

const GUIDE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title }} - {{ site_title }}</title>
  {% include "assetshead" %}
</head>
<body class="guide guide-{{ kind }}{% if deprecated %} guide-deprecated{% endif %}">
  <div class="layout">
    <nav class="sidebar">
      {% include "navigation" %}
    </nav>
    <main class="main">
      <header class="page-header">
        {% if category %}<p class="page-category">{{ category }}</p>{% endif %}
        <h1 class="page-title">{{ title }}</h1>
        {% if description %}<p class="page-description">{{ description }}</p>{% endif %}
      </header>
      {% if deprecated %}
      <p class="notice-deprecated">This component is deprecated.</p>
      {% endif %}
      {% if toc %}
      <aside class="toc">
        <ul>
        {% for entry in toc %}
          <li class="toc-level-{{ entry.level }}"><a href="#{{ entry.id }}">{{ entry.title }}</a></li>
        {% endfor %}
        </ul>
      </aside>
      {% endif %}
      {% if doc %}
      <article class="doc">
        {{ doc | safe }}
      </article>
      {% endif %}
      {% if stats %}{% include "stats" %}{% endif %}
      {% if css %}
      <details class="source">
        <summary>Compiled CSS</summary>
        <pre><code class="language-css">{{ css }}</code></pre>
      </details>
      {% endif %}
    </main>
  </div>
  {% include "assetsfooter" %}
</body>
</html>
"##;

const LISTING_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title }} - {{ site_title }}</title>
  {% include "assetshead" %}
</head>
<body class="guide guide-listing">
  <div class="layout">
    <nav class="sidebar">
      {% include "navigation" %}
    </nav>
    <main class="main">
      <h1 class="page-title">{{ title }}</h1>
      <ul class="listing">
      {% for page in pages %}
        <li class="listing-item{% if page.deprecated %} deprecated{% endif %}">
          <a href="{{ page.path }}">{{ page.title }}</a>
          {% if page.category and not category %}<span class="listing-category">{{ page.category }}</span>{% endif %}
          {% if page.description %}<p>{{ page.description }}</p>{% endif %}
          {% if page.data_uri_total %}<span class="listing-size">data URIs: {{ page.data_uri_total }}</span>{% endif %}
        </li>
      {% endfor %}
      </ul>
    </main>
  </div>
  {% include "assetsfooter" %}
</body>
</html>
"##;

const ASSETS_HEAD_PARTIAL: &str = r##"{% for href in stylesheets %}<link rel="stylesheet" href="{{ href }}">
  {% endfor %}{% if internal_assets %}<link rel="stylesheet" href="assets/specimen.css">{% endif %}"##;

const ASSETS_FOOTER_PARTIAL: &str = r##"<footer class="footer">{{ site_title }}</footer>"##;

const NAVIGATION_PARTIAL: &str = r##"<div class="nav-header">
  <a href="index.html" class="nav-logo">{{ site_title }}</a>
</div>
<ul class="nav-list">
{% for item in nav.root %}
  <li class="nav-item{% if item.path == id ~ '.html' %} active{% endif %}">
    <a href="{{ item.path }}">{{ item.title }}</a>
  </li>
{% endfor %}
{% for cat in nav.categories %}
  <li class="nav-item nav-category">
    {% if cat.path %}<a href="{{ cat.path }}">{{ cat.name }}</a>{% else %}<span>{{ cat.name }}</span>{% endif %}
    <ul class="nav-children">
    {% for item in cat.items %}
      <li class="nav-item{% if item.path == id ~ '.html' %} active{% endif %}">
        <a href="{{ item.path }}">{{ item.title }}</a>
      </li>
    {% endfor %}
    </ul>
  </li>
{% endfor %}
</ul>"##;

const STATS_PARTIAL: &str = r##"<section class="stats">
  <h2>Statistics</h2>
  <dl class="stats-summary">
    <dt>Rules</dt><dd>{{ stats.rules }}</dd>
    <dt>Selectors</dt><dd>{{ stats.selectors | length }}</dd>
    <dt>Declarations</dt><dd>{{ stats.declarations }}</dd>
    <dt>Font faces</dt><dd>{{ stats.font_faces }}</dd>
    <dt>Data URIs</dt><dd>{{ stats.data_uri.total.fmt }}</dd>
  </dl>
  {% if stats.properties %}
  <table class="stats-properties">
    <thead><tr><th>Property</th><th>Count</th></tr></thead>
    <tbody>
    {% for prop in stats.properties %}
      <tr><td>{{ prop.name }}</td><td>{{ prop.count }}</td></tr>
    {% endfor %}
    </tbody>
  </table>
  {% endif %}
  {% if stats.data_uri.data %}
  <table class="stats-data-uri">
    <thead><tr><th>Type</th><th>Size</th><th>Preview</th></tr></thead>
    <tbody>
    {% for item in stats.data_uri.data %}
      <tr>
        <td title="{{ item.type_raw }}">{{ item.type }}</td>
        <td data-bytes="{{ item.size_raw }}">{{ item.size }}</td>
        <td>{% if item.display_value %}<span class="stats-preview" style="background-image: url({{ item.display_value }})"></span>{% endif %}</td>
      </tr>
    {% endfor %}
    </tbody>
  </table>
  {% endif %}
  <ul class="stats-selectors">
  {% for selector in stats.selectors %}
    <li><code>{{ selector }}</code></li>
  {% endfor %}
  </ul>
</section>"##;
