//! Style guide builder.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;

use specimen_doc::{parse_markdown, parse_stylesheet_doc, ParsedDoc};
use specimen_stats::{CompileError, ComponentStats, LightningCompiler, StylesheetCompiler};

use crate::assets::AssetPipeline;
use crate::config::{BuildConfig, ConfigError, ResolvedConfig};
use crate::discovery::{self, Discovered, DiscoveryError, SourceFile, SourceKind};
use crate::templates::{
    ListingContext, NavCategory, NavItem, Navigation, PageContext, PageSummary, TemplateEngine,
    TemplateError,
};
use crate::writer::{write_if_changed, WriteError, WriteOutcome};

/// A compiled component, ready to render.
#[derive(Debug, Clone)]
pub struct Component {
    /// `<category>-<name>` or `<name>`
    pub id: String,
    pub source_path: PathBuf,
    pub category: Option<String>,
    pub compiled_css: String,
    /// `None` when the component opts out of statistics
    pub stats: Option<ComponentStats>,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("{path} has the same page id as {first}")]
    DuplicateId { path: PathBuf, first: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Invalid documentation in {path}: {source}")]
    Doc {
        path: PathBuf,
        #[source]
        source: specimen_doc::ParseError,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Build task failed: {0}")]
    Task(String),
}

/// A page that could not be built.
#[derive(Debug)]
pub struct ComponentFailure {
    pub id: String,
    pub source_path: PathBuf,
    pub error: BuildError,
}

/// Result of a build operation.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Files whose content changed
    pub written: Vec<PathBuf>,

    /// Files left untouched because their content was identical
    pub unchanged: Vec<PathBuf>,

    /// Pages that failed; siblings are still built
    pub failures: Vec<ComponentFailure>,

    /// Total build time in milliseconds
    pub duration_ms: u64,
}

impl BuildReport {
    /// Whether every page was built.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of files produced, written or not.
    pub fn files(&self) -> usize {
        self.written.len() + self.unchanged.len()
    }

    fn record(&mut self, path: PathBuf, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Written => {
                tracing::debug!("Wrote {}", path.display());
                self.written.push(path);
            }
            WriteOutcome::Unchanged => {
                tracing::debug!("Unchanged {}", path.display());
                self.unchanged.push(path);
            }
        }
    }

    fn fail(&mut self, source: &SourceFile, error: BuildError) {
        tracing::warn!("Failed to build {}: {}", source.id, error);
        self.failures.push(ComponentFailure {
            id: source.id.clone(),
            source_path: source.source_path.clone(),
            error,
        });
    }
}

/// A page that went through the pipeline.
#[derive(Debug)]
struct BuiltPage {
    dest: PathBuf,
    outcome: WriteOutcome,
    summary: PageSummary,
}

/// Everything a page task needs, shared between tasks.
#[derive(Clone)]
struct Pipeline {
    config: Arc<ResolvedConfig>,
    templates: Arc<TemplateEngine>,
    compiler: Arc<dyn StylesheetCompiler>,
    nav: Arc<Navigation>,
    stylesheets: Arc<Vec<String>>,
}

/// Style guide builder.
pub struct GuideBuilder {
    config: Arc<ResolvedConfig>,
    templates: Arc<TemplateEngine>,
    compiler: Arc<dyn StylesheetCompiler>,
}

impl GuideBuilder {
    /// Create a builder. Exclusion patterns are compiled and template
    /// overrides are read here, before any page is built.
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        let templates = TemplateEngine::with_overrides(&config.partials, &config.templates)?;
        let config = ResolvedConfig::new(config)?;

        Ok(Self {
            config: Arc::new(config),
            templates: Arc::new(templates),
            compiler: Arc::new(LightningCompiler::new()),
        })
    }

    /// Use a different stylesheet compiler.
    pub fn with_compiler(mut self, compiler: impl StylesheetCompiler + 'static) -> Self {
        self.compiler = Arc::new(compiler);
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build the style guide.
    ///
    /// Without a target every page is built, followed by the index (and
    /// category pages when enabled). With a target only that page is built;
    /// targets that are missing, directories, excluded or otherwise not a
    /// source resolve to an empty report.
    pub async fn build(&self, target: Option<&Path>) -> Result<BuildReport, BuildError> {
        let start = Instant::now();

        let mut report = match target {
            Some(target) => self.build_target(target).await,
            None => self.build_all().await?,
        };

        report.duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "Built {} files ({} written, {} unchanged, {} failed) in {}ms",
            report.files(),
            report.written.len(),
            report.unchanged.len(),
            report.failures.len(),
            report.duration_ms
        );

        Ok(report)
    }

    async fn build_target(&self, target: &Path) -> BuildReport {
        let mut report = BuildReport::default();
        let extensions = self.compiler.extensions();

        let Some(source) = discovery::resolve_target(&self.config, target, extensions) else {
            tracing::debug!("Ignoring build target {}", target.display());
            return report;
        };

        let discovered = discovery::discover(&self.config, extensions).unwrap_or_else(|e| {
            tracing::warn!("Navigation limited to {}: {}", source.id, e);
            Discovered {
                sources: vec![source.clone()],
                duplicates: Vec::new(),
            }
        });

        if let Some(duplicate) = discovered.duplicate_of(&source.source_path) {
            report.fail(&source, duplicate_error(duplicate));
            return report;
        }

        let pipeline = self.pipeline(&discovered.sources);
        let (source, result) = spawn_page(pipeline, source).await;

        match result {
            Ok(page) => report.record(page.dest, page.outcome),
            Err(e) => report.fail(&source, e),
        }

        report
    }

    async fn build_all(&self) -> Result<BuildReport, BuildError> {
        let discovered = discovery::discover(&self.config, self.compiler.extensions())?;
        let pipeline = self.pipeline(&discovered.sources);
        let mut report = BuildReport::default();

        for duplicate in &discovered.duplicates {
            report.fail(&duplicate.source, duplicate_error(duplicate));
        }

        let mut tasks = JoinSet::new();
        for source in discovered.sources {
            tasks.spawn(spawn_page(pipeline.clone(), source));
        }

        let mut summaries = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (source, result) = joined.map_err(|e| BuildError::Task(e.to_string()))?;
            match result {
                Ok(page) => {
                    report.record(page.dest, page.outcome);
                    summaries.push(page.summary);
                }
                Err(e) => report.fail(&source, e),
            }
        }

        let aggregates = tokio::task::spawn_blocking(move || pipeline.write_aggregates(summaries))
            .await
            .map_err(|e| BuildError::Task(e.to_string()))??;

        for (path, outcome) in aggregates {
            report.record(path, outcome);
        }

        Ok(report)
    }

    fn pipeline(&self, sources: &[SourceFile]) -> Pipeline {
        Pipeline {
            config: self.config.clone(),
            templates: self.templates.clone(),
            compiler: self.compiler.clone(),
            nav: Arc::new(navigation(sources, self.config.category_pages)),
            stylesheets: Arc::new(discovery::project_stylesheets(&self.config)),
        }
    }
}

fn duplicate_error(duplicate: &discovery::DuplicateSource) -> BuildError {
    BuildError::DuplicateId {
        path: duplicate.source.source_path.clone(),
        first: duplicate.first.clone(),
    }
}

/// Run one page on the blocking pool. A panicking page is reported as a
/// failure of that page.
async fn spawn_page(
    pipeline: Pipeline,
    source: SourceFile,
) -> (SourceFile, Result<BuiltPage, BuildError>) {
    let task_source = source.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.build_page(&task_source))
        .await
        .unwrap_or_else(|e| Err(BuildError::Task(e.to_string())));

    (source, result)
}

impl Pipeline {
    /// Compile, document, render and write one page.
    fn build_page(&self, source: &SourceFile) -> Result<BuiltPage, BuildError> {
        let path = &source.source_path;
        let text = fs::read_to_string(path).map_err(|e| BuildError::Read {
            path: path.clone(),
            source: e,
        })?;

        let doc_err = |e: specimen_doc::ParseError| BuildError::Doc {
            path: path.clone(),
            source: e,
        };

        let (doc, component) = match source.kind {
            SourceKind::Component => {
                let compiled = specimen_stats::extract(self.compiler.as_ref(), path)?;
                let doc = parse_stylesheet_doc(&text).map_err(doc_err)?;
                let stats = doc.meta().stats.then_some(compiled.stats);
                let component = Component {
                    id: source.id.clone(),
                    source_path: path.clone(),
                    category: source.category.clone(),
                    compiled_css: compiled.css,
                    stats,
                };
                (doc, Some(component))
            }
            SourceKind::Guide => (parse_markdown(&text).map_err(doc_err)?, None),
        };

        let html = self.render_page(source, &doc, component.as_ref())?;
        let dest = self.config.guide_dest.join(source.file_name());
        let outcome = write_if_changed(&dest, &html)?;

        let meta = doc.meta();
        let summary = PageSummary {
            id: source.id.clone(),
            title: meta.title.unwrap_or_else(|| source.name.clone()),
            path: source.file_name(),
            description: meta.description,
            category: source.category.clone(),
            kind: source.kind,
            deprecated: meta.deprecated,
            order: meta.order,
            data_uri_total: component
                .and_then(|c| c.stats)
                .map(|stats| stats.data_uri.total.fmt),
        };

        Ok(BuiltPage {
            dest,
            outcome,
            summary,
        })
    }

    fn render_page(
        &self,
        source: &SourceFile,
        doc: &ParsedDoc,
        component: Option<&Component>,
    ) -> Result<String, BuildError> {
        let meta = doc.meta();
        let title = meta.title.as_deref().unwrap_or(&source.name);

        let context = PageContext {
            site_title: &self.config.title,
            id: &source.id,
            title,
            description: meta.description.as_deref(),
            category: source.category.as_deref(),
            kind: source.kind,
            deprecated: meta.deprecated,
            css: component.map(|c| c.compiled_css.as_str()),
            doc: &doc.html,
            toc: &doc.toc,
            stats: component.and_then(|c| c.stats.as_ref()),
            nav: &self.nav,
            stylesheets: &self.stylesheets,
            internal_assets: self.config.copy_internal_assets,
        };

        Ok(self.templates.render("guide", &context)?)
    }

    /// Write the index, category pages and internal assets.
    fn write_aggregates(
        &self,
        mut summaries: Vec<PageSummary>,
    ) -> Result<Vec<(PathBuf, WriteOutcome)>, BuildError> {
        summaries.sort_by(|a, b| {
            a.order
                .unwrap_or(999)
                .cmp(&b.order.unwrap_or(999))
                .then_with(|| a.id.cmp(&b.id))
        });

        let dest_root = &self.config.guide_dest;
        let mut written = Vec::new();

        if self.config.category_pages {
            let mut categories: BTreeMap<&str, Vec<PageSummary>> = BTreeMap::new();
            for summary in &summaries {
                if let Some(category) = summary.category.as_deref() {
                    categories.entry(category).or_default().push(summary.clone());
                }
            }

            for (category, pages) in categories {
                if summaries.iter().any(|s| s.id == category) {
                    tracing::warn!(
                        "Skipping category page {}: a page with that id exists",
                        category
                    );
                    continue;
                }

                let html = self.templates.render(
                    "category",
                    &self.listing(category, Some(category), &pages),
                )?;
                let dest = dest_root.join(format!("{}.html", category));
                let outcome = write_if_changed(&dest, &html)?;
                written.push((dest, outcome));
            }
        }

        if self.config.copy_internal_assets {
            let css = AssetPipeline::guide_css();
            let dest = dest_root.join(AssetPipeline::CSS_PATH);
            let outcome = write_if_changed(&dest, &css)?;
            written.push((dest, outcome));
        }

        let html = self.templates.render(
            "index",
            &self.listing(&self.config.title, None, &summaries),
        )?;
        let dest = dest_root.join("index.html");
        let outcome = write_if_changed(&dest, &html)?;
        written.push((dest, outcome));

        Ok(written)
    }

    fn listing<'a>(
        &'a self,
        title: &'a str,
        category: Option<&'a str>,
        pages: &'a [PageSummary],
    ) -> ListingContext<'a> {
        ListingContext {
            site_title: &self.config.title,
            title,
            category,
            pages,
            nav: &self.nav,
            stylesheets: &self.stylesheets,
            internal_assets: self.config.copy_internal_assets,
        }
    }
}

/// Build navigation from discovered sources.
fn navigation(sources: &[SourceFile], category_pages: bool) -> Navigation {
    let mut root = Vec::new();
    let mut categories: BTreeMap<&str, Vec<NavItem>> = BTreeMap::new();

    for source in sources {
        let item = NavItem {
            title: source.name.clone(),
            path: source.file_name(),
            kind: source.kind,
        };

        match source.category.as_deref() {
            Some(category) => categories.entry(category).or_default().push(item),
            None => root.push(item),
        }
    }

    Navigation {
        root,
        categories: categories
            .into_iter()
            .map(|(name, items)| NavCategory {
                name: name.to_string(),
                path: category_pages.then(|| format!("{}.html", name)),
                items,
            })
            .collect(),
    }
}
