//! Build configuration.
//!
//! Loaded once per build call from `specimen.toml` (or a JSON file with the
//! same keys) and passed explicitly to everything that needs it. Keys may be
//! written in snake_case or camelCase:
//!
//! ```toml
//! guide_src = "scss"
//! guide_dest = "guide"
//! css_src = "css"
//! copy_internal_assets = true
//! excluded_sass_files = "^excluded"
//! excluded_css_files = "^excluded"
//!
//! [partials]
//! assetshead = "includes/assetshead.html"
//!
//! [templates]
//! guide = "templates/guide.html"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

/// Configuration for building a style guide.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Stylesheet source root
    #[serde(alias = "guideSrc")]
    pub guide_src: PathBuf,

    /// HTML output root
    #[serde(alias = "guideDest")]
    pub guide_dest: PathBuf,

    /// Compiled project CSS linked into every page
    #[serde(alias = "cssSrc")]
    pub css_src: Option<PathBuf>,

    /// Write the built-in guide stylesheet next to the pages
    #[serde(alias = "copyInternalAssets")]
    pub copy_internal_assets: bool,

    /// Regex for stylesheet names to skip
    #[serde(alias = "excludedSassFiles")]
    pub excluded_sass_files: Option<String>,

    /// Regex for project CSS names to skip
    #[serde(alias = "excludedCssFiles")]
    pub excluded_css_files: Option<String>,

    /// Partial name -> override file
    pub partials: BTreeMap<String, PathBuf>,

    /// Page template name -> override file
    pub templates: BTreeMap<String, PathBuf>,

    /// Site title
    pub title: String,

    /// Write one aggregation page per category on full builds
    #[serde(alias = "categoryPages")]
    pub category_pages: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            guide_src: PathBuf::from("scss"),
            guide_dest: PathBuf::from("guide"),
            css_src: None,
            copy_internal_assets: false,
            excluded_sass_files: None,
            excluded_css_files: None,
            partials: BTreeMap::new(),
            templates: BTreeMap::new(),
            title: "Style guide".to_string(),
            category_pages: false,
        }
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid {field} pattern {pattern:?}: {message}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        message: String,
    },
}

impl BuildConfig {
    /// Load configuration from a TOML or JSON file.
    ///
    /// Relative paths are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let config: BuildConfig = if is_json {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        let base = path.parent().unwrap_or(Path::new(""));
        tracing::info!("Loaded config from {}", path.display());

        Ok(config.resolve_paths(base))
    }

    /// Load configuration if the file exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Make every relative path relative to `base` instead.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |p: &Path| -> PathBuf {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };

        self.guide_src = resolve(self.guide_src.as_path());
        self.guide_dest = resolve(self.guide_dest.as_path());
        self.css_src = self.css_src.as_deref().map(&resolve);
        for path in self.partials.values_mut() {
            *path = resolve(path.as_path());
        }
        for path in self.templates.values_mut() {
            *path = resolve(path.as_path());
        }

        self
    }
}

/// Configuration with compiled exclusion patterns, fixed for one build.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: BuildConfig,
    excluded_sass: Option<Regex>,
    excluded_css: Option<Regex>,
}

impl ResolvedConfig {
    pub fn new(config: BuildConfig) -> Result<Self, ConfigError> {
        let excluded_sass = compile_pattern("excluded_sass_files", &config.excluded_sass_files)?;
        let excluded_css = compile_pattern("excluded_css_files", &config.excluded_css_files)?;

        Ok(Self {
            config,
            excluded_sass,
            excluded_css,
        })
    }

    /// Whether a source file is excluded. Tested against the file name and
    /// the name without the leading `_`.
    pub fn is_excluded_source(&self, file_name: &str) -> bool {
        is_excluded(self.excluded_sass.as_ref(), file_name)
    }

    /// Whether a project CSS file is excluded.
    pub fn is_excluded_css(&self, file_name: &str) -> bool {
        is_excluded(self.excluded_css.as_ref(), file_name)
    }
}

impl std::ops::Deref for ResolvedConfig {
    type Target = BuildConfig;

    fn deref(&self) -> &Self::Target {
        &self.config
    }
}

fn compile_pattern(
    field: &'static str,
    pattern: &Option<String>,
) -> Result<Option<Regex>, ConfigError> {
    match pattern.as_deref() {
        None | Some("") => Ok(None),
        Some(p) => Regex::new(p)
            .map(Some)
            .map_err(|e| ConfigError::InvalidPattern {
                field,
                pattern: p.to_string(),
                message: e.to_string(),
            }),
    }
}

fn is_excluded(pattern: Option<&Regex>, file_name: &str) -> bool {
    let Some(re) = pattern else {
        return false;
    };

    let bare = file_name.strip_prefix('_').unwrap_or(file_name);
    re.is_match(file_name) || re.is_match(bare)
}
