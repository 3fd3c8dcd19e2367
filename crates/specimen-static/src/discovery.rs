//! Source discovery.
//!
//! A stylesheet is a component when its name starts with the `_` partial
//! marker; markdown files are guides. Either kind is skipped when its name
//! matches the configured exclusion pattern. A source's category is the
//! directory directly containing it, when that directory is below the root.
//! Stylesheet extensions come from the compiler in use.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::ResolvedConfig;

const PARTIAL_MARKER: char = '_';
const GUIDE_EXTENSIONS: &[&str] = &["md"];

/// What a source file documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Stylesheet partial, compiled and measured
    Component,
    /// Markdown guide
    Guide,
}

/// An eligible source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Page id, `<category>-<name>` or `<name>`
    pub id: String,
    /// Name without marker and extension
    pub name: String,
    /// Containing directory below the root
    pub category: Option<String>,
    /// Absolute path to the source
    pub source_path: PathBuf,
    pub kind: SourceKind,
}

impl SourceFile {
    /// Output file name for this source's page.
    pub fn file_name(&self) -> String {
        format!("{}.html", self.id)
    }
}

/// A source whose id is already taken by another source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSource {
    pub source: SourceFile,
    /// Path of the source that keeps the id
    pub first: PathBuf,
}

/// Result of walking the source root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovered {
    /// Sources with unique ids, sorted by id
    pub sources: Vec<SourceFile>,
    /// Sources dropped because an earlier path has the same id
    pub duplicates: Vec<DuplicateSource>,
}

impl Discovered {
    /// The duplicate entry for `path`, if that source lost its id.
    pub fn duplicate_of(&self, path: &Path) -> Option<&DuplicateSource> {
        self.duplicates.iter().find(|d| d.source.source_path == path)
    }
}

/// Errors that can occur during discovery.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Source directory not found: {0}")]
    MissingRoot(PathBuf),

    #[error("Failed to walk {path}: {message}")]
    Walk { path: PathBuf, message: String },
}

/// Find every eligible source below the configured root, sorted by id.
///
/// When two paths map to the same id the one that sorts first by path keeps
/// it and the other is returned as a duplicate.
pub fn discover(
    config: &ResolvedConfig,
    stylesheet_extensions: &[&str],
) -> Result<Discovered, DiscoveryError> {
    let root = fs::canonicalize(&config.guide_src)
        .map_err(|_| DiscoveryError::MissingRoot(config.guide_src.clone()))?;

    let mut found = Vec::new();

    for entry in WalkDir::new(&root).follow_links(true) {
        let entry = entry.map_err(|e| DiscoveryError::Walk {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(source) = classify(config, &root, entry.path(), stylesheet_extensions) {
            found.push(source);
        }
    }

    found.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.source_path.cmp(&b.source_path)));

    let mut discovered = Discovered::default();
    for source in found {
        match discovered.sources.last() {
            Some(kept) if kept.id == source.id => {
                tracing::warn!(
                    "{} has the same id as {}",
                    source.source_path.display(),
                    kept.source_path.display()
                );
                let first = kept.source_path.clone();
                discovered.duplicates.push(DuplicateSource { source, first });
            }
            _ => discovered.sources.push(source),
        }
    }

    Ok(discovered)
}

/// Resolve a build target to a source file.
///
/// Returns `None` for missing files, directories, files outside the source
/// root and ineligible or excluded files.
pub fn resolve_target(
    config: &ResolvedConfig,
    target: &Path,
    stylesheet_extensions: &[&str],
) -> Option<SourceFile> {
    let path = fs::canonicalize(target).ok()?;
    if !path.is_file() {
        return None;
    }

    let root = fs::canonicalize(&config.guide_src).ok()?;
    classify(config, &root, &path, stylesheet_extensions)
}

/// Decide whether `path` (below `root`) is an eligible source.
fn classify(
    config: &ResolvedConfig,
    root: &Path,
    path: &Path,
    stylesheet_extensions: &[&str],
) -> Option<SourceFile> {
    let relative = path.strip_prefix(root).ok()?;
    let file_name = path.file_name()?.to_str()?;
    let extension = path.extension()?.to_str()?;

    let (kind, name) = if stylesheet_extensions.contains(&extension) {
        let name = file_name.strip_prefix(PARTIAL_MARKER)?;
        (SourceKind::Component, name)
    } else if GUIDE_EXTENSIONS.contains(&extension) {
        (SourceKind::Guide, file_name)
    } else {
        return None;
    };

    if config.is_excluded_source(file_name) {
        tracing::debug!("Excluded {}", path.display());
        return None;
    }

    let name = name
        .strip_suffix(extension)
        .and_then(|n| n.strip_suffix('.'))
        .unwrap_or(name)
        .to_string();
    if name.is_empty() {
        return None;
    }

    let category = relative
        .parent()
        .and_then(|parent| parent.file_name())
        .and_then(|dir| dir.to_str())
        .map(str::to_string);

    let id = match &category {
        Some(category) => format!("{}-{}", category, name),
        None => name.clone(),
    };

    Some(SourceFile {
        id,
        name,
        category,
        source_path: path.to_path_buf(),
        kind,
    })
}

/// Links to project stylesheets under `css_src`, relative to `guide_dest`.
pub fn project_stylesheets(config: &ResolvedConfig) -> Vec<String> {
    let Some(css_src) = config.css_src.as_ref() else {
        return Vec::new();
    };

    let Ok(css_root) = fs::canonicalize(css_src) else {
        tracing::warn!("CSS directory not found: {}", css_src.display());
        return Vec::new();
    };

    let dest = fs::canonicalize(&config.guide_dest).unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(&config.guide_dest))
            .unwrap_or_else(|_| config.guide_dest.clone())
    });

    let mut links: Vec<String> = WalkDir::new(&css_root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|ext| ext.to_str()) == Some("css"))
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !config.is_excluded_css(name)
        })
        .filter_map(|e| pathdiff::diff_paths(e.path(), &dest))
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();

    links.sort();
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const STYLESHEETS: &[&str] = &["scss", "css"];

    fn config_for(root: &Path) -> ResolvedConfig {
        ResolvedConfig::new(BuildConfig {
            guide_src: root.to_path_buf(),
            guide_dest: root.join("out"),
            excluded_sass_files: Some("^excluded".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn discovers_partials_and_guides() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("_button.scss"));
        touch(&root.join("main.scss"));
        touch(&root.join("_excluded.scss"));
        touch(&root.join("intro.md"));
        touch(&root.join("forms/_input.scss"));
        touch(&root.join("forms/notes.txt"));

        let sources = discover(&config_for(root), STYLESHEETS).unwrap().sources;
        let ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();

        assert_eq!(ids, vec!["button", "forms-input", "intro"]);
        assert_eq!(sources[0].kind, SourceKind::Component);
        assert_eq!(sources[0].category, None);
        assert_eq!(sources[1].category.as_deref(), Some("forms"));
        assert_eq!(sources[1].name, "input");
        assert_eq!(sources[2].kind, SourceKind::Guide);
    }

    #[test]
    fn category_is_immediate_parent() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("atoms/forms/_select.scss"));

        let sources = discover(&config_for(root), STYLESHEETS).unwrap().sources;

        assert_eq!(sources[0].id, "forms-select");
        assert_eq!(sources[0].file_name(), "forms-select.html");
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempdir().unwrap();

        let result = discover(&config_for(&temp.path().join("nope")), STYLESHEETS);

        assert!(matches!(result, Err(DiscoveryError::MissingRoot(_))));
    }

    #[test]
    fn resolves_only_eligible_targets() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("src");
        touch(&root.join("_card.scss"));
        touch(&root.join("_excluded.scss"));
        touch(&temp.path().join("_outside.scss"));
        let config = config_for(&root);

        let card = resolve_target(&config, &root.join("_card.scss"), STYLESHEETS).unwrap();
        assert_eq!(card.id, "card");

        let missing = root.join("_missing.scss");
        let outside = temp.path().join("_outside.scss");
        let excluded = root.join("_excluded.scss");
        for target in [&missing, &root, &excluded, &outside] {
            assert!(resolve_target(&config, target, STYLESHEETS).is_none(), "{}", target.display());
        }
    }

    #[test]
    fn stylesheet_extensions_follow_the_compiler() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("_button.scss"));
        touch(&root.join("_card.less"));

        let ids: Vec<String> = discover(&config_for(root), &["less"])
            .unwrap()
            .sources
            .into_iter()
            .map(|s| s.id)
            .collect();

        assert_eq!(ids, vec!["card"]);
        assert!(resolve_target(&config_for(root), &root.join("_button.scss"), &["less"]).is_none());
    }

    #[test]
    fn same_id_from_two_paths_is_a_duplicate() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("_button.css"));
        touch(&root.join("_button.scss"));
        touch(&root.join("forms/_input.scss"));
        touch(&root.join("atoms/forms/_input.scss"));

        let discovered = discover(&config_for(root), STYLESHEETS).unwrap();
        let root = fs::canonicalize(root).unwrap();

        let ids: Vec<&str> = discovered.sources.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["button", "forms-input"]);
        assert_eq!(discovered.sources[0].source_path, root.join("_button.css"));
        assert_eq!(discovered.sources[1].source_path, root.join("atoms/forms/_input.scss"));

        assert_eq!(discovered.duplicates.len(), 2);
        let scss = discovered.duplicate_of(&root.join("_button.scss")).unwrap();
        assert_eq!(scss.first, root.join("_button.css"));
        assert!(discovered.duplicate_of(&root.join("forms/_input.scss")).is_some());
        assert!(discovered.duplicate_of(&root.join("_button.css")).is_none());
    }

    #[test]
    fn links_project_stylesheets_relative_to_dest() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("css/project.css"));
        touch(&root.join("css/excluded.css"));
        touch(&root.join("css/readme.txt"));
        fs::create_dir_all(root.join("out")).unwrap();

        let config = ResolvedConfig::new(BuildConfig {
            guide_src: root.to_path_buf(),
            guide_dest: root.join("out"),
            css_src: Some(root.join("css")),
            excluded_css_files: Some("^excluded".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(project_stylesheets(&config), vec!["../css/project.css"]);
    }
}
