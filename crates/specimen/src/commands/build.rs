//! Style guide build command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use specimen_static::{BuildConfig, BuildReport, GuideBuilder};

/// Load the config file, or defaults when it does not exist.
pub fn load_builder(config_path: &Path) -> Result<GuideBuilder> {
    let config = BuildConfig::load_or_default(config_path)?;
    Ok(GuideBuilder::new(config)?)
}

/// Run the build command.
pub async fn run(config_path: &Path, target: Option<PathBuf>) -> Result<()> {
    let builder = load_builder(config_path)?;

    match &target {
        Some(target) => tracing::info!("Building {}...", target.display()),
        None => tracing::info!("Building style guide..."),
    }

    let report = builder.build(target.as_deref()).await?;

    tracing::info!("Output: {}", builder.config().guide_dest.display());
    check(&report)
}

/// Log every failed page; an error when there was at least one.
pub fn check(report: &BuildReport) -> Result<()> {
    for failure in &report.failures {
        tracing::error!("{} ({}): {}", failure.id, failure.source_path.display(), failure.error);
    }

    if !report.is_success() {
        anyhow::bail!("{} page(s) failed to build", report.failures.len());
    }

    Ok(())
}
