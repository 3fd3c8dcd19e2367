//! Preview server command.

use std::path::Path;

use anyhow::Result;
use specimen_static::BuildConfig;
use specimen_watch::{PreviewConfig, PreviewServer};

/// Run the serve command.
pub async fn run(config_path: &Path, port: u16, open: bool) -> Result<()> {
    let config = BuildConfig::load_or_default(config_path)?;

    let preview = PreviewConfig {
        root: config.guide_dest,
        port,
        open,
        ..Default::default()
    };

    PreviewServer::new(preview).start().await?;

    Ok(())
}
