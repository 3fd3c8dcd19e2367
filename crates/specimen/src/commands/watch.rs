//! Watch command: rebuild pages as their sources change.

use std::path::Path;

use anyhow::{Context, Result};
use specimen_watch::{FileWatcher, WatchEvent};

use super::build::{check, load_builder};

/// Run the watch command.
pub async fn run(config_path: &Path) -> Result<()> {
    let builder = load_builder(config_path)?;

    let report = builder.build(None).await?;
    if let Err(e) = check(&report) {
        tracing::warn!("{}", e);
    }

    let src = builder.config().guide_src.clone();
    let (_watcher, mut rx) = FileWatcher::new(&[src.clone()])
        .with_context(|| format!("Failed to watch {}", src.display()))?;

    tracing::info!("Watching {} for changes", src.display());

    loop {
        let event = tokio::select! {
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        };

        // A removed page leaves the index and navigation stale
        let target = match &event {
            WatchEvent::Changed(path) => Some(path.as_path()),
            WatchEvent::Removed(_) => None,
        };

        tracing::info!("Changed: {}", event.path().display());

        match builder.build(target).await {
            Ok(report) => {
                if let Err(e) = check(&report) {
                    tracing::warn!("{}", e);
                }
            }
            Err(e) => tracing::error!("Build failed: {}", e),
        }
    }

    tracing::info!("Stopped watching");
    Ok(())
}
