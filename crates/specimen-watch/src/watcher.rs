//! File watching for incremental rebuilds.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Extensions of files that feed a build.
const WATCHED_EXTENSIONS: &[&str] = &["scss", "css", "md"];

/// Events for the same path closer together than this are dropped.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Source was created or modified
    Changed(PathBuf),

    /// Source was deleted
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Changed(path) | WatchEvent::Removed(path) => path,
        }
    }
}

/// File watcher for detecting source changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Watch the given paths recursively.
    ///
    /// Returns the watcher and a channel to receive events. Events stop when
    /// the watcher is dropped.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            match res {
                Ok(event) => {
                    let _ = sync_tx.send(event);
                }
                Err(e) => tracing::warn!("Watch error: {}", e),
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
                tracing::debug!("Watching {}", path.display());
            } else {
                tracing::warn!("Not watching missing path {}", path.display());
            }
        }

        std::thread::spawn(move || {
            let mut debouncer = Debouncer::new(DEBOUNCE);

            while let Ok(event) = sync_rx.recv() {
                let now = Instant::now();

                for path in event.paths {
                    let Some(watch_event) = classify_event(&path, &event.kind) else {
                        continue;
                    };

                    if !debouncer.accept(&path, now) {
                        continue;
                    }

                    if async_tx.blocking_send(watch_event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Drops repeated events for a path within a time window.
struct Debouncer {
    window: Duration,
    last_seen: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: HashMap::new(),
        }
    }

    /// Whether an event for `path` at `now` should be forwarded. Entries
    /// older than the window are dropped on every call.
    fn accept(&mut self, path: &Path, now: Instant) -> bool {
        let window = self.window;
        self.last_seen.retain(|_, last| now.duration_since(*last) < window);

        if self.last_seen.contains_key(path) {
            return false;
        }
        self.last_seen.insert(path.to_path_buf(), now);
        true
    }
}

/// Whether changes to this file can affect the guide.
pub fn is_watched(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| WATCHED_EXTENSIONS.contains(&ext))
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &EventKind) -> Option<WatchEvent> {
    if !is_watched(path) {
        return None;
    }

    match kind {
        EventKind::Create(_) | EventKind::Modify(_) => Some(WatchEvent::Changed(path.to_path_buf())),
        EventKind::Remove(_) => Some(WatchEvent::Removed(path.to_path_buf())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn classifies_source_events() {
        let scss = Path::new("/guide/_button.scss");

        assert_eq!(
            classify_event(scss, &EventKind::Create(CreateKind::File)),
            Some(WatchEvent::Changed(scss.to_path_buf()))
        );
        assert_eq!(
            classify_event(scss, &EventKind::Modify(ModifyKind::Any)),
            Some(WatchEvent::Changed(scss.to_path_buf()))
        );
        assert_eq!(
            classify_event(scss, &EventKind::Remove(RemoveKind::File)),
            Some(WatchEvent::Removed(scss.to_path_buf()))
        );
        assert_eq!(classify_event(scss, &EventKind::Access(AccessKind::Any)), None);
    }

    #[test]
    fn ignores_unrelated_files() {
        assert!(is_watched(Path::new("intro.md")));
        assert!(is_watched(Path::new("css/project.css")));
        assert!(!is_watched(Path::new("index.html")));
        assert!(!is_watched(Path::new(".DS_Store")));
        assert_eq!(
            classify_event(Path::new("a.swp"), &EventKind::Modify(ModifyKind::Any)),
            None
        );
    }

    #[test]
    fn debounces_per_path() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let start = Instant::now();
        let a = Path::new("_a.scss");
        let b = Path::new("_b.scss");

        assert!(debouncer.accept(a, start));
        assert!(!debouncer.accept(a, start + Duration::from_millis(50)));
        assert!(debouncer.accept(b, start + Duration::from_millis(50)));
        assert!(debouncer.accept(a, start + Duration::from_millis(150)));
    }

    #[test]
    fn forgets_paths_outside_the_window() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let start = Instant::now();

        for i in 0..10 {
            debouncer.accept(Path::new(&format!("_{}.scss", i)), start);
        }
        assert_eq!(debouncer.last_seen.len(), 10);

        assert!(debouncer.accept(Path::new("_late.scss"), start + Duration::from_millis(200)));
        assert_eq!(debouncer.last_seen.len(), 1);
    }

    #[tokio::test]
    async fn watches_file_changes() {
        let temp = tempdir().unwrap();
        let test_file = temp.path().join("_button.scss");

        let (watcher, mut rx) = FileWatcher::new(&[temp.path().to_path_buf()]).unwrap();

        // Give the backend time to set up
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(&test_file, ".button { color: red; }").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;

        drop(watcher);

        let event = event
            .expect("timeout waiting for file watch event")
            .expect("channel should not be closed");
        assert_eq!(event.path().file_name(), test_file.file_name());
    }
}
