//! File watching and preview serving for specimen style guides.
//!
//! The watcher turns filesystem events below the source root into
//! single-file rebuild requests. The preview server serves the built guide.

pub mod server;
pub mod watcher;

pub use server::{PreviewConfig, PreviewServer, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
