//! Style guide builder for specimen.
//!
//! Turns a tree of stylesheet partials and markdown guides into one HTML page
//! each, plus an index. Pages are written only when their content changes.

pub mod assets;
pub mod builder;
pub mod config;
pub mod discovery;
pub mod templates;
pub mod writer;

pub use builder::{BuildError, BuildReport, Component, ComponentFailure, GuideBuilder};
pub use config::{BuildConfig, ConfigError, ResolvedConfig};
pub use discovery::{Discovered, DuplicateSource, SourceFile, SourceKind};
pub use templates::{TemplateEngine, TemplateError};
pub use writer::{write_if_changed, WriteError, WriteOutcome};
