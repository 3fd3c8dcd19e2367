//! Stylesheet compilation and component statistics.
//!
//! Compiles a single component stylesheet, walks the parsed CSS for rules and
//! declarations, and measures the data URIs embedded in background and
//! font-face sources.

pub mod compiler;
pub mod data_uri;
pub mod extract;
pub mod format;

pub use compiler::{CompileError, LightningCompiler, StylesheetCompiler};
pub use data_uri::{
    analyze, measure_uris, parse_data_uri, DataUriEntry, DataUriSummary, DataUriTotal,
    ParsedDataUri,
};
pub use extract::{collect_stats, extract, CompiledStylesheet, ComponentStats, PropertyUsage};
pub use format::format_bytes;
