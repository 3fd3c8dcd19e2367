//! Stylesheet compilers.

use std::fs;
use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{ParserOptions, StyleSheet};

/// Errors that can occur while compiling a stylesheet.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Failed to read stylesheet {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Syntax error in {path}: {message}")]
    Syntax { path: PathBuf, message: String },
}

/// Turns a stylesheet source file into CSS text.
pub trait StylesheetCompiler: Send + Sync {
    /// Compiler identifier (e.g., "lightningcss")
    fn name(&self) -> &'static str;

    /// File extensions this compiler accepts
    fn extensions(&self) -> &[&'static str];

    /// Compile the stylesheet at `path` to CSS text.
    fn compile(&self, path: &Path) -> Result<String, CompileError>;
}

/// Compiler backed by lightningcss.
///
/// Handles plain CSS syntax in `.scss` and `.css` partials. Sass-only syntax
/// (variables, mixins) is rejected as a syntax error. Valid sources are
/// passed through unchanged, so URLs keep the form they were written in.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightningCompiler;

impl LightningCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Check CSS source text and return it. `path` is only used for error
    /// reporting.
    pub fn compile_source(&self, source: &str, path: &Path) -> Result<String, CompileError> {
        let options = ParserOptions {
            filename: path.display().to_string(),
            ..ParserOptions::default()
        };

        StyleSheet::parse(source, options).map_err(|e| CompileError::Syntax {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(source.to_string())
    }
}

impl StylesheetCompiler for LightningCompiler {
    fn name(&self) -> &'static str {
        "lightningcss"
    }

    fn extensions(&self) -> &[&'static str] {
        &["scss", "css"]
    }

    fn compile(&self, path: &Path) -> Result<String, CompileError> {
        let source = fs::read_to_string(path).map_err(|e| CompileError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.compile_source(&source, path)
    }
}
