//! Incremental output writer.
//!
//! Pages are only written when their content differs from what is on disk,
//! so an unchanged rebuild touches nothing. Writes go through a temporary
//! file in the destination directory that is renamed into place; readers
//! see either the old or the new content, never a partial file. A replaced
//! file keeps its permissions; a new one gets the mode `fs::write` would give
//! it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// What happened to a destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

impl WriteOutcome {
    pub fn written(self) -> bool {
        self == WriteOutcome::Written
    }
}

/// Errors that can occur while writing output.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read existing {path}: {source}")]
    ReadExisting {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Write `content` to `dest` unless it already holds exactly that content.
pub fn write_if_changed(dest: &Path, content: &str) -> Result<WriteOutcome, WriteError> {
    let permissions = match fs::read(dest) {
        Ok(existing) if existing == content.as_bytes() => return Ok(WriteOutcome::Unchanged),
        Ok(_) => fs::metadata(dest).ok().map(|m| m.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            return Err(WriteError::ReadExisting {
                path: dest.to_path_buf(),
                source: e,
            })
        }
    };

    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| WriteError::CreateDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let write_err = |e: io::Error| WriteError::Write {
        path: dest.to_path_buf(),
        source: e,
    };

    let mut tmp = temp_file_in(dir).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    if let Some(permissions) = permissions {
        tmp.as_file().set_permissions(permissions).map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(dest).map_err(|e| write_err(e.error))?;

    Ok(WriteOutcome::Written)
}

/// Temporary file created with the umask applied, like a plain `fs::write`.
#[cfg(unix)]
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    tempfile::Builder::new()
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    NamedTempFile::new_in(dir)
}
