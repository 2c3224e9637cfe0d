//! Durable line-oriented stores.
//!
//! Both stores keep their full contents in memory and rewrite the backing
//! file atomically on every mutation (write to a sibling temp file, then
//! rename over the original). A crash mid-write can never leave a
//! half-written store behind.

use std::fs;
use std::io::Write;
use std::path::Path;

use sentinel_proto::MaskError;
use thiserror::Error;

mod forbidden;
mod owners;

pub use forbidden::{Action, ForbiddenEntry, ForbiddenStore};
pub use owners::OwnerStore;

/// Store mutation and persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An add targeted a mask already present.
    #[error("entry already present: {0}")]
    DuplicateEntry(String),

    /// A remove targeted a mask that is not present.
    #[error("no such entry: {0}")]
    NotFound(String),

    /// The mask failed structural validation.
    #[error(transparent)]
    InvalidMask(#[from] MaskError),

    /// Read or write failure against the backing file.
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Atomically replace `path` with `contents`.
///
/// Writes a temp file in the same directory, fsyncs it, then renames it
/// over the destination. Same-directory placement keeps the rename on one
/// filesystem.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read a store file's lines, skipping blanks. Returns an empty list when
/// the file does not exist yet.
fn read_lines(path: &Path) -> std::io::Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}
