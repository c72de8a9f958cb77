//! Filesystem façade.
//!
//! The orchestrator never touches `std::fs` for directory bookkeeping
//! or the report; it goes through [`FileStore`] so the plumbing can be
//! swapped or instrumented. [`StdFileStore`] is the real thing.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::HarnessError;

/// Directory and file operations the harness depends on.
pub trait FileStore {
    /// Regular files directly inside `dir`, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Io`] if `dir` cannot be read.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, HarnessError>;

    /// Create `dir` (and parents) if absent. Existing contents are kept.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Io`] on failure.
    fn ensure_dir(&self, dir: &Path) -> Result<(), HarnessError>;

    /// Create `dir` if absent and remove everything inside it.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Io`] on failure.
    fn create_clean_dir(&self, dir: &Path) -> Result<(), HarnessError>;

    /// Move `src` to `dst`. Fails if `dst` already exists.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Io`] with [`io::ErrorKind::AlreadyExists`]
    /// if `dst` exists, or the underlying rename error.
    fn move_file(&self, src: &Path, dst: &Path) -> Result<(), HarnessError>;

    /// Append `text` plus a newline to `file`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Io`] on failure.
    fn append_line(&self, file: &Path, text: &str) -> Result<(), HarnessError>;

    /// Delete `file` if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Io`] if the file exists but cannot be removed.
    fn delete_file_if_exists(&self, file: &Path) -> Result<(), HarnessError>;
}

/// [`FileStore`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileStore;

impl FileStore for StdFileStore {
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| HarnessError::io(dir, e))? {
            let entry = entry.map_err(|e| HarnessError::io(dir, e))?;
            let file_type = entry.file_type().map_err(|e| HarnessError::io(entry.path(), e))?;
            if file_type.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn ensure_dir(&self, dir: &Path) -> Result<(), HarnessError> {
        fs::create_dir_all(dir).map_err(|e| HarnessError::io(dir, e))
    }

    fn create_clean_dir(&self, dir: &Path) -> Result<(), HarnessError> {
        match fs::remove_dir_all(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(HarnessError::io(dir, e)),
        }
        fs::create_dir_all(dir).map_err(|e| HarnessError::io(dir, e))
    }

    fn move_file(&self, src: &Path, dst: &Path) -> Result<(), HarnessError> {
        if dst.exists() {
            return Err(HarnessError::io(
                dst,
                io::Error::new(io::ErrorKind::AlreadyExists, "destination already exists"),
            ));
        }
        fs::rename(src, dst).map_err(|e| HarnessError::io(src, e))
    }

    fn append_line(&self, file: &Path, text: &str) -> Result<(), HarnessError> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .map_err(|e| HarnessError::io(file, e))?;
        writeln!(f, "{text}").map_err(|e| HarnessError::io(file, e))
    }

    fn delete_file_if_exists(&self, file: &Path) -> Result<(), HarnessError> {
        match fs::remove_file(file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HarnessError::io(file, e)),
        }
    }
}
