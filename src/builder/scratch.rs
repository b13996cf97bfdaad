//! Scratch directory for probe sources and artifacts.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::probe::ProbeError;

/// Directory holding probe files, with a counter for unique names.
///
/// A temporary directory is removed when the scratch directory is dropped;
/// a persistent one is kept for inspection.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    _temp: Option<TempDir>,
    next: usize,
}

impl ScratchDir {
    /// Create a fresh temporary directory.
    pub fn temporary() -> Result<Self, ProbeError> {
        let temp = tempfile::Builder::new()
            .prefix("abiprobe-")
            .tempdir()
            .map_err(|e| ProbeError::io("failed to create scratch directory", e))?;

        Ok(ScratchDir {
            path: temp.path().to_path_buf(),
            _temp: Some(temp),
            next: 0,
        })
    }

    /// Use `path`, creating it if needed.
    pub fn persistent(path: impl Into<PathBuf>) -> Result<Self, ProbeError> {
        let path = path.into();
        std::fs::create_dir_all(&path).map_err(|e| {
            ProbeError::io(
                format!("failed to create scratch directory: {}", path.display()),
                e,
            )
        })?;

        Ok(ScratchDir {
            path,
            _temp: None,
            next: 0,
        })
    }

    /// Temporary unless `path` is given.
    pub fn from_config(path: Option<&Path>) -> Result<Self, ProbeError> {
        match path {
            Some(path) => ScratchDir::persistent(path),
            None => ScratchDir::temporary(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next unused file stem (`conftest_0`, `conftest_1`, ...).
    pub fn next_stem(&mut self) -> String {
        let stem = format!("conftest_{}", self.next);
        self.next += 1;
        stem
    }
}
