//! Output tree writer.
//!
//! Files are written to a sibling temporary file and renamed into place, so
//! a reader (or an interrupted run) never sees a half-written tile.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::TileError;

/// Suffix of in-progress files.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Root directory of an export.
#[derive(Debug, Clone)]
pub struct OutputTree {
    root: PathBuf,
}

impl OutputTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute (or root-relative) location of `relative`.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Create `relative` and its parents if missing.
    pub fn create_dir(&self, relative: &Path) -> Result<PathBuf, TileError> {
        let path = self.resolve(relative);
        fs::create_dir_all(&path).map_err(|source| TileError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Write `data` to `relative`, replacing any existing file.
    pub fn write_atomic(&self, relative: &Path, data: &[u8]) -> Result<PathBuf, TileError> {
        let path = self.resolve(relative);
        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| TileError::Write { path, source }
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err(parent))?;
        }

        let mut temp = path.clone().into_os_string();
        temp.push(TEMP_SUFFIX);
        let temp = PathBuf::from(temp);

        fs::write(&temp, data).map_err(write_err(&temp))?;
        if let Err(source) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(TileError::Write { path, source });
        }
        Ok(path)
    }
}
