//! The editable list of input files selected before a run.

use crate::batch::BatchJob;
use crate::config::BatchConfig;
use crate::error::{ConvertError, Result};
use crate::paths::matches_filter;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Ordered set of absolute input paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    files: Vec<PathBuf>,
}

impl FileList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single file. Returns `false` if it was already listed.
    ///
    /// Names outside the `*.mesh.xml` filter are accepted with a warning.
    pub fn add(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let path = std::path::absolute(path.as_ref())?;
        if !path.is_file() {
            return Err(ConvertError::InputNotFound { path });
        }
        if !matches_filter(&path) {
            warn!("{} does not look like a mesh XML file", path.display());
        }
        if self.files.contains(&path) {
            debug!("Already listed: {}", path.display());
            return Ok(false);
        }
        self.files.push(path);
        Ok(true)
    }

    /// Add every `*.mesh.xml` file in a directory, in name order.
    ///
    /// Returns the number of files newly added.
    pub fn add_dir(&mut self, dir: impl AsRef<Path>, recursive: bool) -> Result<usize> {
        let dir = std::path::absolute(dir.as_ref())?;
        if !dir.is_dir() {
            return Err(ConvertError::InputNotFound { path: dir });
        }

        let walker = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .follow_links(true)
            .sort_by_file_name();

        let mut added = 0;
        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            if entry.file_type().is_file()
                && matches_filter(path)
                && !self.files.iter().any(|f| f == path)
            {
                self.files.push(path.to_path_buf());
                added += 1;
            }
        }
        debug!("Added {} file(s) from {}", added, dir.display());
        Ok(added)
    }

    /// Remove a file. Returns `false` if it was not listed.
    pub fn remove(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let target = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let before = self.files.len();
        self.files.retain(|f| *f != target);
        self.files.len() != before
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// An empty list cannot be converted.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.files
    }

    /// Snapshot the list into an immutable job.
    pub fn to_job(&self, config: BatchConfig) -> Result<BatchJob> {
        BatchJob::new(self.files.clone(), config)
    }
}
