//! The immutable snapshot a batch runs on.

use crate::config::{BatchConfig, STEPS_PER_FILE};
use crate::error::{ConvertError, Result};
use crate::paths::{converted_path, destination_path};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Ordered input files plus the configuration captured when the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    files: Vec<PathBuf>,
    config: BatchConfig,
}

impl BatchJob {
    /// Create a job. Fails on an empty file list, a blank search path, a
    /// missing output directory, or two inputs that map to the same mesh.
    pub fn new(files: Vec<PathBuf>, config: BatchConfig) -> Result<Self> {
        if files.is_empty() {
            return Err(ConvertError::EmptyBatch);
        }
        if !config.has_search_path() {
            return Err(ConvertError::SearchPathNotSet);
        }
        if let Some(dir) = &config.output_dir {
            if !dir.is_dir() {
                return Err(ConvertError::OutputDirNotFound { path: dir.clone() });
            }
        }
        let job = Self { files, config };
        job.check_outputs()?;
        Ok(job)
    }

    /// With an output directory, `a/model.mesh.xml` and `b/model.mesh.xml`
    /// both land on `<out>/model.mesh`.
    fn check_outputs(&self) -> Result<()> {
        let mut seen: HashMap<PathBuf, &PathBuf> = HashMap::new();
        for source in &self.files {
            let mesh = self.converted_for(source);
            if let Some(first) = seen.get(&mesh) {
                return Err(ConvertError::DuplicateOutput {
                    path: mesh,
                    first: first.to_path_buf(),
                    second: source.clone(),
                });
            }
            seen.insert(mesh, source);
        }
        Ok(())
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Two steps per file.
    pub fn total_steps(&self) -> usize {
        self.files.len() * STEPS_PER_FILE
    }

    /// Destination argument for a tool input, if an output directory is set.
    pub fn destination_for(&self, input: &Path) -> Option<PathBuf> {
        self.config
            .output_dir
            .as_deref()
            .map(|dir| destination_path(dir, input))
    }

    /// Binary mesh the convert step produces for `source`.
    pub fn converted_for(&self, source: &Path) -> PathBuf {
        converted_path(source, self.config.output_dir.as_deref())
    }
}
