//! Configuration constants and settings for the batch converter.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Suffix the display filter accepts for input files.
pub const MESH_XML_SUFFIX: &str = ".mesh.xml";

/// Trailing segment removed from an input name to get the binary mesh name.
pub const XML_SEGMENT: &str = ".xml";

/// Environment variable overridden in every child process.
pub const SEARCH_PATH_VAR: &str = "PATH";

/// XML to binary mesh converter on Windows hosts.
pub const WIN_CONVERT_PROGRAM: &str = "OgreXMLConverter.exe";

/// Mesh version upgrader on Windows hosts.
pub const WIN_UPGRADE_PROGRAM: &str = "OgreMeshUpgrader.exe";

/// XML to binary mesh converter on POSIX hosts.
pub const POSIX_CONVERT_PROGRAM: &str = "OgreXMLConverter";

/// Mesh version upgrader on POSIX hosts.
pub const POSIX_UPGRADE_PROGRAM: &str = "OgreMeshUpgrader";

/// Fixed flags passed to the converter (quiet mode).
pub const CONVERT_FLAGS: &[&str] = &["-q"];

/// Poll interval while waiting on a child process, in milliseconds.
pub const WAIT_POLL_MS: u64 = 25;

/// Number of external steps run per input file.
pub const STEPS_PER_FILE: usize = 2;

/// What to do when an external step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop the batch at the first failing step.
    #[default]
    AbortOnError,
    /// Log the failure, skip the rest of that file and keep going.
    BestEffort,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort-on-error" | "abort" | "strict" => Ok(FailurePolicy::AbortOnError),
            "best-effort" | "lenient" => Ok(FailurePolicy::BestEffort),
            other => Err(format!(
                "unknown failure policy '{}', expected 'abort-on-error' or 'best-effort'",
                other
            )),
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::AbortOnError => write!(f, "abort-on-error"),
            FailurePolicy::BestEffort => write!(f, "best-effort"),
        }
    }
}

/// Run-time configuration, captured once when a batch starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Value written to `PATH` for every child process.
    pub search_path: String,
    /// Where converted meshes go. `None` writes beside each input.
    pub output_dir: Option<PathBuf>,
    /// Failure handling.
    pub policy: FailurePolicy,
}

impl BatchConfig {
    /// Create a configuration with no output directory and the default policy.
    pub fn new(search_path: impl Into<String>) -> Self {
        Self {
            search_path: search_path.into(),
            output_dir: None,
            policy: FailurePolicy::default(),
        }
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set the failure policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Whether a usable search path is configured.
    pub fn has_search_path(&self) -> bool {
        !self.search_path.trim().is_empty()
    }
}
