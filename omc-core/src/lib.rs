//! omc-core - Core library for batch conversion of Ogre mesh XML files.
//!
//! Each input `*.mesh.xml` goes through two external tools, one process at a
//! time: `OgreXMLConverter` produces a binary `.mesh`, then `OgreMeshUpgrader`
//! brings that mesh to the current format version. Progress is reported over a
//! channel and the batch ends with a [`BatchReport`].
//!
//! # Example
//!
//! ```no_run
//! use omc_core::{BatchConfig, BatchConverter, BatchEvent, FileList, ShellRunner};
//!
//! let mut files = FileList::new();
//! files.add("models/crate.mesh.xml").unwrap();
//!
//! let config = BatchConfig::new("/opt/ogre/bin:/usr/bin").with_output_dir("out");
//! let job = files.to_job(config).unwrap();
//! let runner = ShellRunner::host(job.config().search_path.clone());
//!
//! let handle = BatchConverter::new(runner).spawn(job).unwrap();
//! let report = handle
//!     .wait_with(|event| {
//!         if let BatchEvent::StepFinished { progress, .. } = event {
//!             println!("{}", progress);
//!         }
//!     })
//!     .unwrap();
//! println!("{}", report.status);
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod files;
pub mod paths;
pub mod process;
pub mod settings;

// Re-exports for convenience
pub use batch::{
    BatchConverter, BatchEvent, BatchHandle, BatchJob, BatchReport, BatchStatus, Progress,
    StepRecord, StepStatus,
};
pub use config::{BatchConfig, FailurePolicy};
pub use error::{ConvertError, ErrorCode, Result};
pub use files::FileList;
pub use process::{
    CancelToken, Shell, ShellRunner, Step, StepOutput, StepRunner, ToolCommand, ToolSet,
};
pub use settings::Settings;

/// Convert a list of mesh XML files with the host's Ogre tools.
///
/// This is the blocking, all-in-one entry point:
/// 1. Snapshot the files and configuration into a [`BatchJob`]
/// 2. Run every file through convert then upgrade on the current thread
/// 3. Return the report
///
/// # Arguments
///
/// * `files` - Input `*.mesh.xml` paths, in processing order
/// * `config` - Search path, output directory and failure policy
pub fn convert_files(files: &FileList, config: BatchConfig) -> Result<BatchReport> {
    let job = files.to_job(config)?;
    let runner = ShellRunner::host(job.config().search_path.clone());
    let (tx, _rx) = std::sync::mpsc::channel();
    Ok(BatchConverter::new(runner).run(&job, &tx, &CancelToken::new()))
}
