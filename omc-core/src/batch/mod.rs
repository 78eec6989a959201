//! Batch execution: job snapshot, sequential driver, progress and report.

mod converter;
mod job;
mod progress;
mod report;

pub use converter::{converted_files, BatchConverter, BatchHandle};
pub use job::BatchJob;
pub use progress::{BatchEvent, BatchStatus, Progress};
pub use report::{BatchReport, StepRecord, StepStatus};
