//! Error types for batch mesh conversion.

use crate::process::Step;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for batch processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Nothing to convert (-1)
    EmptyBatch = -1,
    /// No search path configured (-2)
    SearchPathNotSet = -2,
    /// Input or output location missing (-3)
    NotFound = -3,
    /// Two inputs would write the same mesh (-4)
    DuplicateOutput = -4,
    /// External tool could not be started (E100)
    LaunchFailed = 100,
    /// External tool exited with a failure status (E101)
    NonZeroExit = 101,
    /// Batch cancelled before completion (E200)
    Cancelled = 200,
    /// Settings file unreadable or unwritable (E300)
    Settings = 300,
    /// Worker thread died (E400)
    Internal = 400,
}

/// Main error type for the batch converter.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("No input files to convert")]
    EmptyBatch,

    #[error("No PATH variable set")]
    SearchPathNotSet,

    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Output directory not found: {path}")]
    OutputDirNotFound { path: PathBuf },

    #[error("{first} and {second} would both be written to {path}")]
    DuplicateOutput {
        path: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{step} step failed for {path} (exit code {})", display_code(.code))]
    NonZeroExit {
        step: Step,
        path: PathBuf,
        code: Option<i32>,
    },

    #[error("Batch cancelled")]
    Cancelled,

    #[error("Settings error in {path}: {message}")]
    Settings { path: PathBuf, message: String },

    #[error("Batch worker panicked")]
    WorkerPanicked,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none, terminated by signal".to_string(),
    }
}

impl ConvertError {
    /// Get the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ConvertError::EmptyBatch => ErrorCode::EmptyBatch,
            ConvertError::SearchPathNotSet => ErrorCode::SearchPathNotSet,
            ConvertError::InputNotFound { .. } => ErrorCode::NotFound,
            ConvertError::OutputDirNotFound { .. } => ErrorCode::NotFound,
            ConvertError::DuplicateOutput { .. } => ErrorCode::DuplicateOutput,
            ConvertError::Launch { .. } => ErrorCode::LaunchFailed,
            ConvertError::NonZeroExit { .. } => ErrorCode::NonZeroExit,
            ConvertError::Cancelled => ErrorCode::Cancelled,
            ConvertError::Settings { .. } => ErrorCode::Settings,
            ConvertError::WorkerPanicked => ErrorCode::Internal,
            ConvertError::Io(_) => ErrorCode::LaunchFailed,
        }
    }

    /// Get the numeric error code value.
    pub fn code_value(&self) -> i32 {
        self.code() as i32
    }
}

/// Result type alias for converter operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero_exit_message() {
        let err = ConvertError::NonZeroExit {
            step: Step::Convert,
            path: PathBuf::from("/a/model.mesh.xml"),
            code: Some(1),
        };
        assert_eq!(
            err.to_string(),
            "convert step failed for /a/model.mesh.xml (exit code 1)"
        );
        assert_eq!(err.code_value(), 101);
    }

    #[test]
    fn test_signal_exit_message() {
        let err = ConvertError::NonZeroExit {
            step: Step::Upgrade,
            path: PathBuf::from("/a/model.mesh"),
            code: None,
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_codes() {
        assert_eq!(ConvertError::EmptyBatch.code(), ErrorCode::EmptyBatch);
        assert_eq!(ConvertError::SearchPathNotSet.code_value(), -2);
        assert_eq!(ConvertError::Cancelled.code(), ErrorCode::Cancelled);
        let launch = ConvertError::Launch {
            program: "/bin/sh".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(launch.code(), ErrorCode::LaunchFailed);
    }
}
