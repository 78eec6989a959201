//! Outcome of a finished batch.

use super::progress::{BatchStatus, Progress};
use crate::config::FailurePolicy;
use crate::error::ConvertError;
use crate::process::Step;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened to one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Succeeded,
    Failed,
    /// Not launched because an earlier step for the same file failed.
    Skipped,
}

/// One attempted (or skipped) step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// The tool's input file.
    pub input: PathBuf,
    pub step: Step,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepRecord {
    pub fn succeeded(input: PathBuf, step: Step) -> Self {
        Self {
            input,
            step,
            status: StepStatus::Succeeded,
            exit_code: Some(0),
            error: None,
        }
    }

    pub fn failed(input: PathBuf, step: Step, err: &ConvertError) -> Self {
        let exit_code = match err {
            ConvertError::NonZeroExit { code, .. } => *code,
            _ => None,
        };
        Self {
            input,
            step,
            status: StepStatus::Failed,
            exit_code,
            error: Some(err.to_string()),
        }
    }

    pub fn skipped(input: PathBuf, step: Step) -> Self {
        Self {
            input,
            step,
            status: StepStatus::Skipped,
            exit_code: None,
            error: None,
        }
    }

    /// Whether a process was actually launched for this step.
    pub fn launched(&self) -> bool {
        self.status != StepStatus::Skipped
    }
}

/// Final status, progress and per-step history of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub status: BatchStatus,
    pub policy: FailurePolicy,
    pub progress: Progress,
    pub steps: Vec<StepRecord>,
    /// First error encountered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
}

impl BatchReport {
    pub(crate) fn new(policy: FailurePolicy, progress: Progress) -> Self {
        Self {
            status: BatchStatus::Completed,
            policy,
            progress,
            steps: Vec::new(),
            error: None,
            error_code: None,
        }
    }

    /// Keep the first error only.
    pub(crate) fn note_error(&mut self, err: &ConvertError) {
        if self.error.is_none() {
            self.error = Some(err.to_string());
            self.error_code = Some(err.code_value());
        }
    }

    /// Number of processes launched.
    pub fn launched(&self) -> usize {
        self.steps.iter().filter(|s| s.launched()).count()
    }

    /// Steps that failed.
    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
    }
}
