//! Progress snapshots and the events a running batch emits.

use crate::process::Step;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Completed steps out of the batch total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self { done: 0, total }
    }

    /// Count one more finished step. Never moves past `total`.
    pub fn advance(&mut self) {
        if self.done < self.total {
            self.done += 1;
        }
    }

    /// Fraction done, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.done as f64 / self.total as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.done == self.total
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.done, self.total)
    }
}

/// Terminal state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Every step of every file succeeded.
    Completed,
    /// At least one step failed.
    Failed,
    /// Stopped through the cancel token.
    Cancelled,
}

impl BatchStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchStatus::Completed)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Completed => write!(f, "completed"),
            BatchStatus::Failed => write!(f, "failed"),
            BatchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Messages pushed from the worker to whoever drives the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// The batch is about to run `total` steps.
    Started { total: usize },
    /// A tool is being launched on `source` (0-based file `index`).
    StepStarted {
        index: usize,
        step: Step,
        source: PathBuf,
    },
    /// A step finished or was skipped, and progress moved.
    StepFinished {
        step: Step,
        source: PathBuf,
        progress: Progress,
    },
    /// A step failed.
    StepFailed {
        step: Step,
        source: PathBuf,
        error: String,
    },
    /// Always the last event.
    Finished(BatchStatus),
}
