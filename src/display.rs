//! Terminal progress bar fed from batch events.

use indicatif::{ProgressBar, ProgressStyle};
use omc_core::{BatchEvent, BatchStatus};
use std::path::Path;

const TEMPLATE: &str = "{bar:40.cyan/blue} {pos}/{len} {wide_msg}";

/// Mirrors batch progress on a progress bar. Hidden bars still track position.
pub struct ProgressDisplay {
    bar: ProgressBar,
    visible: bool,
}

impl ProgressDisplay {
    pub fn new(visible: bool) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            visible,
        }
    }

    pub fn handle(&mut self, event: &BatchEvent) {
        match event {
            BatchEvent::Started { total } => {
                if self.visible {
                    self.bar = ProgressBar::new(*total as u64);
                    if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
                        self.bar.set_style(style.progress_chars("=>-"));
                    }
                } else {
                    self.bar.set_length(*total as u64);
                }
            }
            BatchEvent::StepStarted { step, source, .. } => {
                self.bar.set_message(format!("{} {}", step, file_name(source)));
            }
            BatchEvent::StepFinished { progress, .. } => {
                self.bar.set_position(progress.done as u64);
            }
            BatchEvent::StepFailed { step, source, .. } => {
                self.bar
                    .set_message(format!("{} failed: {}", step, file_name(source)));
            }
            // finish_* jumps to the full length; a stopped batch keeps its position
            BatchEvent::Finished(BatchStatus::Completed) => {
                self.bar.finish_with_message(BatchStatus::Completed.to_string());
            }
            BatchEvent::Finished(status) => {
                self.bar.abandon_with_message(status.to_string());
            }
        }
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
