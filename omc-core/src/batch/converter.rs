//! Sequential driver for the convert/upgrade pipeline.

use super::job::BatchJob;
use super::progress::{BatchEvent, BatchStatus, Progress};
use super::report::{BatchReport, StepRecord, StepStatus};
use crate::config::FailurePolicy;
use crate::error::{ConvertError, Result};
use crate::process::{CancelToken, Step, StepRunner};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Runs every file of a job through both tools, one process at a time.
#[derive(Debug)]
pub struct BatchConverter<R> {
    runner: R,
}

impl<R: StepRunner> BatchConverter<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Run the job on the current thread.
    ///
    /// Events go to `events`; a dropped receiver is ignored. Tool failures end
    /// up in the report rather than in an `Err`.
    pub fn run(
        &self,
        job: &BatchJob,
        events: &Sender<BatchEvent>,
        cancel: &CancelToken,
    ) -> BatchReport {
        let policy = job.config().policy;
        let mut progress = Progress::new(job.total_steps());
        let mut report = BatchReport::new(policy, progress);
        let mut cancelled = false;

        emit(events, BatchEvent::Started {
            total: progress.total,
        });
        info!(
            "Converting {} file(s), {} steps, policy {}",
            job.files().len(),
            progress.total,
            policy
        );

        'files: for (index, source) in job.files().iter().enumerate() {
            info!("Processing: {}", source.display());
            let mesh = job.converted_for(source);
            let plan = [(Step::Convert, source.as_path()), (Step::Upgrade, mesh.as_path())];
            let mut file_failed = false;

            for (step, input) in plan {
                if file_failed {
                    debug!("Skipping {} step for {}", step, input.display());
                    progress.advance();
                    report.steps.push(StepRecord::skipped(input.to_path_buf(), step));
                    emit(events, BatchEvent::StepFinished {
                        step,
                        source: input.to_path_buf(),
                        progress,
                    });
                    continue;
                }
                if cancel.is_cancelled() {
                    cancelled = true;
                    break 'files;
                }

                emit(events, BatchEvent::StepStarted {
                    index,
                    step,
                    source: input.to_path_buf(),
                });
                let destination = job.destination_for(input);

                match self.run_step(step, input, destination.as_deref(), cancel) {
                    Ok(()) => {
                        progress.advance();
                        report.steps.push(StepRecord::succeeded(input.to_path_buf(), step));
                        emit(events, BatchEvent::StepFinished {
                            step,
                            source: input.to_path_buf(),
                            progress,
                        });
                    }
                    Err(ConvertError::Cancelled) => {
                        cancelled = true;
                        break 'files;
                    }
                    Err(err) => {
                        error!("{}", err);
                        report.steps.push(StepRecord::failed(input.to_path_buf(), step, &err));
                        report.note_error(&err);
                        emit(events, BatchEvent::StepFailed {
                            step,
                            source: input.to_path_buf(),
                            error: err.to_string(),
                        });
                        match policy {
                            FailurePolicy::AbortOnError => break 'files,
                            FailurePolicy::BestEffort => {
                                progress.advance();
                                emit(events, BatchEvent::StepFinished {
                                    step,
                                    source: input.to_path_buf(),
                                    progress,
                                });
                                file_failed = true;
                            }
                        }
                    }
                }
            }
        }

        report.progress = progress;
        report.status = if cancelled {
            report.note_error(&ConvertError::Cancelled);
            BatchStatus::Cancelled
        } else if report.error.is_some() {
            BatchStatus::Failed
        } else {
            BatchStatus::Completed
        };

        info!(
            "Batch {}: {} step(s), {} process(es) launched",
            report.status,
            progress,
            report.launched()
        );
        emit(events, BatchEvent::Finished(report.status));
        report
    }

    /// Run one tool and turn a failing exit status into an error.
    fn run_step(
        &self,
        step: Step,
        input: &Path,
        destination: Option<&Path>,
        cancel: &CancelToken,
    ) -> Result<()> {
        let out = self.runner.run(step, input, destination, cancel)?;
        if out.success() {
            return Ok(());
        }
        for line in out.output.lines() {
            warn!("{}: {}", step, line);
        }
        Err(ConvertError::NonZeroExit {
            step,
            path: input.to_path_buf(),
            code: out.exit_code,
        })
    }
}

impl<R: StepRunner + 'static> BatchConverter<R> {
    /// Run the job on a background worker thread.
    pub fn spawn(self, job: BatchJob) -> Result<BatchHandle> {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let worker = thread::Builder::new()
            .name("omc-batch".to_string())
            .spawn(move || self.run(&job, &tx, &worker_cancel))?;
        Ok(BatchHandle {
            events: rx,
            cancel,
            worker,
        })
    }
}

fn emit(events: &Sender<BatchEvent>, event: BatchEvent) {
    let _ = events.send(event);
}

/// Controller side of a batch running on a worker thread.
#[derive(Debug)]
pub struct BatchHandle {
    events: Receiver<BatchEvent>,
    cancel: CancelToken,
    worker: JoinHandle<BatchReport>,
}

impl BatchHandle {
    /// Event stream. It ends after `BatchEvent::Finished`.
    pub fn events(&self) -> &Receiver<BatchEvent> {
        &self.events
    }

    /// Ask the worker to stop. The running tool is killed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Feed every event to `on_event` until the worker finishes, then return its report.
    pub fn wait_with<F: FnMut(&BatchEvent)>(self, mut on_event: F) -> Result<BatchReport> {
        for event in self.events.iter() {
            on_event(&event);
        }
        self.join()
    }

    /// Wait for the worker and return its report.
    pub fn join(self) -> Result<BatchReport> {
        self.worker.join().map_err(|_| ConvertError::WorkerPanicked)
    }
}

/// Files a report says were fully converted and upgraded.
pub fn converted_files(report: &BatchReport) -> Vec<PathBuf> {
    report
        .steps
        .iter()
        .filter(|s| s.step == Step::Upgrade && s.status == StepStatus::Succeeded)
        .map(|s| s.input.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BatchConfig;
    use crate::process::StepOutput;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Call = (Step, PathBuf, Option<PathBuf>);

    /// Records every invocation and fails the ones listed in `failing`.
    #[derive(Default, Clone)]
    struct ScriptedRunner {
        calls: Arc<Mutex<Vec<Call>>>,
        failing: HashMap<(Step, PathBuf), i32>,
        unlaunchable: Option<(Step, PathBuf)>,
        cancel_after: Option<usize>,
    }

    impl ScriptedRunner {
        fn failing(mut self, step: Step, path: &str, code: i32) -> Self {
            self.failing.insert((step, PathBuf::from(path)), code);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl StepRunner for ScriptedRunner {
        fn run(
            &self,
            step: Step,
            source: &Path,
            destination: Option<&Path>,
            cancel: &CancelToken,
        ) -> Result<StepOutput> {
            let mut calls = self.calls.lock().unwrap();
            calls.push((step, source.to_path_buf(), destination.map(Path::to_path_buf)));
            if Some(calls.len()) == self.cancel_after {
                cancel.cancel();
                return Err(ConvertError::Cancelled);
            }
            if self.unlaunchable == Some((step, source.to_path_buf())) {
                return Err(ConvertError::Launch {
                    program: "/bin/sh".to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                });
            }
            let code = self
                .failing
                .get(&(step, source.to_path_buf()))
                .copied()
                .unwrap_or(0);
            Ok(StepOutput {
                exit_code: Some(code),
                output: if code == 0 { String::new() } else { "Error".to_string() },
            })
        }
    }

    fn job(files: &[&str], config: BatchConfig) -> BatchJob {
        BatchJob::new(files.iter().map(PathBuf::from).collect(), config).unwrap()
    }

    fn run(runner: &ScriptedRunner, job: &BatchJob) -> (BatchReport, Vec<BatchEvent>) {
        let (tx, rx) = mpsc::channel();
        let report = BatchConverter::new(runner).run(job, &tx, &CancelToken::new());
        drop(tx);
        (report, rx.iter().collect())
    }

    fn progress_events(events: &[BatchEvent]) -> Vec<usize> {
        events
            .iter()
            .filter_map(|e| match e {
                BatchEvent::StepFinished { progress, .. } => Some(progress.done),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_two_files_all_succeed() {
        let runner = ScriptedRunner::default();
        let job = job(&["/m/a.mesh.xml", "/m/b.mesh.xml"], BatchConfig::new("/ogre"));
        let (report, events) = run(&runner, &job);

        assert_eq!(
            runner.calls(),
            vec![
                (Step::Convert, PathBuf::from("/m/a.mesh.xml"), None),
                (Step::Upgrade, PathBuf::from("/m/a.mesh"), None),
                (Step::Convert, PathBuf::from("/m/b.mesh.xml"), None),
                (Step::Upgrade, PathBuf::from("/m/b.mesh"), None),
            ]
        );
        assert_eq!(report.status, BatchStatus::Completed);
        assert_eq!(report.progress, Progress { done: 4, total: 4 });
        assert_eq!(report.launched(), 4);
        assert_eq!(progress_events(&events), vec![1, 2, 3, 4]);
        assert_eq!(events.first(), Some(&BatchEvent::Started { total: 4 }));
        assert_eq!(
            events.last(),
            Some(&BatchEvent::Finished(BatchStatus::Completed))
        );
        assert_eq!(
            converted_files(&report),
            vec![PathBuf::from("/m/a.mesh"), PathBuf::from("/m/b.mesh")]
        );
    }

    #[test]
    fn test_output_dir_passed_to_both_steps() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::default();
        let job = job(
            &["/a/b/model.mesh.xml"],
            BatchConfig::new("/ogre").with_output_dir(tmp.path()),
        );
        let (report, _) = run(&runner, &job);

        let mesh = tmp.path().join("model.mesh");
        assert_eq!(
            runner.calls(),
            vec![
                (
                    Step::Convert,
                    PathBuf::from("/a/b/model.mesh.xml"),
                    Some(mesh.clone())
                ),
                (Step::Upgrade, mesh.clone(), Some(mesh)),
            ]
        );
        assert!(report.status.is_success());
    }

    #[test]
    fn test_convert_failure_aborts() {
        let runner = ScriptedRunner::default().failing(Step::Convert, "/m/a.mesh.xml", 1);
        let job = job(&["/m/a.mesh.xml"], BatchConfig::new("/ogre"));
        let (report, events) = run(&runner, &job);

        assert_eq!(runner.calls().len(), 1);
        assert_eq!(report.status, BatchStatus::Failed);
        assert_eq!(report.progress.done, 0);
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.steps[0].exit_code, Some(1));
        assert!(events
            .iter()
            .any(|e| matches!(e, BatchEvent::StepFailed { step: Step::Convert, .. })));
        assert_eq!(
            events.last(),
            Some(&BatchEvent::Finished(BatchStatus::Failed))
        );
    }

    #[test]
    fn test_failure_at_step_k_launches_nothing_after() {
        let files = ["/m/a.mesh.xml", "/m/b.mesh.xml", "/m/c.mesh.xml"];
        for k in 0..6 {
            let (step, path) = if k % 2 == 0 {
                (Step::Convert, files[k / 2].to_string())
            } else {
                (Step::Upgrade, files[k / 2].trim_end_matches(".xml").to_string())
            };
            let runner = ScriptedRunner::default().failing(step, &path, 2);
            let (report, events) = run(&runner, &job(&files, BatchConfig::new("/ogre")));

            assert_eq!(runner.calls().len(), k + 1, "failing step {}", k);
            assert_eq!(report.status, BatchStatus::Failed);
            assert_eq!(report.progress.done, k);
            let progress = progress_events(&events);
            assert!(progress.windows(2).all(|w| w[1] == w[0] + 1));
        }
    }

    #[test]
    fn test_best_effort_continues() {
        let runner = ScriptedRunner::default().failing(Step::Convert, "/m/a.mesh.xml", 1);
        let config = BatchConfig::new("/ogre").with_policy(FailurePolicy::BestEffort);
        let (report, events) = run(&runner, &job(&["/m/a.mesh.xml", "/m/b.mesh.xml"], config));

        assert_eq!(
            runner.calls(),
            vec![
                (Step::Convert, PathBuf::from("/m/a.mesh.xml"), None),
                (Step::Convert, PathBuf::from("/m/b.mesh.xml"), None),
                (Step::Upgrade, PathBuf::from("/m/b.mesh"), None),
            ]
        );
        assert_eq!(report.status, BatchStatus::Failed);
        assert_eq!(report.progress, Progress { done: 4, total: 4 });
        assert_eq!(report.launched(), 3);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(progress_events(&events), vec![1, 2, 3, 4]);
        assert_eq!(converted_files(&report), vec![PathBuf::from("/m/b.mesh")]);
    }

    #[test]
    fn test_best_effort_records_launch_failure() {
        let runner = ScriptedRunner {
            unlaunchable: Some((Step::Upgrade, PathBuf::from("/m/a.mesh"))),
            ..Default::default()
        };
        let config = BatchConfig::new("/ogre").with_policy(FailurePolicy::BestEffort);
        let (report, _) = run(&runner, &job(&["/m/a.mesh.xml", "/m/b.mesh.xml"], config));

        assert_eq!(runner.calls().len(), 4);
        assert_eq!(report.status, BatchStatus::Failed);
        assert_eq!(report.error_code, Some(100));
        assert_eq!(report.failures().next().unwrap().exit_code, None);
    }

    #[test]
    fn test_launch_failure_aborts() {
        let runner = ScriptedRunner {
            unlaunchable: Some((Step::Convert, PathBuf::from("/m/a.mesh.xml"))),
            ..Default::default()
        };
        let job = job(&["/m/a.mesh.xml", "/m/b.mesh.xml"], BatchConfig::new("/ogre"));
        let (report, _) = run(&runner, &job);
        assert_eq!(runner.calls().len(), 1);
        assert_eq!(report.status, BatchStatus::Failed);
    }

    #[test]
    fn test_cancel_stops_batch() {
        let runner = ScriptedRunner {
            cancel_after: Some(2),
            ..Default::default()
        };
        let job = job(&["/m/a.mesh.xml", "/m/b.mesh.xml"], BatchConfig::new("/ogre"));
        let (report, events) = run(&runner, &job);

        assert_eq!(runner.calls().len(), 2);
        assert_eq!(report.status, BatchStatus::Cancelled);
        assert_eq!(report.progress.done, 1);
        assert_eq!(
            events.last(),
            Some(&BatchEvent::Finished(BatchStatus::Cancelled))
        );
    }

    #[test]
    fn test_pre_cancelled_launches_nothing() {
        let runner = ScriptedRunner::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let (tx, _rx) = mpsc::channel();
        let report = BatchConverter::new(&runner).run(
            &job(&["/m/a.mesh.xml"], BatchConfig::new("/ogre")),
            &tx,
            &cancel,
        );
        assert!(runner.calls().is_empty());
        assert_eq!(report.status, BatchStatus::Cancelled);
    }

    /// Every tool ends as if killed by a signal.
    struct SignalledRunner;

    impl StepRunner for SignalledRunner {
        fn run(
            &self,
            _step: Step,
            _source: &Path,
            _destination: Option<&Path>,
            _cancel: &CancelToken,
        ) -> Result<StepOutput> {
            Ok(StepOutput {
                exit_code: None,
                output: String::new(),
            })
        }
    }

    #[test]
    fn test_signalled_tool_fails_step() {
        let (tx, _rx) = mpsc::channel();
        let job = job(&["/m/a.mesh.xml"], BatchConfig::new("/ogre"));
        let report = BatchConverter::new(SignalledRunner).run(&job, &tx, &CancelToken::new());

        assert_eq!(report.status, BatchStatus::Failed);
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.steps[0].status, StepStatus::Failed);
        assert_eq!(report.steps[0].exit_code, None);
        assert!(report.error.as_deref().unwrap().contains("terminated by signal"));
    }

    #[test]
    fn test_spawn_drains_events() {
        let runner = ScriptedRunner::default();
        let calls = runner.calls.clone();
        let handle = BatchConverter::new(runner)
            .spawn(job(&["/m/a.mesh.xml", "/m/b.mesh.xml"], BatchConfig::new("/ogre")))
            .unwrap();

        let mut seen = Vec::new();
        let report = handle.wait_with(|e| seen.push(e.clone())).unwrap();

        assert_eq!(report.status, BatchStatus::Completed);
        assert_eq!(calls.lock().unwrap().len(), 4);
        assert_eq!(progress_events(&seen), vec![1, 2, 3, 4]);
        assert_eq!(seen.last(), Some(&BatchEvent::Finished(BatchStatus::Completed)));
    }
}
