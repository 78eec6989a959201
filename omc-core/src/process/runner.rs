//! Running one logical step as a child process.

use super::command::{Shell, Step, ToolSet};
use crate::config::{SEARCH_PATH_VAR, WAIT_POLL_MS};
use crate::error::{ConvertError, Result};
use std::io::Read;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// Shared flag used to stop a running batch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Running children are killed at the next poll.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Exit status and merged output of a finished tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    /// `None` when the tool was terminated by a signal.
    pub exit_code: Option<i32>,
    /// stdout and stderr, merged.
    pub output: String,
}

impl StepOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs one step of the pipeline on a pair of paths.
///
/// Returns `Err` only when the tool could not be run at all (launch failure or
/// cancellation). A tool that ran and failed yields `Ok` with a non-zero exit code.
pub trait StepRunner: Send {
    fn run(
        &self,
        step: Step,
        source: &Path,
        destination: Option<&Path>,
        cancel: &CancelToken,
    ) -> Result<StepOutput>;
}

impl<R: StepRunner + Sync + ?Sized> StepRunner for &R {
    fn run(
        &self,
        step: Step,
        source: &Path,
        destination: Option<&Path>,
        cancel: &CancelToken,
    ) -> Result<StepOutput> {
        (**self).run(step, source, destination, cancel)
    }
}

impl<R: StepRunner + ?Sized> StepRunner for Box<R> {
    fn run(
        &self,
        step: Step,
        source: &Path,
        destination: Option<&Path>,
        cancel: &CancelToken,
    ) -> Result<StepOutput> {
        (**self).run(step, source, destination, cancel)
    }
}

/// Launches the Ogre tools through the host shell.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: Shell,
    tools: ToolSet,
    search_path: String,
}

impl ShellRunner {
    pub fn new(shell: Shell, tools: ToolSet, search_path: impl Into<String>) -> Self {
        Self {
            shell,
            tools,
            search_path: search_path.into(),
        }
    }

    /// Runner for the host shell with the default tool names.
    pub fn host(search_path: impl Into<String>) -> Self {
        let shell = Shell::host();
        Self::new(shell, ToolSet::for_shell(shell), search_path)
    }

    /// Command line a step would run, as handed to the shell.
    pub fn command_line(&self, step: Step, source: &Path, destination: Option<&Path>) -> String {
        self.tools.get(step).render(self.shell, source, destination)
    }
}

impl StepRunner for ShellRunner {
    fn run(
        &self,
        step: Step,
        source: &Path,
        destination: Option<&Path>,
        cancel: &CancelToken,
    ) -> Result<StepOutput> {
        let line = self.command_line(step, source, destination);
        debug!("{}: {}", step, line);

        let mut child = self
            .shell
            .command(&line)
            .env(SEARCH_PATH_VAR, &self.search_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ConvertError::Launch {
                program: self.shell.program().to_string(),
                source,
            })?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Ok(status),
                Ok(None) if cancel.is_cancelled() => {
                    debug!("Killing {} step for {}", step, source.display());
                    break Err(ConvertError::Cancelled);
                }
                Ok(None) => thread::sleep(Duration::from_millis(WAIT_POLL_MS)),
                Err(err) => break Err(ConvertError::Io(err)),
            }
        };
        if status.is_err() {
            let _ = child.kill();
            let _ = child.wait();
        }

        let mut output = collect(stdout);
        output.push_str(&collect(stderr));

        status.map(|status| StepOutput {
            exit_code: status.code(),
            output,
        })
    }
}

/// Read a pipe to the end on its own thread so the child never blocks on a full pipe.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
