//! Command templates and the host shell used to launch them.

use crate::config::{
    CONVERT_FLAGS, POSIX_CONVERT_PROGRAM, POSIX_UPGRADE_PROGRAM, WIN_CONVERT_PROGRAM,
    WIN_UPGRADE_PROGRAM,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

/// One of the two external tools run per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// XML description to binary mesh.
    Convert,
    /// Binary mesh to the current mesh format version.
    Upgrade,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Convert => write!(f, "convert"),
            Step::Upgrade => write!(f, "upgrade"),
        }
    }
}

/// Shell a command line is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    /// `cmd.exe /c <line>`
    Cmd,
    /// `/bin/sh -c <line>`
    Posix,
}

impl Shell {
    /// Shell for the platform this binary was built for.
    pub fn host() -> Self {
        if cfg!(windows) {
            Shell::Cmd
        } else {
            Shell::Posix
        }
    }

    /// Interpreter executable.
    pub fn program(&self) -> &'static str {
        match self {
            Shell::Cmd => "cmd.exe",
            Shell::Posix => "/bin/sh",
        }
    }

    /// Quote a single argument so the shell passes it through as one word.
    pub fn quote(&self, arg: &str) -> String {
        match self {
            Shell::Posix => {
                if !arg.is_empty() && arg.chars().all(is_posix_safe) {
                    arg.to_string()
                } else {
                    format!("'{}'", arg.replace('\'', r"'\''"))
                }
            }
            Shell::Cmd => {
                if !arg.is_empty() && !arg.chars().any(is_cmd_special) {
                    arg.to_string()
                } else {
                    format!("\"{}\"", arg.replace('"', ""))
                }
            }
        }
    }

    /// Build the process for a command line, with stderr folded into stdout.
    ///
    /// The POSIX shell `exec`s the tool so that killing the child stops the tool itself.
    pub fn command(&self, line: &str) -> Command {
        let mut cmd = Command::new(self.program());
        match self {
            Shell::Posix => {
                cmd.arg("-c").arg(format!("exec {} 2>&1", line));
            }
            Shell::Cmd => {
                cmd.arg("/c");
                push_raw_arg(&mut cmd, &format!("{} 2>&1", line));
            }
        }
        cmd
    }
}

fn is_posix_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | '+' | ',' | '@' | '%')
}

fn is_cmd_special(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '&' | '|' | '<' | '>' | '^' | '(' | ')' | '%' | '!' | '"' | ',' | ';'
        )
}

// cmd.exe does its own parsing of the /c payload, so it must not be re-quoted.
#[cfg(windows)]
fn push_raw_arg(cmd: &mut Command, line: &str) {
    use std::os::windows::process::CommandExt;
    cmd.raw_arg(line);
}

#[cfg(not(windows))]
fn push_raw_arg(cmd: &mut Command, line: &str) {
    cmd.arg(line);
}

/// Program name plus the fixed arguments that precede the file paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Executable, resolved through the child's `PATH`.
    pub program: String,
    /// Flags placed before the paths.
    pub flags: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flags: Vec::new(),
        }
    }

    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags.extend(flags.into_iter().map(Into::into));
        self
    }

    /// Render the full command line: program, flags, source and optional destination.
    pub fn render(&self, shell: Shell, source: &Path, destination: Option<&Path>) -> String {
        let mut words = vec![shell.quote(&self.program)];
        words.extend(self.flags.iter().cloned());
        words.push(shell.quote(&source.to_string_lossy()));
        if let Some(dst) = destination {
            words.push(shell.quote(&dst.to_string_lossy()));
        }
        words.join(" ")
    }
}

/// The convert and upgrade templates for one shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSet {
    pub convert: ToolCommand,
    pub upgrade: ToolCommand,
}

impl ToolSet {
    /// Default Ogre tool names for a shell.
    pub fn for_shell(shell: Shell) -> Self {
        let (convert, upgrade) = match shell {
            Shell::Cmd => (WIN_CONVERT_PROGRAM, WIN_UPGRADE_PROGRAM),
            Shell::Posix => (POSIX_CONVERT_PROGRAM, POSIX_UPGRADE_PROGRAM),
        };
        Self {
            convert: ToolCommand::new(convert).with_flags(CONVERT_FLAGS.iter().copied()),
            upgrade: ToolCommand::new(upgrade),
        }
    }

    /// Template for a step.
    pub fn get(&self, step: Step) -> &ToolCommand {
        match step {
            Step::Convert => &self.convert,
            Step::Upgrade => &self.upgrade,
        }
    }
}
