//! External tool invocation.

mod command;
mod runner;

pub use command::{Shell, Step, ToolCommand, ToolSet};
pub use runner::{CancelToken, ShellRunner, StepOutput, StepRunner};
