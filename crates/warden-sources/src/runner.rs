//! Process execution behind a trait.
//!
//! `CommandRunner` is what adapters use to call external tools.
//! `ProcessRunner` executes the program directly (no shell, so arguments are
//! never re-parsed). `ScriptedRunner` is the test double that replays canned
//! output and records the command lines it was asked to run.

use crate::error::{Error, Result};
#[cfg(test)]
use std::{cell::RefCell, collections::VecDeque};
use std::fmt;
use std::process::{Command, Stdio};

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Runs external commands and returns their stdout.
pub trait CommandRunner {
    fn run(&self, command: &CommandLine) -> Result<String>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command: &CommandLine) -> Result<String> {
        (**self).run(command)
    }
}

/// Production runner: spawns the program and waits for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &CommandLine) -> Result<String> {
        tracing::debug!(command = %command, "running");
        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                program: command.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.is_empty() {
                // the mongo shell reports script errors on stdout
                stderr = String::from_utf8_lossy(&output.stdout).trim().to_string();
            }
            Err(Error::CommandFailed {
                command: command.to_string(),
                status: output.status.to_string(),
                stderr,
            })
        }
    }
}

#[cfg(test)]
/// Test double that replays responses in order.
///
/// Once the script is exhausted every command succeeds with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: RefCell<VecDeque<std::result::Result<String, String>>>,
    commands: RefCell<Vec<CommandLine>>,
}

#[cfg(test)]
impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn respond(&self, stdout: impl Into<String>) {
        self.responses.borrow_mut().push_back(Ok(stdout.into()));
    }

    /// Queue a failure with the given stderr.
    pub fn fail(&self, stderr: impl Into<String>) {
        self.responses.borrow_mut().push_back(Err(stderr.into()));
    }

    pub fn executed_commands(&self) -> Vec<CommandLine> {
        self.commands.borrow().clone()
    }
}

#[cfg(test)]
impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &CommandLine) -> Result<String> {
        self.commands.borrow_mut().push(command.clone());
        match self.responses.borrow_mut().pop_front() {
            Some(Ok(stdout)) => Ok(stdout),
            Some(Err(stderr)) => Err(Error::CommandFailed {
                command: command.to_string(),
                status: "exit status: 1".to_string(),
                stderr,
            }),
            None => Ok(String::new()),
        }
    }
}
