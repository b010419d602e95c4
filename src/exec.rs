//! External tool invocation.
//!
//! Tools run with piped output that is drained on helper threads, so a tool
//! writing more than a pipe buffer cannot block. A tool still running when the
//! timeout expires is killed and reaped.

use crate::error::{ErrorExt, PackagingError, Result};
use std::{
    ffi::{OsStr, OsString},
    io::Read,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
    time::Duration,
};
use wait_timeout::ChildExt;

/// Builder-style runner for one external tool invocation.
#[derive(Debug, Clone)]
pub struct Executor {
    program: PathBuf,
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl Executor {
    /// Creates an executor for `program`.
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            timeout: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Sets an environment variable for the child.
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.env
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Sets the working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Kills the tool if it runs longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|s| s.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs the tool and returns its combined stdout and stderr.
    ///
    /// A non-zero exit is [`PackagingError::ToolFailed`] carrying the output;
    /// an expired timeout is [`PackagingError::ToolTimedOut`].
    pub fn execute(&self) -> Result<String> {
        let tool = self.tool_name();
        log::debug!("Running {}", self.command_line());

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        let mut child = command
            .spawn()
            .map_err(|error| PackagingError::CommandFailed {
                command: self.command_line(),
                error,
            })?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match self.timeout {
            Some(timeout) => match child
                .wait_timeout(timeout)
                .fs_context("waiting for", &self.program)?
            {
                Some(status) => status,
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(PackagingError::ToolTimedOut {
                        tool,
                        seconds: timeout.as_secs(),
                    }
                    .into());
                }
            },
            None => child.wait().fs_context("waiting for", &self.program)?,
        };

        let mut output = String::new();
        for reader in [stdout, stderr].into_iter().flatten() {
            if let Ok(text) = reader.join() {
                output.push_str(&text);
            }
        }

        if !status.success() {
            return Err(PackagingError::ToolFailed {
                tool,
                code: status.code(),
                output,
            }
            .into());
        }
        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}
