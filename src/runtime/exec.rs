//! Process execution for external tools

use nix::sys::signal::{Signal, killpg};
use nix::unistd::{Pid, setsid};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Failed to execute {command}: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// A program plus its argument vector.
///
/// Commands are built as argument vectors and only rendered into a single
/// shell string for logging or when handed to something that wants one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Run `line` through `/bin/sh -c`
    pub fn shell(line: impl Into<String>) -> Self {
        Self::new("/bin/sh").arg("-c").arg(line)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Put `prefix` in front of this command, e.g. `flatpak-spawn --host`
    pub fn prefixed<S: AsRef<str>>(self, prefix: &[S]) -> Self {
        let Some((program, rest)) = prefix.split_first() else {
            return self;
        };

        let mut args: Vec<String> = rest.iter().map(|s| s.as_ref().to_string()).collect();
        args.push(self.program);
        args.extend(self.args);

        Self {
            program: program.as_ref().to_string(),
            args,
            current_dir: self.current_dir,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Render as a single shell-safe command line
    pub fn command_line(&self) -> String {
        shell_words::join(std::iter::once(&self.program).chain(self.args.iter()))
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Result of running an external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Started and exited with status zero
    pub success: bool,
    pub timed_out: bool,
}

impl CommandOutput {
    fn failed(stderr: String) -> Self {
        Self {
            stderr,
            ..Self::default()
        }
    }

    /// Stdout followed by stderr, for diagnostic display
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (true, true) => String::new(),
        }
    }
}

/// Something that runs commands to completion and captures their output
pub trait Runner {
    fn run(&self, spec: &CommandSpec) -> CommandOutput;
}

/// Runs commands directly on this system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> CommandOutput {
        run(spec)
    }
}

/// Run a command, blocking until it exits, and capture its output
pub fn run(spec: &CommandSpec) -> CommandOutput {
    debug!(command = %spec, "running");

    let output = match spec.to_command().stdin(Stdio::null()).output() {
        Ok(output) => output,
        Err(e) => {
            warn!(command = %spec, error = %e, "failed to start");
            return CommandOutput::failed(e.to_string());
        }
    };

    let result = CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        success: output.status.success(),
        timed_out: false,
    };

    debug!(command = %spec, status = ?output.status.code(), "finished");
    result
}

/// Run a command for its exit status only, killing it after `timeout`.
///
/// The child gets its own process group so that anything it spawned is
/// killed along with it.
pub fn run_with_timeout(spec: &CommandSpec, timeout: Duration) -> CommandOutput {
    debug!(command = %spec, ?timeout, "running with timeout");

    let mut cmd = spec.to_command();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(command = %spec, error = %e, "failed to start");
            return CommandOutput::failed(e.to_string());
        }
    };

    match child.wait_timeout(timeout) {
        Ok(Some(status)) => CommandOutput {
            success: status.success(),
            ..CommandOutput::default()
        },
        Ok(None) => {
            warn!(command = %spec, ?timeout, "timed out, killing");
            kill_group(&mut child);
            CommandOutput {
                timed_out: true,
                ..CommandOutput::default()
            }
        }
        Err(e) => {
            kill_group(&mut child);
            CommandOutput::failed(e.to_string())
        }
    }
}

fn kill_group(child: &mut Child) {
    let pgid = Pid::from_raw(child.id() as i32);
    if killpg(pgid, Signal::SIGKILL).is_err() {
        let _ = child.kill();
    }
    let _ = child.wait();
}

/// Start a command detached from this process (new session, no stdio).
///
/// `env` is added to the child's environment.
pub fn spawn_detached(spec: &CommandSpec, env: &[(&str, String)]) -> Result<Child, ExecError> {
    let mut cmd = spec.to_command();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    for (key, value) in env {
        cmd.env(key, value);
    }

    // SAFETY: setsid is async-signal-safe and touches no parent state
    unsafe {
        cmd.pre_exec(|| {
            setsid().map(|_| ()).map_err(std::io::Error::from)
        });
    }

    cmd.spawn().map_err(|source| ExecError::SpawnFailed {
        command: spec.command_line(),
        source,
    })
}
