//! Launch a command in a terminal and wait for the launch to succeed

use super::resolver::{ResolveError, TerminalLaunchConfig, TerminalPreferences, TerminalResolver};
use super::service::{ServiceRegistry, XdgServiceRegistry};
use crate::runtime::{Environment, ExecError, HostProbe, spawn_detached};
use crate::settings::Settings;
use std::sync::mpsc;
use std::thread;
use thiserror::Error;
use tracing::{debug, warn};

/// Lets the launched terminal be matched to its desktop entry
const DESKTOP_FILE_ENV: &str = "GIO_LAUNCHED_DESKTOP_FILE";

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Launch job ended without reporting a result")]
    NoResult,
}

/// Runs a shell command where the user can see it
pub trait Terminal {
    fn run_in_terminal(&self, command: &str, workdir: &str) -> Result<(), LaunchError>;
}

pub struct TerminalLauncher<P, S> {
    resolver: TerminalResolver<P, S>,
}

impl TerminalLauncher<Environment, XdgServiceRegistry> {
    /// Launcher for the current environment and saved settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(TerminalResolver::new(
            Environment::detect(),
            XdgServiceRegistry::new(),
            TerminalPreferences::from(settings),
        ))
    }
}

impl<P: HostProbe, S: ServiceRegistry> TerminalLauncher<P, S> {
    pub fn new(resolver: TerminalResolver<P, S>) -> Self {
        Self { resolver }
    }

    /// Run `command` in a terminal. Returns once the terminal has started;
    /// the terminal itself keeps running.
    pub fn launch(&self, command: &str, workdir: &str) -> Result<(), LaunchError> {
        let config = self.resolver.resolve(command, workdir).inspect_err(|e| {
            warn!(error = %e, "no terminal to launch");
        })?;
        launch_config(&config)
    }
}

impl<P: HostProbe, S: ServiceRegistry> Terminal for TerminalLauncher<P, S> {
    fn run_in_terminal(&self, command: &str, workdir: &str) -> Result<(), LaunchError> {
        self.launch(command, workdir)
    }
}

/// Start a resolved terminal as a detached job and block until the job
/// reports whether it started.
pub fn launch_config(config: &TerminalLaunchConfig) -> Result<(), LaunchError> {
    let command = config.command.clone();
    let mut env = Vec::new();
    if let Some(path) = &config.desktop_file {
        env.push((DESKTOP_FILE_ENV, path.to_string_lossy().into_owned()));
    }

    debug!(
        command = %command,
        desktop_name = config.desktop_name.as_deref().unwrap_or(""),
        "launching terminal"
    );

    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("terminal-launch".to_string())
        .spawn(move || match spawn_detached(&command, &env) {
            Ok(mut child) => {
                let _ = tx.send(Ok(()));
                // Reap the terminal once it exits
                let _ = child.wait();
            }
            Err(e) => {
                let _ = tx.send(Err(e));
            }
        })?;

    rx.recv().map_err(|_| LaunchError::NoResult)??;
    Ok(())
}
