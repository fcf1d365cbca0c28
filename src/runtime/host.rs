//! Sandbox detection and host executable lookup
//!
//! When running inside a Flatpak sandbox the host is only reachable through
//! `flatpak-spawn --host`, and `PATH` lookups only see the sandbox's own
//! filesystem. Everything that needs to know "is X installed on the host"
//! goes through [`HostProbe`].

use super::exec::{CommandSpec, run_with_timeout};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

/// File present only inside a Flatpak sandbox
pub const SANDBOX_MARKER: &str = "/.flatpak-info";

/// Helper that runs a command on the host from inside the sandbox
pub const SPAWN_HELPER: &str = "flatpak-spawn";

/// Upper bound for a host-side `which` probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Whether this process runs inside a sandbox. Checked once per process.
pub fn is_sandboxed() -> bool {
    static SANDBOXED: OnceLock<bool> = OnceLock::new();
    *SANDBOXED.get_or_init(|| Path::new(SANDBOX_MARKER).exists())
}

/// What the terminal resolver needs to know about the execution environment
pub trait HostProbe {
    fn is_sandboxed(&self) -> bool;

    /// Whether `name` can be executed on the host. Never blocks longer
    /// than the probe timeout.
    fn host_executable_exists(&self, name: &str) -> bool;

    /// Prefix that makes a command run on the host, empty when native
    fn host_spawn_prefix(&self) -> Vec<String>;
}

#[derive(Debug, Clone)]
pub struct Environment {
    sandboxed: bool,
    spawn_helper: String,
    probe_timeout: Duration,
}

impl Environment {
    /// The environment this process is actually running in
    pub fn detect() -> Self {
        Self::with_sandbox(is_sandboxed())
    }

    pub fn native() -> Self {
        Self::with_sandbox(false)
    }

    pub fn sandboxed() -> Self {
        Self::with_sandbox(true)
    }

    fn with_sandbox(sandboxed: bool) -> Self {
        Self {
            sandboxed,
            spawn_helper: SPAWN_HELPER.to_string(),
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    pub fn spawn_helper(mut self, helper: impl Into<String>) -> Self {
        self.spawn_helper = helper.into();
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Wrap `spec` so that it runs on the host
    pub fn host_command(&self, spec: CommandSpec) -> CommandSpec {
        host_command(self, spec)
    }
}

impl HostProbe for Environment {
    fn is_sandboxed(&self) -> bool {
        self.sandboxed
    }

    fn host_executable_exists(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }

        if !self.sandboxed {
            return which::which(name).is_ok();
        }

        if which::which(&self.spawn_helper).is_err() {
            debug!(helper = %self.spawn_helper, "spawn helper unavailable");
            return false;
        }

        let probe = CommandSpec::new(&self.spawn_helper).args(["--host", "which", name]);
        let out = run_with_timeout(&probe, self.probe_timeout);
        debug!(name, found = out.success, timed_out = out.timed_out, "host probe");
        out.success
    }

    fn host_spawn_prefix(&self) -> Vec<String> {
        if self.sandboxed {
            vec![self.spawn_helper.clone(), "--host".to_string()]
        } else {
            Vec::new()
        }
    }
}

/// Wrap `spec` in the probe's host spawn prefix, followed by `--`
pub fn host_command<P: HostProbe + ?Sized>(probe: &P, spec: CommandSpec) -> CommandSpec {
    let mut prefix = probe.host_spawn_prefix();
    if prefix.is_empty() {
        return spec;
    }
    prefix.push("--".to_string());
    spec.prefixed(&prefix)
}
