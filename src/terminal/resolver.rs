//! Picks a terminal emulator and builds the command that runs a shell
//! command inside it.

use super::registry::{self, TerminalSpec};
use super::service::{ServiceRegistry, TerminalService};
use crate::runtime::{CommandSpec, HostProbe, host_command};
use crate::settings::Settings;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Tried in order after the configured terminal when sandboxed
pub const SANDBOX_FALLBACKS: &[&str] = &["konsole", "gnome-terminal", "xterm"];

/// Desktop service used when nothing is configured (native only)
pub const DEFAULT_SERVICE: &str = "org.kde.konsole";

/// Looked up on `PATH` when no service yields an executable (native only)
pub const PATH_FALLBACKS: &[&str] = &["konsole", "xterm"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No usable terminal emulator found")]
    NoTerminal,

    #[error("Unsupported terminal emulator: {0}")]
    Unsupported(String),

    #[error("Invalid terminal command {0:?}: {1}")]
    InvalidCommand(String, String),
}

/// The two terminal options of the `[General]` settings group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalPreferences {
    pub application: String,
    pub service: String,
}

impl From<&Settings> for TerminalPreferences {
    fn from(settings: &Settings) -> Self {
        Self {
            application: settings.terminal_application().to_string(),
            service: settings.terminal_service().to_string(),
        }
    }
}

/// A ready-to-run terminal invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalLaunchConfig {
    pub command: CommandSpec,
    /// Desktop-entry name of the terminal, for window and icon association
    pub desktop_name: Option<String>,
    pub desktop_file: Option<PathBuf>,
}

impl TerminalLaunchConfig {
    pub fn command_line(&self) -> String {
        self.command.command_line()
    }
}

pub struct TerminalResolver<P, S> {
    probe: P,
    services: S,
    prefs: TerminalPreferences,
}

impl<P: HostProbe, S: ServiceRegistry> TerminalResolver<P, S> {
    pub fn new(probe: P, services: S, prefs: TerminalPreferences) -> Self {
        Self {
            probe,
            services,
            prefs,
        }
    }

    /// Build the invocation that runs `command` in a terminal starting in
    /// `workdir`. `command` must already be shell-safe.
    pub fn resolve(
        &self,
        command: &str,
        workdir: &str,
    ) -> Result<TerminalLaunchConfig, ResolveError> {
        let service = if self.probe.is_sandboxed() {
            self.choose_sandboxed()
        } else {
            self.choose_native()
        }
        .ok_or(ResolveError::NoTerminal)?;

        let words = shell_words::split(&service.exec)
            .map_err(|e| ResolveError::InvalidCommand(service.exec.clone(), e.to_string()))?;
        let (base, extra) = words.split_first().ok_or(ResolveError::NoTerminal)?;

        let spec = registry::lookup_program(base)
            .ok_or_else(|| ResolveError::Unsupported(base.clone()))?;

        let mut cmd = CommandSpec::new(spec.executable)
            .args(extra.iter().cloned())
            .args(spec.expand_args(command, workdir));

        if self.probe.is_sandboxed() {
            cmd = self.on_host(cmd, workdir);
        } else if !workdir.is_empty() {
            cmd = cmd.current_dir(workdir);
        }

        info!(terminal = spec.id, command = %cmd, "resolved terminal");

        Ok(TerminalLaunchConfig {
            command: cmd,
            desktop_name: service.desktop_name,
            desktop_file: service.entry_path,
        })
    }

    /// Configured terminal first, then the fixed fallbacks; the first one
    /// whose program exists on the host wins.
    fn choose_sandboxed(&self) -> Option<TerminalService> {
        std::iter::once(self.prefs.application.as_str())
            .chain(SANDBOX_FALLBACKS.iter().copied())
            .filter(|candidate| !candidate.trim().is_empty())
            .find(|candidate| {
                let program = probe_name(candidate);
                let found = !program.is_empty() && self.probe.host_executable_exists(&program);
                if !found {
                    debug!(candidate, "terminal not available on host");
                }
                found
            })
            .map(TerminalService::from_exec)
    }

    fn choose_native(&self) -> Option<TerminalService> {
        let prefs = &self.prefs;
        let attempts: [&dyn Fn() -> Option<TerminalService>; 3] = [
            &|| non_empty(&prefs.service).and_then(|id| self.services.lookup(id)),
            &|| non_empty(&prefs.application).map(TerminalService::from_exec),
            &|| self.services.lookup(DEFAULT_SERVICE),
        ];

        let from_service = attempts
            .iter()
            .find_map(|attempt| attempt())
            .filter(|service| !service.exec.is_empty());
        if from_service.is_some() {
            return from_service;
        }

        PATH_FALLBACKS
            .iter()
            .find(|name| self.probe.host_executable_exists(name))
            .map(|name| TerminalService::from_exec(name))
    }

    fn on_host(&self, cmd: CommandSpec, workdir: &str) -> CommandSpec {
        let mut prefixed = host_command(&self.probe, cmd);
        if !workdir.is_empty() {
            // flatpak-spawn --host [--directory=DIR] -- program ...
            let mut args = prefixed.arguments().to_vec();
            args.insert(1, format!("--directory={}", workdir));
            prefixed = CommandSpec::new(prefixed.program()).args(args);
        }
        prefixed
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

/// Program to look for on the host: registered ids map to their executable
/// (`org.kde.konsole` runs as `flatpak`), anything else is taken literally.
fn probe_name(candidate: &str) -> String {
    let first = shell_words::split(candidate)
        .ok()
        .and_then(|words| words.into_iter().next())
        .unwrap_or_else(|| {
            candidate
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string()
        });

    match registry::lookup_program(&first) {
        Some(TerminalSpec { executable, .. }) => executable.to_string(),
        None => first,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::registry::TERMINALS;
    use crate::terminal::service::NoServices;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    /// Probe with a fixed set of host programs that records what it was asked
    struct FakeProbe {
        sandboxed: bool,
        installed: HashSet<&'static str>,
        asked: RefCell<Vec<String>>,
    }

    impl FakeProbe {
        fn new(sandboxed: bool, installed: &[&'static str]) -> Self {
            Self {
                sandboxed,
                installed: installed.iter().copied().collect(),
                asked: RefCell::new(Vec::new()),
            }
        }
    }

    impl HostProbe for &FakeProbe {
        fn is_sandboxed(&self) -> bool {
            self.sandboxed
        }

        fn host_executable_exists(&self, name: &str) -> bool {
            self.asked.borrow_mut().push(name.to_string());
            self.installed.contains(name)
        }

        fn host_spawn_prefix(&self) -> Vec<String> {
            if self.sandboxed {
                vec!["flatpak-spawn".into(), "--host".into()]
            } else {
                Vec::new()
            }
        }
    }

    #[derive(Default)]
    struct FakeServices(HashMap<&'static str, &'static str>);

    impl ServiceRegistry for FakeServices {
        fn lookup(&self, id: &str) -> Option<TerminalService> {
            self.0.get(id).map(|exec| TerminalService {
                desktop_name: Some(id.to_string()),
                exec: exec.to_string(),
                entry_path: None,
            })
        }
    }

    fn prefs(application: &str, service: &str) -> TerminalPreferences {
        TerminalPreferences {
            application: application.to_string(),
            service: service.to_string(),
        }
    }

    #[test]
    fn every_registered_terminal_resolves_natively() {
        let probe = FakeProbe::new(false, &[]);
        for term in TERMINALS {
            let resolver = TerminalResolver::new(&probe, NoServices, prefs(term.id, ""));
            let config = resolver.resolve("htop", "/tmp").unwrap();
            assert!(
                config.command_line().starts_with(term.executable),
                "{} -> {}",
                term.id,
                config.command_line()
            );
            assert!(!config.command_line().starts_with("flatpak-spawn"));
        }
    }

    #[test]
    fn unregistered_terminal_without_fallback_is_invalid() {
        let probe = FakeProbe::new(false, &[]);
        let resolver = TerminalResolver::new(&probe, NoServices, prefs("my-term", ""));
        assert_eq!(
            resolver.resolve("htop", ""),
            Err(ResolveError::Unsupported("my-term".into()))
        );
    }

    #[test]
    fn nothing_configured_and_nothing_installed_is_invalid() {
        let probe = FakeProbe::new(false, &[]);
        let resolver = TerminalResolver::new(&probe, NoServices, TerminalPreferences::default());
        assert_eq!(resolver.resolve("htop", ""), Err(ResolveError::NoTerminal));
    }

    #[test]
    fn native_falls_back_to_path_search() {
        let probe = FakeProbe::new(false, &["xterm"]);
        let resolver = TerminalResolver::new(&probe, NoServices, TerminalPreferences::default());
        let config = resolver.resolve("htop", "").unwrap();
        assert_eq!(config.command.program(), "xterm");
        assert_eq!(config.desktop_name, None);
        assert_eq!(*probe.asked.borrow(), ["konsole", "xterm"]);
    }

    #[test]
    fn configured_service_wins_and_is_remembered() {
        let probe = FakeProbe::new(false, &[]);
        let mut services = FakeServices::default();
        services.0.insert("org.gnome.Terminal", "gnome-terminal");
        services.0.insert(DEFAULT_SERVICE, "konsole");

        let resolver =
            TerminalResolver::new(&probe, services, prefs("xterm", "org.gnome.Terminal"));
        let config = resolver.resolve("htop", "").unwrap();
        assert_eq!(config.command.program(), "gnome-terminal");
        assert_eq!(config.desktop_name.as_deref(), Some("org.gnome.Terminal"));
    }

    #[test]
    fn default_service_when_unconfigured() {
        let probe = FakeProbe::new(false, &[]);
        let mut services = FakeServices::default();
        services.0.insert(DEFAULT_SERVICE, "konsole");

        let resolver = TerminalResolver::new(&probe, services, TerminalPreferences::default());
        let config = resolver.resolve("htop", "/home/me").unwrap();
        assert_eq!(config.command.program(), "konsole");
        assert_eq!(config.desktop_name.as_deref(), Some(DEFAULT_SERVICE));
        assert!(probe.asked.borrow().is_empty());
    }

    #[test]
    fn user_extra_arguments_come_before_template() {
        let probe = FakeProbe::new(false, &[]);
        let resolver =
            TerminalResolver::new(&probe, NoServices, prefs("kitty --single-instance", ""));
        let config = resolver.resolve("htop", "").unwrap();
        assert_eq!(
            config.command.arguments(),
            ["--single-instance", "-e", "/bin/sh", "-c", "htop"]
        );
    }

    #[test]
    fn command_and_workdir_appear_once_each() {
        let probe = FakeProbe::new(false, &[]);
        let resolver = TerminalResolver::new(&probe, NoServices, prefs("konsole", ""));
        let command = "distrobox enter 'my-box'";
        let workdir = "/home/me/projects";
        let config = resolver.resolve(command, workdir).unwrap();

        let args = config.command.arguments();
        assert_eq!(args.iter().filter(|a| *a == command).count(), 1);
        assert_eq!(args.iter().filter(|a| *a == workdir).count(), 1);
        assert_eq!(args[1], workdir);
        assert_eq!(args.last().map(String::as_str), Some(command));
        assert_eq!(
            config.command.working_dir(),
            Some(std::path::Path::new(workdir))
        );
    }

    #[test]
    fn sandboxed_uses_first_host_terminal_and_prefixes_spawn() {
        let probe = FakeProbe::new(true, &["gnome-terminal"]);
        let resolver = TerminalResolver::new(&probe, NoServices, prefs("alacritty", ""));
        let config = resolver.resolve("htop", "").unwrap();

        assert!(config.command_line().starts_with("flatpak-spawn --host -- gnome-terminal"));
        assert_eq!(
            *probe.asked.borrow(),
            ["alacritty", "konsole", "gnome-terminal"]
        );
    }

    #[test]
    fn sandboxed_passes_workdir_to_spawn_helper() {
        let probe = FakeProbe::new(true, &["xterm"]);
        let resolver = TerminalResolver::new(&probe, NoServices, TerminalPreferences::default());
        let config = resolver.resolve("htop", "/home/me").unwrap();
        assert_eq!(
            config.command.arguments()[..3],
            ["--host", "--directory=/home/me", "--"]
        );
        assert_eq!(config.command.working_dir(), None);
    }

    #[test]
    fn sandboxed_flatpak_terminal_is_probed_by_executable() {
        let probe = FakeProbe::new(true, &["flatpak"]);
        let resolver = TerminalResolver::new(&probe, NoServices, prefs("org.kde.konsole", ""));
        let config = resolver.resolve("htop", "").unwrap();
        assert!(
            config
                .command_line()
                .starts_with("flatpak-spawn --host -- flatpak run org.kde.konsole")
        );
    }

    #[test]
    fn sandboxed_with_nothing_on_host_is_invalid() {
        let probe = FakeProbe::new(true, &[]);
        let resolver = TerminalResolver::new(&probe, NoServices, prefs("kitty", ""));
        assert_eq!(resolver.resolve("htop", ""), Err(ResolveError::NoTerminal));
    }
}
