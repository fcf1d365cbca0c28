//! Container lifecycle operations on top of the `distrobox` tool

use super::command;
use super::list::{
    AvailableImages, Container, containers_to_json, parse_compatible_images, parse_container_list,
};
use super::package::{install_command, local_package_path};
use crate::desktop::{
    DesktopApp, basename_from_container_path, basename_from_exported_file, parse_desktop_file,
    parse_desktop_text,
};
use crate::runtime::{CommandOutput, CommandSpec, Environment, HostProbe, Runner, SystemRunner};
use crate::settings::Settings;
use crate::storage::paths;
use crate::terminal::{LaunchError, Terminal, TerminalLauncher, XdgServiceRegistry};
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum DistroboxError {
    #[error("Command failed: {command}\n{output}")]
    CommandFailed { command: String, output: String },

    #[error("Invalid extra arguments: {0}")]
    InvalidArguments(#[from] shell_words::ParseError),

    #[error("Terminal launch failed: {0}")]
    Launch(#[from] LaunchError),

    #[error("JSON error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Could not unexport {basename} from {container}")]
    UnexportFailed { container: String, basename: String },
}

/// Front end for every container operation.
///
/// Non-interactive commands go through `runner` (routed to the host when
/// sandboxed) and interactive ones are opened in `terminal`.
pub struct DistroboxManager<R, T> {
    runner: R,
    terminal: T,
    environment: Environment,
    applications_dir: PathBuf,
    images: RwLock<AvailableImages>,
}

impl DistroboxManager<SystemRunner, TerminalLauncher<Environment, XdgServiceRegistry>> {
    /// Manager for the running system and saved settings
    pub fn from_settings(settings: &Settings) -> Self {
        let environment = Environment::detect();
        let applications_dir = paths::applications_dir(environment.is_sandboxed());
        Self::new(
            SystemRunner,
            TerminalLauncher::from_settings(settings),
            environment,
            applications_dir,
        )
    }
}

impl<R: Runner, T: Terminal> DistroboxManager<R, T> {
    pub fn new(
        runner: R,
        terminal: T,
        environment: Environment,
        applications_dir: PathBuf,
    ) -> Self {
        Self {
            runner,
            terminal,
            environment,
            applications_dir,
            images: RwLock::new(AvailableImages::default()),
        }
    }

    /// Run a non-interactive command on the host and capture its output
    fn run(&self, spec: CommandSpec) -> CommandOutput {
        let spec = self.environment.host_command(spec);
        self.runner.run(&spec)
    }

    /// Like `run`, but a non-zero exit is an error
    fn run_checked(&self, spec: CommandSpec) -> Result<String, DistroboxError> {
        let spec = self.environment.host_command(spec);
        let output = self.runner.run(&spec);
        if output.success {
            Ok(output.stdout)
        } else {
            Err(DistroboxError::CommandFailed {
                command: spec.command_line(),
                output: output.combined(),
            })
        }
    }

    /// Create a container. `extra_args` is split the way a shell would.
    pub fn create(
        &self,
        name: &str,
        image: &str,
        extra_args: &str,
    ) -> Result<String, DistroboxError> {
        let extra = command::split_extra_args(extra_args)?;
        info!(name, image, "creating container");
        self.run_checked(command::create(name, image, &extra))
    }

    /// Open an interactive shell in the container
    pub fn enter(&self, name: &str) -> Result<(), DistroboxError> {
        self.terminal
            .run_in_terminal(&command::enter_shell(name), "")?;
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<String, DistroboxError> {
        info!(name, "removing container");
        self.run_checked(command::remove(name))
    }

    /// Upgrade the container in a terminal the user can watch
    pub fn upgrade(&self, name: &str) -> Result<(), DistroboxError> {
        self.terminal
            .run_in_terminal(&command::upgrade_shell(name), "")?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<Container>, DistroboxError> {
        let output = self.run_checked(command::list())?;
        Ok(parse_container_list(&output))
    }

    pub fn list_json(&self) -> Result<String, DistroboxError> {
        Ok(containers_to_json(&self.list()?)?)
    }

    /// Fetch the compatible image list and replace the cached one
    pub fn load_images(&self) -> Result<AvailableImages, DistroboxError> {
        let output = self.run_checked(command::compatible_images())?;
        let images = parse_compatible_images(&output);
        debug!(count = images.len(), "loaded available images");

        if let Ok(mut cache) = self.images.write() {
            *cache = images.clone();
        }
        Ok(images)
    }

    /// Compatible images, fetched on first use
    pub fn available_images(&self) -> Result<AvailableImages, DistroboxError> {
        let cached = self
            .images
            .read()
            .map(|images| images.clone())
            .unwrap_or_default();

        if cached.is_empty() {
            self.load_images()
        } else {
            Ok(cached)
        }
    }

    pub fn available_images_json(&self) -> Result<String, DistroboxError> {
        Ok(self.available_images()?.to_json()?)
    }

    /// Add a host launcher for one container, or for all of them
    pub fn generate_entry(&self, name: Option<&str>) -> Result<String, DistroboxError> {
        self.run_checked(command::generate_entry(name))
    }

    pub fn export_app(&self, container: &str, basename: &str) -> Result<(), DistroboxError> {
        let result = self.run_checked(command::export_app(container, basename));
        info!(container, basename, ok = result.is_ok(), "export");
        result.map(|_| ())
    }

    /// Remove an exported app: by basename, then by full in-container path,
    /// then by deleting the exported entry from the host directly.
    pub fn unexport_app(&self, container: &str, basename: &str) -> Result<(), DistroboxError> {
        if self.run(command::unexport_app(container, basename)).success {
            info!(container, basename, "unexported by basename");
            return Ok(());
        }

        let full_path = crate::desktop::container_desktop_path(basename);
        let output = self.run(command::unexport_app(container, &full_path));
        if output.success {
            info!(container, path = %full_path, "unexported by full path");
            return Ok(());
        }
        debug!(container, basename, output = %output.combined(), "unexport attempts failed");

        let exported = paths::exported_desktop_path(&self.applications_dir, container, basename);
        if exported.is_file() {
            match fs::remove_file(&exported) {
                Ok(()) => {
                    info!(path = %exported.display(), "removed exported entry");
                    return Ok(());
                }
                Err(e) => warn!(path = %exported.display(), error = %e, "manual removal failed"),
            }
        }

        Err(DistroboxError::UnexportFailed {
            container: container.to_string(),
            basename: basename.to_string(),
        })
    }

    /// Install a local package file inside the container, in a terminal.
    ///
    /// Images without a known package manager get a terminal explaining
    /// that the package has to be installed by hand.
    pub fn install_package(
        &self,
        name: &str,
        package: &str,
        image: &str,
    ) -> Result<(), DistroboxError> {
        let package = local_package_path(package);
        let shell = match install_command(image, package) {
            Some(install) => command::install_shell(name, &install),
            None => {
                warn!(image, "no known package manager for image");
                command::unsupported_install_shell()
            }
        };

        let home = paths::home_dir();
        self.terminal
            .run_in_terminal(&shell, &home.to_string_lossy())?;
        Ok(())
    }

    /// Apps installed in the container that can be exported
    pub fn available_apps(&self, container: &str) -> Vec<DesktopApp> {
        let output = self.run(command::find_apps(container));
        if !output.success {
            debug!(container, "app discovery failed");
            return Vec::new();
        }

        let mut apps = Vec::new();
        for path in output.stdout.lines().map(str::trim) {
            let Some(basename) = basename_from_container_path(path) else {
                continue;
            };

            let entry = self.run(command::read_file(container, path));
            if !entry.success {
                debug!(container, path, "skipping unreadable entry");
                continue;
            }

            let app = parse_desktop_text(&entry.stdout, &basename);
            debug!(name = %app.name, basename = %app.basename, path, "found app");
            apps.push(app);
        }

        info!(container, count = apps.len(), "apps discovered");
        apps
    }

    /// Apps of the container that are exported to the host
    pub fn exported_apps(&self, container: &str) -> Vec<DesktopApp> {
        let entries = match fs::read_dir(&self.applications_dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %self.applications_dir.display(), error = %e, "no applications dir");
                return Vec::new();
            }
        };

        let prefix = format!("{}-", container);
        let mut files: Vec<(String, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let file_name = entry.file_name().into_string().ok()?;
                file_name
                    .starts_with(&prefix)
                    .then(|| (file_name, entry.path()))
            })
            .collect();
        files.sort();

        files
            .into_iter()
            .filter_map(|(file_name, path)| {
                let basename = basename_from_exported_file(&file_name, container)?;
                parse_desktop_file(&path, &basename)
                    .inspect_err(|e| debug!(path = %path.display(), error = %e, "skipping"))
                    .ok()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::Path;
    use tempfile::TempDir;

    /// Replays canned output keyed by command line and records every call
    #[derive(Default)]
    struct FakeRunner {
        outputs: HashMap<String, CommandOutput>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeRunner {
        fn respond(mut self, spec: CommandSpec, stdout: &str) -> Self {
            self.outputs.insert(
                spec.command_line(),
                CommandOutput {
                    stdout: stdout.to_string(),
                    success: true,
                    ..CommandOutput::default()
                },
            );
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl Runner for FakeRunner {
        fn run(&self, spec: &CommandSpec) -> CommandOutput {
            let line = spec.command_line();
            self.calls.borrow_mut().push(line.clone());
            self.outputs.get(&line).cloned().unwrap_or(CommandOutput {
                stderr: "Error: no such container".to_string(),
                ..CommandOutput::default()
            })
        }
    }

    #[derive(Default)]
    struct FakeTerminal {
        launched: RefCell<Vec<(String, String)>>,
    }

    impl Terminal for FakeTerminal {
        fn run_in_terminal(&self, command: &str, workdir: &str) -> Result<(), LaunchError> {
            self.launched
                .borrow_mut()
                .push((command.to_string(), workdir.to_string()));
            Ok(())
        }
    }

    fn manager(runner: FakeRunner, dir: &Path) -> DistroboxManager<FakeRunner, FakeTerminal> {
        DistroboxManager::new(
            runner,
            FakeTerminal::default(),
            Environment::native(),
            dir.to_path_buf(),
        )
    }

    #[test]
    fn non_zero_exit_is_reported_with_output() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(FakeRunner::default(), dir.path());

        match mgr.create("dev", "fedora:40", "") {
            Err(DistroboxError::CommandFailed { command, output }) => {
                assert!(command.starts_with("distrobox create --name dev"));
                assert_eq!(output, "Error: no such container");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unbalanced_extra_args_are_rejected() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(FakeRunner::default(), dir.path());
        assert!(matches!(
            mgr.create("dev", "fedora:40", "--home '/srv"),
            Err(DistroboxError::InvalidArguments(_))
        ));
        assert!(mgr.runner.calls().is_empty());
    }

    #[test]
    fn list_parses_table() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::default().respond(
            command::list(),
            "ID | NAME | STATUS | IMAGE\nabc | dev | Up 1 minute | fedora:40\n",
        );
        let mgr = manager(runner, dir.path());

        let containers = mgr.list().unwrap();
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].name, "dev");
        assert!(mgr.list_json().unwrap().contains("\"status\":\"Up 1 minute\""));
    }

    #[test]
    fn images_are_fetched_once() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::default()
            .respond(command::compatible_images(), "quay.io/toolbx/arch-toolbox:latest\n");
        let mgr = manager(runner, dir.path());

        assert_eq!(mgr.available_images().unwrap().len(), 1);
        assert_eq!(
            mgr.available_images().unwrap().display_names(),
            ["arch-toolbox:latest"]
        );
        assert_eq!(mgr.runner.calls().len(), 1);
    }

    #[test]
    fn interactive_operations_use_the_terminal() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(FakeRunner::default(), dir.path());

        mgr.enter("my box").unwrap();
        mgr.upgrade("dev").unwrap();

        let launched = mgr.terminal.launched.borrow();
        assert_eq!(launched[0].0, "distrobox enter 'my box'");
        assert!(launched[1].0.starts_with("bash -c "));
        assert!(mgr.runner.calls().is_empty());
    }

    #[test]
    fn install_strips_file_url_and_runs_from_home() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(FakeRunner::default(), dir.path());

        mgr.install_package("dev", "file:///tmp/tool.deb", "debian:12")
            .unwrap();
        mgr.install_package("dev", "/tmp/tool.xbps", "voidlinux/voidlinux")
            .unwrap();

        let launched = mgr.terminal.launched.borrow();
        assert!(launched[0].0.contains("sudo apt install -y /tmp/tool.deb"));
        assert!(!launched[0].0.contains("file://"));
        assert_eq!(launched[0].1, paths::home_dir().to_string_lossy());
        assert!(launched[1].0.contains("Cannot automatically install"));
    }

    #[test]
    fn available_apps_reads_each_entry() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::default()
            .respond(
                command::find_apps("dev"),
                "/usr/share/applications/firefox.desktop\n\
                 /usr/share/applications/broken.desktop\n",
            )
            .respond(
                command::read_file("dev", "/usr/share/applications/firefox.desktop"),
                "[Desktop Entry]\nName=Firefox Web Browser\nName[en]=Firefox\nIcon=firefox\n",
            );
        let mgr = manager(runner, dir.path());

        let apps = mgr.available_apps("dev");
        assert_eq!(
            apps,
            [DesktopApp {
                basename: "firefox".into(),
                name: "Firefox".into(),
                icon: "firefox".into(),
            }]
        );
    }

    #[test]
    fn failed_discovery_yields_no_apps() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(FakeRunner::default(), dir.path());
        assert!(mgr.available_apps("dev").is_empty());
    }

    #[test]
    fn exported_apps_only_lists_the_containers_entries() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("ubuntu-22-firefox.desktop"),
            "[Desktop Entry]\nName=Firefox (on ubuntu-22)\nIcon=firefox\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("ubuntu-22-gimp.desktop"),
            "[Desktop Entry]\nIcon=gimp\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("fedora-40-firefox.desktop"),
            "[Desktop Entry]\nName=Firefox\n",
        )
        .unwrap();
        let mgr = manager(FakeRunner::default(), dir.path());

        let apps = mgr.exported_apps("ubuntu-22");
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].basename, "firefox");
        assert_eq!(apps[0].name, "Firefox");
        assert_eq!(apps[1].name, "gimp");
    }

    #[test]
    fn missing_applications_dir_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(FakeRunner::default(), &dir.path().join("missing"));
        assert!(mgr.exported_apps("dev").is_empty());
    }

    #[test]
    fn unexport_stops_at_first_success() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::default().respond(command::unexport_app("dev", "firefox"), "");
        let mgr = manager(runner, dir.path());

        mgr.unexport_app("dev", "firefox").unwrap();
        assert_eq!(mgr.runner.calls().len(), 1);
    }

    #[test]
    fn unexport_falls_back_to_full_path() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::default().respond(
            command::unexport_app("dev", "/usr/share/applications/firefox.desktop"),
            "",
        );
        let mgr = manager(runner, dir.path());

        mgr.unexport_app("dev", "firefox").unwrap();
        assert_eq!(mgr.runner.calls().len(), 2);
    }

    #[test]
    fn unexport_deletes_host_entry_as_last_resort() {
        let dir = TempDir::new().unwrap();
        let exported = dir.path().join("dev-firefox.desktop");
        fs::write(&exported, "[Desktop Entry]\nName=Firefox\n").unwrap();
        let mgr = manager(FakeRunner::default(), dir.path());

        mgr.unexport_app("dev", "firefox").unwrap();
        assert!(!exported.exists());
    }

    #[test]
    fn unexport_fails_when_every_tier_fails() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(FakeRunner::default(), dir.path());
        assert!(matches!(
            mgr.unexport_app("dev", "firefox"),
            Err(DistroboxError::UnexportFailed { .. })
        ));
    }

    #[test]
    fn sandboxed_commands_run_on_host() {
        let dir = TempDir::new().unwrap();
        let mgr = DistroboxManager::new(
            FakeRunner::default(),
            FakeTerminal::default(),
            Environment::sandboxed(),
            dir.path().to_path_buf(),
        );

        let _ = mgr.remove("dev");
        assert_eq!(
            mgr.runner.calls(),
            ["flatpak-spawn --host -- distrobox rm -f dev"]
        );
    }
}
