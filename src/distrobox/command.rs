//! Invocations of the `distrobox` tool
//!
//! Non-interactive commands are built as argument vectors. Commands shown
//! in a terminal are shell strings, with every interpolated value quoted.

use crate::desktop::container_desktop_path;
use crate::runtime::CommandSpec;
use shell_words::quote;

pub const DISTROBOX: &str = "distrobox";
pub const DISTROBOX_EXPORT: &str = "distrobox-export";

pub const PRESS_ANY_KEY: &str = "Press any key to close this terminal…";

pub const UNSUPPORTED_INSTALL: &str = "Cannot automatically install packages for this \
distribution. Please enter the distrobox manually and install it using the appropriate \
package manager.";

/// Lists app entries in a container, skipping `NoDisplay=true` ones
pub const FIND_APPS: &str = "find /usr/share/applications -type f -name '*.desktop' \
! -exec grep -q '^NoDisplay=true' {} \\; -print";

pub fn create(name: &str, image: &str, extra_args: &[String]) -> CommandSpec {
    CommandSpec::new(DISTROBOX)
        .args(["create", "--name", name, "--image", image, "--yes"])
        .args(extra_args.iter().cloned())
}

pub fn remove(name: &str) -> CommandSpec {
    CommandSpec::new(DISTROBOX).args(["rm", "-f", name])
}

pub fn list() -> CommandSpec {
    CommandSpec::new(DISTROBOX).args(["list", "--no-color"])
}

pub fn compatible_images() -> CommandSpec {
    CommandSpec::new(DISTROBOX).args(["create", "--compatibility"])
}

/// `None` generates entries for every container
pub fn generate_entry(name: Option<&str>) -> CommandSpec {
    let cmd = CommandSpec::new(DISTROBOX).arg("generate-entry");
    match name {
        Some(name) => cmd.arg(name),
        None => cmd.arg("-a"),
    }
}

/// Run `program args...` inside `container`
pub fn enter_exec<I, S>(container: &str, program: &str, args: I) -> CommandSpec
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CommandSpec::new(DISTROBOX)
        .args(["enter", container, "--", program])
        .args(args)
}

pub fn find_apps(container: &str) -> CommandSpec {
    enter_exec(container, "sh", ["-c", FIND_APPS])
}

pub fn read_file(container: &str, path: &str) -> CommandSpec {
    enter_exec(container, "cat", [path])
}

pub fn export_app(container: &str, basename: &str) -> CommandSpec {
    let path = container_desktop_path(basename);
    enter_exec(container, DISTROBOX_EXPORT, ["--app", path.as_str()])
}

/// `app` is either the basename or the full in-container path
pub fn unexport_app(container: &str, app: &str) -> CommandSpec {
    enter_exec(container, DISTROBOX_EXPORT, ["--app", app, "--delete"])
}

/// Shell command for an interactive session in `name`
pub fn enter_shell(name: &str) -> String {
    format!("{} enter {}", DISTROBOX, quote(name))
}

/// Shell command that upgrades `name` and waits for a key press
pub fn upgrade_shell(name: &str) -> String {
    let upgrade = format!("{} upgrade {}", DISTROBOX, quote(name));
    format!("bash -c {}", quote(&wait_for_key(&upgrade)))
}

/// Shell command that runs `install` inside `name` and waits for a key press
pub fn install_shell(name: &str, install: &str) -> String {
    format!(
        "{} enter {} -- bash -c {}",
        DISTROBOX,
        quote(name),
        quote(&wait_for_key(install))
    )
}

/// Shell command that explains a package can't be installed automatically
pub fn unsupported_install_shell() -> String {
    let script = format!("echo {}; read -n 1", quote(UNSUPPORTED_INSTALL));
    format!("bash -c {}", quote(&script))
}

fn wait_for_key(command: &str) -> String {
    format!(
        "{} && echo '' && echo {} && read -s -n 1",
        command,
        quote(PRESS_ANY_KEY)
    )
}

/// Split user-supplied extra flags the way a shell would
pub fn split_extra_args(args: &str) -> Result<Vec<String>, shell_words::ParseError> {
    shell_words::split(args)
}
