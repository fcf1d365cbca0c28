//! Known terminal emulators and how each one is told to run a command
//!
//! Emulators disagree on how a command is passed: some take the rest of
//! argv after `-e`/`--`, some take a single string that they split
//! themselves. Argv-style emulators get `/bin/sh -c {command}` so the
//! command keeps its shell semantics either way.

/// Replaced by the shell command to run inside the terminal
pub const COMMAND_PLACEHOLDER: &str = "{command}";

/// Replaced by the directory the terminal starts in
pub const WORKDIR_PLACEHOLDER: &str = "{workdir}";

/// Replaced by the registry id, used by sandbox-packaged variants
pub const APP_ID_PLACEHOLDER: &str = "{app_id}";

const PLACEHOLDERS: [&str; 3] = [COMMAND_PLACEHOLDER, WORKDIR_PLACEHOLDER, APP_ID_PLACEHOLDER];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSpec {
    /// Identifier used in configuration
    pub id: &'static str,
    /// Program that is actually executed
    pub executable: &'static str,
    pub args_template: &'static [&'static str],
}

macro_rules! terminal {
    ($id:expr, $exe:expr, [$($arg:expr),* $(,)?]) => {
        TerminalSpec {
            id: $id,
            executable: $exe,
            args_template: &[$($arg),*],
        }
    };
}

pub const TERMINALS: &[TerminalSpec] = &[
    terminal!(
        "konsole",
        "konsole",
        ["--workdir", WORKDIR_PLACEHOLDER, "-e", "/bin/sh", "-c", COMMAND_PLACEHOLDER]
    ),
    terminal!("xterm", "xterm", ["-hold", "-e", "/bin/sh", "-c", COMMAND_PLACEHOLDER]),
    terminal!("gnome-terminal", "gnome-terminal", ["--", "/bin/sh", "-c", COMMAND_PLACEHOLDER]),
    terminal!("xfce4-terminal", "xfce4-terminal", ["--command={command}"]),
    terminal!("kgx", "kgx", ["-e", COMMAND_PLACEHOLDER]),
    terminal!("tilix", "tilix", ["-e", COMMAND_PLACEHOLDER]),
    terminal!("alacritty", "alacritty", ["-e", "/bin/sh", "-c", COMMAND_PLACEHOLDER]),
    terminal!("kitty", "kitty", ["-e", "/bin/sh", "-c", COMMAND_PLACEHOLDER]),
    terminal!("terminator", "terminator", ["-e", COMMAND_PLACEHOLDER]),
    terminal!("urxvt", "urxvt", ["-e", "/bin/sh", "-c", COMMAND_PLACEHOLDER]),
    terminal!("lxterminal", "lxterminal", ["-e", COMMAND_PLACEHOLDER]),
    terminal!("eterm", "eterm", ["-e", "/bin/sh", "-c", COMMAND_PLACEHOLDER]),
    terminal!("st", "st", ["-e", "/bin/sh", "-c", COMMAND_PLACEHOLDER]),
    terminal!("wezterm", "wezterm", ["-e", "/bin/sh", "-c", COMMAND_PLACEHOLDER]),
    terminal!("ptyxis", "ptyxis", ["-x", COMMAND_PLACEHOLDER]),
    // Flatpak-packaged emulators, started through `flatpak run <app-id>`
    terminal!(
        "org.contourterminal.Contour",
        "flatpak",
        ["run", APP_ID_PLACEHOLDER, "--", "/bin/bash", "-c", COMMAND_PLACEHOLDER]
    ),
    terminal!(
        "org.wezfurlong.wezterm",
        "flatpak",
        ["run", APP_ID_PLACEHOLDER, "-e", "/bin/bash", "-c", COMMAND_PLACEHOLDER]
    ),
    terminal!(
        "org.kde.konsole",
        "flatpak",
        ["run", APP_ID_PLACEHOLDER, "-e", "/bin/bash", "-c", COMMAND_PLACEHOLDER]
    ),
];

/// Find a terminal by id
pub fn lookup(id: &str) -> Option<&'static TerminalSpec> {
    TERMINALS.iter().find(|t| t.id == id)
}

/// Find a terminal by id, or by the file name of a full executable path
/// such as `/usr/bin/konsole`
pub fn lookup_program(program: &str) -> Option<&'static TerminalSpec> {
    lookup(program).or_else(|| {
        std::path::Path::new(program)
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(lookup)
    })
}

impl TerminalSpec {
    /// Fill in the argument template.
    ///
    /// Substitution is a single left-to-right pass, so placeholder text
    /// inside `command` or `workdir` is never expanded again.
    pub fn expand_args(&self, command: &str, workdir: &str) -> Vec<String> {
        self.args_template
            .iter()
            .map(|arg| expand(arg, command, workdir, self.id))
            .collect()
    }
}

fn expand(template: &str, command: &str, workdir: &str, app_id: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some((idx, placeholder)) = PLACEHOLDERS
        .iter()
        .filter_map(|p| rest.find(p).map(|idx| (idx, *p)))
        .min_by_key(|(idx, _)| *idx)
    {
        out.push_str(&rest[..idx]);
        out.push_str(match placeholder {
            COMMAND_PLACEHOLDER => command,
            WORKDIR_PLACEHOLDER => workdir,
            _ => app_id,
        });
        rest = &rest[idx + placeholder.len()..];
    }

    out.push_str(rest);
    out
}
