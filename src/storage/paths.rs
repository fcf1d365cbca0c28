//! Directory path management for Kontainer

use std::path::{Path, PathBuf};

/// Get the config directory (~/.config/kontainer)
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(crate::APP_NAME)
}

/// Get the settings file path
pub fn settings_path() -> PathBuf {
    config_dir().join("kontainerrc.toml")
}

/// Get the host applications directory that exported entries land in.
///
/// Inside a sandbox `XDG_DATA_HOME` points at the sandbox's private data
/// directory, so the real `~/.local/share/applications` is used instead.
pub fn applications_dir(sandboxed: bool) -> PathBuf {
    if sandboxed {
        return dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".local/share/applications");
    }

    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("applications")
}

/// Get the path `distrobox-export` writes an app of a container to, under
/// the host applications directory `apps_dir`
pub fn exported_desktop_path(apps_dir: &Path, container: &str, basename: &str) -> PathBuf {
    apps_dir.join(format!("{}-{}.desktop", container, basename))
}

/// Get every XDG applications directory, most specific first
pub fn xdg_application_dirs() -> Vec<PathBuf> {
    let mut dirs_out = vec![applications_dir(false)];

    let data_dirs = std::env::var_os("XDG_DATA_DIRS")
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".into());

    for dir in std::env::split_paths(&data_dirs) {
        let apps = dir.join("applications");
        if !dirs_out.contains(&apps) {
            dirs_out.push(apps);
        }
    }

    dirs_out
}

/// Get the home directory, used as the working directory of package installs
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}
