//! Desktop-service lookup for the native (unsandboxed) terminal choice

use crate::desktop::DesktopEntry;
use crate::storage::paths;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A terminal found through the desktop-service registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalService {
    /// Desktop-entry name, e.g. `org.kde.konsole`. `None` for a service
    /// synthesized from a bare executable string.
    pub desktop_name: Option<String>,
    /// Executable plus arguments, with field codes removed
    pub exec: String,
    pub entry_path: Option<PathBuf>,
}

impl TerminalService {
    pub fn from_exec(exec: &str) -> Self {
        Self {
            desktop_name: None,
            exec: exec.trim().to_string(),
            entry_path: None,
        }
    }
}

pub trait ServiceRegistry {
    fn lookup(&self, storage_id: &str) -> Option<TerminalService>;
}

/// Registry with nothing in it
#[derive(Debug, Clone, Copy, Default)]
pub struct NoServices;

impl ServiceRegistry for NoServices {
    fn lookup(&self, _storage_id: &str) -> Option<TerminalService> {
        None
    }
}

/// Looks services up in the XDG applications directories
#[derive(Debug, Clone)]
pub struct XdgServiceRegistry {
    dirs: Vec<PathBuf>,
}

impl Default for XdgServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl XdgServiceRegistry {
    pub fn new() -> Self {
        Self::with_dirs(paths::xdg_application_dirs())
    }

    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    fn find_entry(&self, desktop_id: &str) -> Option<PathBuf> {
        self.dirs.iter().find_map(|dir| find_in_dir(dir, desktop_id))
    }
}

impl ServiceRegistry for XdgServiceRegistry {
    fn lookup(&self, storage_id: &str) -> Option<TerminalService> {
        let name = storage_id.strip_suffix(".desktop").unwrap_or(storage_id);
        if name.is_empty() {
            return None;
        }

        let path = self.find_entry(&format!("{}.desktop", name))?;
        let entry = DesktopEntry::read(&path).ok()?;

        if entry.get("Hidden") == Some("true") {
            debug!(id = name, "service is hidden");
            return None;
        }

        let exec = strip_field_codes(entry.get("Exec")?);
        if exec.is_empty() {
            return None;
        }

        debug!(id = name, %exec, path = %path.display(), "service found");
        Some(TerminalService {
            desktop_name: Some(name.to_string()),
            exec,
            entry_path: Some(path),
        })
    }
}

/// Desktop-file ids map subdirectories to `-`, so `kde4/konsole.desktop`
/// is `kde4-konsole.desktop`.
fn find_in_dir(dir: &Path, desktop_id: &str) -> Option<PathBuf> {
    let direct = dir.join(desktop_id);
    if direct.is_file() {
        return Some(direct);
    }

    WalkDir::new(dir)
        .min_depth(2)
        .max_depth(3)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .find(|e| {
            e.path()
                .strip_prefix(dir)
                .ok()
                .and_then(|rel| rel.to_str())
                .is_some_and(|rel| rel.replace('/', "-") == desktop_id)
        })
        .map(|e| e.into_path())
}

/// Remove `%f`, `%U` and friends from an `Exec=` value
pub fn strip_field_codes(exec: &str) -> String {
    const CODES: &[&str] = &[
        "%f", "%F", "%u", "%U", "%d", "%D", "%n", "%N", "%i", "%c", "%k", "%v", "%m",
    ];

    match shell_words::split(exec) {
        Ok(words) => {
            let kept: Vec<String> = words
                .into_iter()
                .filter(|w| !CODES.contains(&w.as_str()))
                .map(|w| w.replace("%%", "%"))
                .collect();
            shell_words::join(kept)
        }
        Err(_) => exec
            .split_whitespace()
            .filter(|w| !CODES.contains(w))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_entry(dir: &Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn field_codes_are_removed() {
        assert_eq!(strip_field_codes("konsole %U"), "konsole");
        assert_eq!(strip_field_codes("kitty --single-instance %F"), "kitty --single-instance");
    }

    #[test]
    fn finds_service_by_storage_id() {
        let dir = TempDir::new().unwrap();
        write_entry(
            dir.path(),
            "org.kde.konsole.desktop",
            "[Desktop Entry]\nName=Konsole\nExec=konsole %U\nIcon=utilities-terminal\n",
        );
        let registry = XdgServiceRegistry::with_dirs(vec![dir.path().to_path_buf()]);

        let service = registry.lookup("org.kde.konsole").unwrap();
        assert_eq!(service.exec, "konsole");
        assert_eq!(service.desktop_name.as_deref(), Some("org.kde.konsole"));

        assert!(registry.lookup("org.kde.konsole.desktop").is_some());
        assert!(registry.lookup("org.gnome.Console").is_none());
    }

    #[test]
    fn earlier_dirs_win() {
        let user = TempDir::new().unwrap();
        let system = TempDir::new().unwrap();
        write_entry(user.path(), "xterm.desktop", "[Desktop Entry]\nExec=xterm -fa Mono\n");
        write_entry(system.path(), "xterm.desktop", "[Desktop Entry]\nExec=xterm\n");

        let registry = XdgServiceRegistry::with_dirs(vec![
            user.path().to_path_buf(),
            system.path().to_path_buf(),
        ]);
        assert_eq!(registry.lookup("xterm").unwrap().exec, "xterm -fa Mono");
    }

    #[test]
    fn subdirectory_ids_use_dashes() {
        let dir = TempDir::new().unwrap();
        write_entry(dir.path(), "kde4/konsole.desktop", "[Desktop Entry]\nExec=konsole\n");
        let registry = XdgServiceRegistry::with_dirs(vec![dir.path().to_path_buf()]);
        assert!(registry.lookup("kde4-konsole").is_some());
    }

    #[test]
    fn hidden_or_execless_entries_are_skipped() {
        let dir = TempDir::new().unwrap();
        write_entry(dir.path(), "a.desktop", "[Desktop Entry]\nExec=a\nHidden=true\n");
        write_entry(dir.path(), "b.desktop", "[Desktop Entry]\nName=B\n");
        let registry = XdgServiceRegistry::with_dirs(vec![dir.path().to_path_buf()]);
        assert!(registry.lookup("a").is_none());
        assert!(registry.lookup("b").is_none());
    }
}
