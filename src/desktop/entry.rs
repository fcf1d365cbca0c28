//! Desktop entry (.desktop file) parsing

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Where apps live inside a container
pub const CONTAINER_APPLICATIONS_DIR: &str = "/usr/share/applications/";

/// Suffix `distrobox-export` appends when two containers export the same app
pub const DISAMBIGUATION_MARKER: &str = " (on ";

const DESKTOP_SUFFIX: &str = ".desktop";
const ENTRY_GROUP: &str = "Desktop Entry";

#[derive(Error, Debug)]
pub enum DesktopError {
    #[error("Failed to read desktop entry: {0}")]
    ReadError(#[from] std::io::Error),
}

/// A launchable application as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesktopApp {
    /// Stable id used by every later operation on the app
    pub basename: String,
    pub name: String,
    pub icon: String,
}

/// Key/value pairs of a desktop entry. The first occurrence of a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesktopEntry {
    fields: HashMap<String, String>,
}

impl DesktopEntry {
    /// Parse only the `[Desktop Entry]` group of a local file's content
    pub fn parse(text: &str) -> Self {
        let mut entry = Self::default();
        let mut in_group = false;

        for line in text.lines() {
            let line = line.trim();
            if let Some(group) = group_header(line) {
                in_group = group == ENTRY_GROUP;
                continue;
            }
            if in_group {
                entry.offer(line);
            }
        }

        entry
    }

    /// Scan every `key=value` line, ignoring group headers. Used for text
    /// captured from inside a container where there's no file to open.
    pub fn scan_lines(text: &str) -> Self {
        let mut entry = Self::default();
        for line in text.lines() {
            let line = line.trim();
            if group_header(line).is_none() {
                entry.offer(line);
            }
        }
        entry
    }

    pub fn read(path: &Path) -> Result<Self, DesktopError> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// English name if present, else the default name
    pub fn display_name(&self) -> Option<&str> {
        self.get("Name[en]").or_else(|| self.get("Name"))
    }

    pub fn to_app(&self, basename: &str) -> DesktopApp {
        let name = self.display_name().unwrap_or(basename);
        DesktopApp {
            basename: basename.to_string(),
            name: name.to_string(),
            icon: self.get("Icon").unwrap_or_default().to_string(),
        }
    }

    fn offer(&mut self, line: &str) {
        if line.is_empty() || line.starts_with('#') {
            return;
        }
        let Some((key, value)) = line.split_once('=') else {
            return;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            return;
        }
        self.fields
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }
}

fn group_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']')
}

/// Parse desktop-entry text captured from a container
pub fn parse_desktop_text(text: &str, basename: &str) -> DesktopApp {
    DesktopEntry::scan_lines(text).to_app(basename)
}

/// Parse a desktop file exported to the host, dropping the container suffix
/// from its name
pub fn parse_desktop_file(path: &Path, basename: &str) -> Result<DesktopApp, DesktopError> {
    let mut app = DesktopEntry::read(path)?.to_app(basename);
    app.name = clean_display_name(&app.name).to_string();
    Ok(app)
}

/// Drop the `" (on <container>)"` suffix added to exported app names
pub fn clean_display_name(name: &str) -> &str {
    match name.find(DISAMBIGUATION_MARKER) {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// `/usr/share/applications/firefox.desktop` -> `firefox`
pub fn basename_from_container_path(path: &str) -> Option<String> {
    let stem = path.strip_suffix(DESKTOP_SUFFIX)?;
    let stem = stem
        .strip_prefix(CONTAINER_APPLICATIONS_DIR)
        .unwrap_or(stem);
    (!stem.is_empty()).then(|| stem.to_string())
}

/// `ubuntu-22-firefox.desktop` exported from `ubuntu-22` -> `firefox`
pub fn basename_from_exported_file(file_name: &str, container: &str) -> Option<String> {
    let stem = file_name.strip_suffix(DESKTOP_SUFFIX)?;
    let prefix = format!("{}-", container);
    let stem = stem.strip_prefix(&prefix).unwrap_or(stem);
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Full in-container path of an app's desktop file
pub fn container_desktop_path(basename: &str) -> String {
    format!("{}{}{}", CONTAINER_APPLICATIONS_DIR, basename, DESKTOP_SUFFIX)
}
