//! Settings commands

use crate::settings::{Settings, SettingsError};
use crate::storage::paths;

/// Print the effective settings
pub fn show_config() -> Result<(), SettingsError> {
    let settings = Settings::load()?;
    let path = paths::settings_path();

    println!("Settings file: {}", path.display());
    println!();
    println!("[General]");
    println!("  TerminalApplication = {}", display(settings.terminal_application()));
    println!("  TerminalService     = {}", display(settings.terminal_service()));

    Ok(())
}

/// Save the preferred terminal executable; empty clears it
pub fn set_terminal(application: &str) -> Result<(), SettingsError> {
    let path = paths::settings_path();
    let mut settings = Settings::load_from(&path)?;
    settings.general.terminal_application = application.trim().to_string();
    settings.save_to(&path)?;

    println!("[kontainer] TerminalApplication set to {}", display(application.trim()));
    Ok(())
}

/// Save the preferred terminal desktop service; empty clears it
pub fn set_service(service: &str) -> Result<(), SettingsError> {
    let path = paths::settings_path();
    let mut settings = Settings::load_from(&path)?;
    settings.general.terminal_service = service.trim().to_string();
    settings.save_to(&path)?;

    println!("[kontainer] TerminalService set to {}", display(service.trim()));
    Ok(())
}

fn display(value: &str) -> &str {
    if value.is_empty() { "(not set)" } else { value }
}
