//! Terminal inspection commands

use crate::runtime::{Environment, HostProbe};
use crate::settings::{Settings, SettingsError};
use crate::terminal::{
    ResolveError, TERMINALS, TerminalPreferences, TerminalResolver, XdgServiceRegistry,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerminalCommandError {
    #[error("Settings error: {0}")]
    SettingsError(#[from] SettingsError),

    #[error(transparent)]
    ResolveError(#[from] ResolveError),
}

/// Print every supported terminal emulator
pub fn list_terminals() {
    println!("Supported terminals:");
    println!();
    for terminal in TERMINALS {
        if terminal.executable == terminal.id {
            println!("  {}", terminal.id);
        } else {
            println!("  {:<32} (runs {})", terminal.id, terminal.executable);
        }
    }
}

/// Show the invocation that would run `command` in a terminal
pub fn resolve_terminal(command: &str, workdir: &str) -> Result<(), TerminalCommandError> {
    let settings = Settings::load()?;
    let environment = Environment::detect();
    let sandboxed = environment.is_sandboxed();

    let resolver = TerminalResolver::new(
        environment,
        XdgServiceRegistry::new(),
        TerminalPreferences::from(&settings),
    );
    let config = resolver.resolve(command, workdir)?;

    println!("{}", config.command_line());
    if let Some(dir) = config.command.working_dir() {
        println!("  Directory: {}", dir.display());
    }
    if let Some(name) = &config.desktop_name {
        println!("  Service:   {}", name);
    }
    if sandboxed {
        println!("  Sandboxed: yes");
    }

    Ok(())
}
