//! Application export commands

use crate::desktop::DesktopApp;
use crate::distrobox::{DistroboxError, DistroboxManager};
use crate::runtime::Runner;
use crate::terminal::Terminal;

/// List apps installed in a container
pub fn list_available_apps<R: Runner, T: Terminal>(
    manager: &DistroboxManager<R, T>,
    container: &str,
    json: bool,
) -> Result<(), DistroboxError> {
    let apps = manager.available_apps(container);
    if json {
        println!("{}", serde_json::to_string(&apps)?);
        return Ok(());
    }

    if apps.is_empty() {
        println!("No applications found in {}.", container);
        return Ok(());
    }

    println!("Applications in {}:", container);
    println!();
    print_apps(&apps);
    println!();
    println!("Export one with: kontainer export {} <basename>", container);

    Ok(())
}

/// List apps of a container that are exported to the host
pub fn list_exported_apps<R: Runner, T: Terminal>(
    manager: &DistroboxManager<R, T>,
    container: &str,
    json: bool,
) -> Result<(), DistroboxError> {
    let apps = manager.exported_apps(container);
    if json {
        println!("{}", serde_json::to_string(&apps)?);
        return Ok(());
    }

    if apps.is_empty() {
        println!("No applications exported from {}.", container);
        return Ok(());
    }

    println!("Exported from {}:", container);
    println!();
    print_apps(&apps);

    Ok(())
}

pub fn export_app<R: Runner, T: Terminal>(
    manager: &DistroboxManager<R, T>,
    container: &str,
    basename: &str,
) -> Result<(), DistroboxError> {
    println!("[kontainer] Exporting {} from {}...", basename, container);
    manager.export_app(container, basename)?;
    println!("[kontainer] {} is now available on the host.", basename);
    Ok(())
}

pub fn unexport_app<R: Runner, T: Terminal>(
    manager: &DistroboxManager<R, T>,
    container: &str,
    basename: &str,
) -> Result<(), DistroboxError> {
    println!("[kontainer] Unexporting {} from {}...", basename, container);
    manager.unexport_app(container, basename)?;
    println!("[kontainer] {} removed from the host.", basename);
    Ok(())
}

fn print_apps(apps: &[DesktopApp]) {
    for app in apps {
        println!("  {} ({})", app.name, app.basename);
        if !app.icon.is_empty() {
            println!("    Icon: {}", app.icon);
        }
    }
}
