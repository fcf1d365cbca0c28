//! Container lifecycle commands

use crate::distrobox::{DistroboxError, DistroboxManager};
use crate::runtime::Runner;
use crate::terminal::Terminal;

/// List existing containers
pub fn list_containers<R: Runner, T: Terminal>(
    manager: &DistroboxManager<R, T>,
    json: bool,
) -> Result<(), DistroboxError> {
    if json {
        println!("{}", manager.list_json()?);
        return Ok(());
    }

    let containers = manager.list()?;
    if containers.is_empty() {
        println!("No containers found.");
        println!();
        println!("Create one with: kontainer create <name> <image>");
        return Ok(());
    }

    println!("Containers:");
    println!();
    for container in &containers {
        println!("  {}", container.name);
        println!("    Status: {}", container.status);
        println!("    Image:  {}", container.image);
        println!();
    }

    Ok(())
}

/// List images that can be used to create a container
pub fn list_images<R: Runner, T: Terminal>(
    manager: &DistroboxManager<R, T>,
    json: bool,
) -> Result<(), DistroboxError> {
    if json {
        println!("{}", manager.available_images_json()?);
        return Ok(());
    }

    let images = manager.available_images()?;
    println!("Available images:");
    println!();
    for image in images.to_vec() {
        println!("  {:<32} {}", image.name, image.image);
    }

    Ok(())
}

pub fn create_container<R: Runner, T: Terminal>(
    manager: &DistroboxManager<R, T>,
    name: &str,
    image: &str,
    extra_args: &str,
) -> Result<(), DistroboxError> {
    println!("[kontainer] Creating {} from {}...", name, image);
    let output = manager.create(name, image, extra_args)?;
    if !output.trim().is_empty() {
        println!("{}", output.trim_end());
    }
    println!("[kontainer] Container {} created.", name);
    Ok(())
}

pub fn enter_container<R: Runner, T: Terminal>(
    manager: &DistroboxManager<R, T>,
    name: &str,
) -> Result<(), DistroboxError> {
    manager.enter(name)?;
    println!("[kontainer] Opened a terminal in {}.", name);
    Ok(())
}

pub fn remove_container<R: Runner, T: Terminal>(
    manager: &DistroboxManager<R, T>,
    name: &str,
) -> Result<(), DistroboxError> {
    println!("[kontainer] Removing {}...", name);
    manager.remove(name)?;
    println!("[kontainer] Container {} removed.", name);
    Ok(())
}

pub fn upgrade_container<R: Runner, T: Terminal>(
    manager: &DistroboxManager<R, T>,
    name: &str,
) -> Result<(), DistroboxError> {
    manager.upgrade(name)?;
    println!("[kontainer] Upgrading {} in a new terminal.", name);
    Ok(())
}

pub fn generate_entry<R: Runner, T: Terminal>(
    manager: &DistroboxManager<R, T>,
    name: Option<&str>,
) -> Result<(), DistroboxError> {
    manager.generate_entry(name)?;
    match name {
        Some(name) => println!("[kontainer] Generated a launcher for {}.", name),
        None => println!("[kontainer] Generated launchers for all containers."),
    }
    Ok(())
}

pub fn install_package<R: Runner, T: Terminal>(
    manager: &DistroboxManager<R, T>,
    name: &str,
    package: &str,
    image: &str,
) -> Result<(), DistroboxError> {
    manager.install_package(name, package, image)?;
    println!("[kontainer] Installing {} in {} in a new terminal.", package, name);
    Ok(())
}
