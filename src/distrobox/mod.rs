//! Container management through the `distrobox` tool

pub mod command;
mod list;
mod manager;
mod package;

pub use list::*;
pub use manager::*;
pub use package::*;
