//! CLI command handlers

mod apps;
mod config;
mod containers;
mod terminals;

pub use apps::*;
pub use config::*;
pub use containers::*;
pub use terminals::*;
