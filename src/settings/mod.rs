//! User settings

mod config;

pub use config::*;
