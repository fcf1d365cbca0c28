//! Storage locations for Kontainer

pub mod paths;

pub use paths::*;
