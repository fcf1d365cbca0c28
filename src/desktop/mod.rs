//! Desktop integration - .desktop file parsing

mod entry;

pub use entry::*;
