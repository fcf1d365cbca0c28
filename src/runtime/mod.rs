//! Process execution and host environment detection

mod exec;
mod host;

pub use exec::*;
pub use host::*;
