//! Terminal emulator selection and launching

mod launcher;
mod registry;
mod resolver;
mod service;

pub use launcher::*;
pub use registry::*;
pub use resolver::*;
pub use service::*;
