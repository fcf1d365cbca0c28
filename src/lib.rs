//! Kontainer - Distrobox container management
//!
//! Creates and manages Distrobox containers, exports their applications to
//! the host and opens interactive container sessions in the user's terminal
//! emulator, also from inside a Flatpak sandbox.

pub mod cli;
pub mod desktop;
pub mod distrobox;
pub mod runtime;
pub mod settings;
pub mod storage;
pub mod terminal;

pub use distrobox::DistroboxManager;
pub use settings::Settings;
pub use storage::paths;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "kontainer";

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "KONTAINER_LOG";
