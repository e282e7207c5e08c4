//! User configuration stored in `~/.locus/config.ini`.
//!
//! Settings structs live in [`settings`], defaults in [`defaults`], parsing
//! in `parser` and serialization in `writer`.
//!
//! # Example
//!
//! ```ignore
//! use locus::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! println!("grace: {} ms", config.tracking.reattach_grace_ms);
//! ```

pub mod defaults;
mod file;
mod parser;
pub mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, LoggingSettings, PreferencesSettings, SimulationSettings, TrackingSettings,
};
