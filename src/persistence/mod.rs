//! # Persistence Module
//!
//! One TOML file holds everything the user can configure: engine tuning,
//! key bindings and controller settings (see [`crate::config::AppConfig`]).
//!
//! ## Error Handling Strategy
//! Uses `color_eyre` for file and parse errors. A missing file is not an
//! error: defaults are written out so the user has something to edit. A file
//! that parses but fails validation is rejected rather than silently fixed.

pub mod config_store;

pub use config_store::ConfigStore;
