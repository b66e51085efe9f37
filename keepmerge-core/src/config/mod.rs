//! Configuration management for `keepmerge`
//!
//! This module provides the `ConfigManager` for loading and saving
//! the configuration file in TOML format.

mod manager;
pub mod settings;

pub use manager::ConfigManager;
pub use settings::{LoggingSettings, MergeSettings, OutputSettings};
