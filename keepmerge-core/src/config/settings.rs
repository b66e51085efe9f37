//! Merge settings model
//!
//! This module defines the settings stored in config.toml. None of them
//! changes which entries end up in a merged database.

use serde::{Deserialize, Serialize};

/// Default `<!DOCTYPE>` name of KeePassX XML exports
pub const KEEPASSX_DOCTYPE: &str = "KEEPASSX_DATABASE";

/// Tool-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSettings {
    /// Output document settings
    #[serde(default)]
    pub output: OutputSettings,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Output document settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Write an XML declaration at the top of the merged document
    #[serde(default = "default_true")]
    pub xml_declaration: bool,
    /// Doctype name written after the declaration; empty for none
    #[serde(default = "default_doctype")]
    pub doctype: Option<String>,
}

const fn default_true() -> bool {
    true
}

#[allow(clippy::unnecessary_wraps)]
fn default_doctype() -> Option<String> {
    Some(KEEPASSX_DOCTYPE.to_string())
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            xml_declaration: default_true(),
            doctype: default_doctype(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log filter used when `RUST_LOG` is not set (e.g. "warn", "keepmerge_core=debug")
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}
