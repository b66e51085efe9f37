//! `keepmerge` Core Library
//!
//! This crate merges KeePassX XML database exports into one database. Entries
//! describing the same credential, identified by group title, entry title and
//! user name, are reduced to the most recently modified one. Entries of the
//! group titled "Backup" are never merged.
//!
//! The pipeline is [`Document::parse`] or [`Document::open`], then
//! [`merge`], then [`write_atomic`]; [`merge_files`] runs all three.

pub mod config;
pub mod document;
pub mod error;
pub mod loader;
pub mod merge;
pub mod models;
pub mod writer;

pub use config::{ConfigManager, LoggingSettings, MergeSettings, OutputSettings};
pub use document::{Document, Node};
pub use error::{
    ConfigError, ConfigResult, FormatError, MergeError, MergeResult, ParseError, ParseResult,
};
pub use loader::{load_entries, EntryLoader, Group, LoadStats, EXCLUDED_GROUP, TIMESTAMP_FORMAT};
pub use merge::{deduplicate, merge, merge_files, regroup, MergeReport, Merged};
pub use models::{Entry, IdentityKey, MergedDatabase, MergedGroup};
pub use writer::{to_xml_string, write_atomic, write_database, WriteOptions};
