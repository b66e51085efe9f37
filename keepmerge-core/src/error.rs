//! Error types for `keepmerge`
//!
//! This module defines the error types used throughout the merge pipeline,
//! providing descriptive messages for document parsing, timestamp format,
//! configuration and file I/O failures. Every error is fatal to a merge run.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for merge operations
#[derive(Debug, Error)]
pub enum MergeError {
    /// An input document is structurally invalid
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// A field value does not match its expected format
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An input file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// The file that could not be read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The output file could not be written
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// The destination that could not be written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl MergeError {
    /// Returns true if the error originates from the content of an input document
    #[must_use]
    pub const fn is_document_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Format(_))
    }

    /// Returns true if the error is a file system failure
    #[must_use]
    pub const fn is_io_error(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Write { .. })
    }
}

/// Errors raised while parsing a database document
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not well-formed XML
    #[error("Failed to parse {source_name}: {reason}")]
    Xml {
        /// The document being parsed
        source_name: String,
        /// The reason for parse failure
        reason: String,
    },

    /// The document is not valid UTF-8
    #[error("{source_name} is not valid UTF-8: {reason}")]
    NotUtf8 {
        /// The document being parsed
        source_name: String,
        /// The decoding failure
        reason: String,
    },

    /// The document has no root element
    #[error("{0} has no root element")]
    MissingRoot(String),

    /// A required element is absent
    #[error("Missing <{element}> in <{parent}> of {source_name}")]
    MissingElement {
        /// The document being parsed
        source_name: String,
        /// Name of the element that owns the missing child
        parent: String,
        /// Name of the missing child element
        element: String,
    },
}

/// Errors raised when a field does not match its expected format
#[derive(Debug, Error)]
pub enum FormatError {
    /// A `lastmod` value is not a valid `YYYY-MM-DDTHH:MM:SS` timestamp
    #[error("Invalid timestamp '{value}' in {source_name} (expected {expected}): {reason}")]
    Timestamp {
        /// The document the value came from
        source_name: String,
        /// The offending value
        value: String,
        /// The expected format
        expected: &'static str,
        /// The parser failure
        reason: String,
    },
}

/// Errors related to configuration file operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to write configuration file
    #[error("Failed to write configuration: {0}")]
    Write(String),

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    /// Failed to deserialize configuration
    #[error("Failed to deserialize configuration: {0}")]
    Deserialize(String),
}

/// Result type alias for merge operations
pub type MergeResult<T> = std::result::Result<T, MergeError>;

/// Result type alias for document parsing
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
