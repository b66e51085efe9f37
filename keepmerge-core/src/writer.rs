//! Serialization of the merged database.
//!
//! Groups are written fresh from their title. Entries are copied verbatim
//! from their source documents.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::{debug, info_span};

use crate::config::OutputSettings;
use crate::error::{MergeError, MergeResult};
use crate::models::MergedDatabase;

const DATABASE: &str = "database";
const GROUP: &str = "group";
const TITLE: &str = "title";

/// Options controlling the document prologue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Write an XML declaration
    pub xml_declaration: bool,
    /// Name for a `<!DOCTYPE ...>` line, if any
    pub doctype: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::from(&OutputSettings::default())
    }
}

impl From<&OutputSettings> for WriteOptions {
    fn from(settings: &OutputSettings) -> Self {
        Self {
            xml_declaration: settings.xml_declaration,
            doctype: settings
                .doctype
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }
}

impl WriteOptions {
    /// Options producing only the `<database>` element
    #[must_use]
    pub const fn bare() -> Self {
        Self {
            xml_declaration: false,
            doctype: None,
        }
    }
}

/// Writes the database as XML.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_database<W: Write>(
    database: &MergedDatabase<'_>,
    options: &WriteOptions,
    out: W,
) -> io::Result<()> {
    let mut writer = Writer::new(out);

    if options.xml_declaration {
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.get_mut().write_all(b"\n")?;
    }
    if let Some(ref doctype) = options.doctype {
        writer.write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))?;
        writer.get_mut().write_all(b"\n")?;
    }

    if database.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(DATABASE)))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new(DATABASE)))?;
        for group in &database.groups {
            writer.write_event(Event::Start(BytesStart::new(GROUP)))?;
            writer.write_event(Event::Start(BytesStart::new(TITLE)))?;
            writer.write_event(Event::Text(BytesText::new(&group.title)))?;
            writer.write_event(Event::End(BytesEnd::new(TITLE)))?;
            for entry in &group.entries {
                writer.get_mut().write_all(entry.payload.as_bytes())?;
            }
            writer.write_event(Event::End(BytesEnd::new(GROUP)))?;
        }
        writer.write_event(Event::End(BytesEnd::new(DATABASE)))?;
    }

    writer.get_mut().write_all(b"\n")
}

/// Renders the database to a string.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_xml_string(database: &MergedDatabase<'_>, options: &WriteOptions) -> io::Result<String> {
    let mut buffer = Vec::new();
    write_database(database, options, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Writes the database to `path`, replacing it only once writing succeeded.
///
/// The document is written to a temporary file next to `path` which is then
/// renamed over it. On failure the temporary file is removed and an existing
/// file at `path` is left untouched.
///
/// # Errors
///
/// Returns [`MergeError::Write`] if the temporary file cannot be created,
/// written or renamed.
pub fn write_atomic(
    path: &Path,
    database: &MergedDatabase<'_>,
    options: &WriteOptions,
) -> MergeResult<()> {
    let _span = info_span!("write", path = %path.display()).entered();

    let write_error = |source: io::Error| MergeError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::Builder::new()
        .prefix(".keepmerge-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_error)?;

    write_to_file(temp.as_file_mut(), database, options).map_err(write_error)?;
    debug!(temp = %temp.path().display(), "Serialized merged database");

    temp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

fn write_to_file(
    file: &mut File,
    database: &MergedDatabase<'_>,
    options: &WriteOptions,
) -> io::Result<()> {
    let mut out = BufWriter::new(&mut *file);
    write_database(database, options, &mut out)?;
    out.flush()?;
    drop(out);
    file.sync_all()
}
