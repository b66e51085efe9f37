//! Reads credential entries out of a parsed database document.
//!
//! Groups are taken from the direct `<group>` children of the root element and
//! entries from the direct `<entry>` children of each group. Groups titled
//! [`EXCLUDED_GROUP`] are dropped before any of their entries is read, so a
//! malformed entry inside such a group never causes a failure.

use std::borrow::Cow;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::document::{Children, Document, Node};
use crate::error::{FormatError, MergeResult};
use crate::models::Entry;

/// Title of the group whose entries are never merged
pub const EXCLUDED_GROUP: &str = "Backup";

/// Format of the `lastmod` field
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Human-readable form of [`TIMESTAMP_FORMAT`] used in error messages
const TIMESTAMP_PATTERN: &str = "YYYY-MM-DDTHH:MM:SS";

const GROUP: &str = "group";
const ENTRY: &str = "entry";
const TITLE: &str = "title";
const USERNAME: &str = "username";
const LASTMOD: &str = "lastmod";

/// Parses a `lastmod` value.
///
/// Every field must have its full width and nothing may surround the value.
///
/// # Errors
///
/// Returns [`FormatError::Timestamp`] if the value is not `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_timestamp(value: &str, source_name: &str) -> Result<NaiveDateTime, FormatError> {
    let format_error = |reason: String| FormatError::Timestamp {
        source_name: source_name.to_string(),
        value: value.to_string(),
        expected: TIMESTAMP_PATTERN,
        reason,
    };

    if !has_timestamp_shape(value) {
        return Err(format_error("value does not have the expected shape".to_string()));
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| format_error(e.to_string()))
}

/// Checks the value against [`TIMESTAMP_PATTERN`] character by character.
///
/// chrono alone accepts leading whitespace, signed years and short fields.
fn has_timestamp_shape(value: &str) -> bool {
    value.len() == TIMESTAMP_PATTERN.len()
        && value
            .bytes()
            .zip(TIMESTAMP_PATTERN.bytes())
            .all(|(byte, pattern)| match pattern {
                b'Y' | b'M' | b'D' | b'H' | b'S' => byte.is_ascii_digit(),
                separator => byte == separator,
            })
}

/// A group of an input document
#[derive(Debug, Clone)]
pub struct Group<'d> {
    title: Cow<'d, str>,
    node: Node<'d>,
}

impl<'d> Group<'d> {
    /// Reads the group title from a `<group>` element.
    ///
    /// # Errors
    ///
    /// Returns an error if the group has no `<title>`.
    pub fn from_node(node: Node<'d>) -> MergeResult<Self> {
        let title = node.required_text(TITLE)?;
        let nested = node.children_named(GROUP).count();
        if nested > 0 {
            warn!(
                document = node.document().name(),
                group = %title,
                nested,
                "Ignoring nested groups"
            );
        }
        Ok(Self { title, node })
    }

    /// Returns the group title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns true if the group is excluded from merging
    #[must_use]
    pub fn is_excluded(&self) -> bool {
        self.title == EXCLUDED_GROUP
    }

    /// Returns the entries of the group in document order.
    ///
    /// Entry fields are read as the iterator advances.
    #[must_use]
    pub fn entries(&self) -> GroupEntries<'d> {
        GroupEntries {
            group_title: self.title.clone(),
            nodes: self.node.children_named(ENTRY),
        }
    }
}

/// Lazy sequence of the entries of one group
#[derive(Debug, Clone)]
pub struct GroupEntries<'d> {
    group_title: Cow<'d, str>,
    nodes: Children<'d>,
}

impl<'d> Iterator for GroupEntries<'d> {
    type Item = MergeResult<Entry<'d>>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.next()?;
        Some(read_entry(node, self.group_title.clone()))
    }
}

fn read_entry<'d>(node: Node<'d>, group_title: Cow<'d, str>) -> MergeResult<Entry<'d>> {
    let title = node.required_text(TITLE)?;
    let username = node.required_text(USERNAME)?;
    let lastmod = node.required_text(LASTMOD)?;
    let last_modified = parse_timestamp(&lastmod, node.document().name())?;

    Ok(Entry {
        group_title,
        title,
        username,
        last_modified,
        payload: node.raw(),
    })
}

/// Counters collected while loading one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Groups encountered, excluded ones included
    pub groups: usize,
    /// Groups dropped because of their title
    pub excluded_groups: usize,
    /// Entries read from retained groups
    pub entries: usize,
}

/// Lazy, single-pass sequence of the retained entries of a document.
///
/// Yields entries group by group in document order. After the first error
/// the sequence ends.
#[derive(Debug, Clone)]
pub struct EntryLoader<'d> {
    document: &'d Document,
    groups: Children<'d>,
    current: Option<GroupEntries<'d>>,
    stats: LoadStats,
    failed: bool,
}

impl<'d> EntryLoader<'d> {
    /// Creates a loader over the groups of `document`
    #[must_use]
    pub fn new(document: &'d Document) -> Self {
        Self {
            document,
            groups: document.root().children_named(GROUP),
            current: None,
            stats: LoadStats::default(),
            failed: false,
        }
    }

    /// Returns the counters for the part of the document read so far
    #[must_use]
    pub const fn stats(&self) -> LoadStats {
        self.stats
    }

    fn fail<T>(&mut self, result: MergeResult<T>) -> MergeResult<T> {
        if result.is_err() {
            self.failed = true;
        }
        result
    }
}

impl<'d> Iterator for EntryLoader<'d> {
    type Item = MergeResult<Entry<'d>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            if let Some(entry) = self.current.as_mut().and_then(Iterator::next) {
                self.stats.entries += 1;
                return Some(self.fail(entry));
            }
            self.current = None;

            let node = self.groups.next()?;
            let group = match self.fail(Group::from_node(node)) {
                Ok(group) => group,
                Err(e) => return Some(Err(e)),
            };
            self.stats.groups += 1;

            if group.is_excluded() {
                self.stats.excluded_groups += 1;
                debug!(
                    document = self.document.name(),
                    group = group.title(),
                    "Skipping excluded group"
                );
                continue;
            }
            self.current = Some(group.entries());
        }
    }
}

/// Returns the retained entries of a document as a lazy sequence.
#[must_use]
pub fn load_entries(document: &Document) -> EntryLoader<'_> {
    EntryLoader::new(document)
}
