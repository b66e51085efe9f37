//! Data models for credential entries and the merged database.

use std::borrow::Cow;

use chrono::NaiveDateTime;

/// A credential record read from a database document.
///
/// Text fields borrow from the source document unless they contained entity
/// references. The payload is the complete `<entry>` element as it appears in
/// the source and is never inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<'d> {
    /// Title of the group that owned the entry at load time
    pub group_title: Cow<'d, str>,
    /// Credential name
    pub title: Cow<'d, str>,
    /// Account user name
    pub username: Cow<'d, str>,
    /// Value of the `lastmod` field
    pub last_modified: NaiveDateTime,
    /// Verbatim source text of the entry element
    pub payload: &'d str,
}

impl Entry<'_> {
    /// Returns the key under which entries are considered the same credential
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey<'_> {
        IdentityKey {
            group_title: &self.group_title,
            title: &self.title,
            username: &self.username,
        }
    }
}

/// Identity of a credential across input databases.
///
/// Ordering is lexicographic over the fields in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityKey<'a> {
    /// Owning group title
    pub group_title: &'a str,
    /// Credential name
    pub title: &'a str,
    /// Account user name
    pub username: &'a str,
}

/// A group of the merged database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedGroup<'d> {
    /// Group title
    pub title: Cow<'d, str>,
    /// Entries, ascending by title then user name
    pub entries: Vec<Entry<'d>>,
}

/// The merged database handed to the writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedDatabase<'d> {
    /// Groups, ascending by title
    pub groups: Vec<MergedGroup<'d>>,
}

impl<'d> MergedDatabase<'d> {
    /// Returns true if the database has no groups
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the total number of entries across all groups
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    /// Iterates over all entries in output order
    pub fn entries(&self) -> impl Iterator<Item = &Entry<'d>> {
        self.groups.iter().flat_map(|g| g.entries.iter())
    }
}
