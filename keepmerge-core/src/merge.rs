//! Deduplication and regrouping of credential entries.
//!
//! Entries from every input document are concatenated in input order, sorted
//! by identity key and reduced to the most recently modified entry per key.
//! The survivors are then split into groups by title.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::document::Document;
use crate::error::MergeResult;
use crate::loader::EntryLoader;
use crate::models::{Entry, MergedDatabase, MergedGroup};
use crate::writer::{write_atomic, WriteOptions};

/// Counters describing one merge run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Number of input documents
    pub documents: usize,
    /// Groups encountered across all inputs, excluded ones included
    pub groups_seen: usize,
    /// Groups dropped because of their title
    pub excluded_groups: usize,
    /// Entries read from retained groups
    pub entries_loaded: usize,
    /// Entries discarded in favour of a more recent one with the same identity
    pub duplicates_dropped: usize,
    /// Groups in the merged database
    pub groups_written: usize,
    /// Entries in the merged database
    pub entries_written: usize,
}

impl MergeReport {
    /// Returns a summary string of the merge
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Documents: {}, Entries: {}, Duplicates dropped: {}, Excluded groups: {}, Written: {} entries in {} groups",
            self.documents,
            self.entries_loaded,
            self.duplicates_dropped,
            self.excluded_groups,
            self.entries_written,
            self.groups_written
        )
    }
}

/// Result of merging a set of documents
#[derive(Debug, Clone)]
pub struct Merged<'d> {
    /// The merged database
    pub database: MergedDatabase<'d>,
    /// Counters for the run
    pub report: MergeReport,
}

/// Merges documents into one database.
///
/// Documents are read in the given order; their order only matters for
/// entries with the same identity and the same modification time, where the
/// earliest one wins.
///
/// # Errors
///
/// Returns the first parse or format error found in any document.
pub fn merge(documents: &[Document]) -> MergeResult<Merged<'_>> {
    let _span = info_span!("merge", documents = documents.len()).entered();

    let mut report = MergeReport {
        documents: documents.len(),
        ..MergeReport::default()
    };

    let mut entries = Vec::new();
    for document in documents {
        let _span = info_span!("load", document = document.name()).entered();
        let mut loader = EntryLoader::new(document);
        for entry in loader.by_ref() {
            entries.push(entry?);
        }

        let stats = loader.stats();
        debug!(
            groups = stats.groups,
            excluded = stats.excluded_groups,
            entries = stats.entries,
            "Loaded document"
        );
        report.groups_seen += stats.groups;
        report.excluded_groups += stats.excluded_groups;
        report.entries_loaded += stats.entries;
    }

    let survivors = deduplicate(entries);
    report.duplicates_dropped = report.entries_loaded - survivors.len();

    let database = regroup(survivors);
    report.groups_written = database.groups.len();
    report.entries_written = database.entry_count();

    info!(
        entries = report.entries_written,
        groups = report.groups_written,
        duplicates = report.duplicates_dropped,
        "Merge completed"
    );

    Ok(Merged { database, report })
}

/// Merges database files into `output`.
///
/// Every input is read and parsed before anything is written. The output is
/// replaced atomically, so a failed run leaves no partial file behind.
///
/// # Errors
///
/// Returns an error if an input cannot be read or parsed, or if the output
/// cannot be written.
pub fn merge_files<P: AsRef<Path>>(
    inputs: &[P],
    output: &Path,
    options: &WriteOptions,
) -> MergeResult<MergeReport> {
    let documents = inputs
        .iter()
        .map(|path| Document::open(path.as_ref()))
        .collect::<MergeResult<Vec<_>>>()?;

    let merged = merge(&documents)?;
    write_atomic(output, &merged.database, options)?;
    Ok(merged.report)
}

/// Reduces entries to one per identity key.
///
/// `entries` must be in input order. The result is ascending by identity
/// key. Within a key the entry with the latest modification time is kept;
/// on equal times the one that came first in input order is kept.
#[must_use]
pub fn deduplicate(mut entries: Vec<Entry<'_>>) -> Vec<Entry<'_>> {
    // sort_by is stable, equal keys keep their input order
    entries.sort_by(|a, b| a.identity_key().cmp(&b.identity_key()));

    entries
        .chunk_by(|a, b| a.identity_key() == b.identity_key())
        .filter_map(most_recent)
        .cloned()
        .collect()
}

/// Returns the entry with the latest modification time, the first one on ties.
#[must_use]
pub fn most_recent<'a, 'd>(run: &'a [Entry<'d>]) -> Option<&'a Entry<'d>> {
    run.iter().reduce(|best, candidate| {
        if candidate.last_modified > best.last_modified {
            candidate
        } else {
            best
        }
    })
}

/// Splits entries into groups by group title.
///
/// Relies on entries with the same group title being adjacent, which holds
/// for the output of [`deduplicate`].
#[must_use]
pub fn regroup(entries: Vec<Entry<'_>>) -> MergedDatabase<'_> {
    let mut groups: Vec<MergedGroup<'_>> = Vec::new();

    for entry in entries {
        match groups.last_mut() {
            Some(group) if group.title == entry.group_title => group.entries.push(entry),
            _ => groups.push(MergedGroup {
                title: entry.group_title.clone(),
                entries: vec![entry],
            }),
        }
    }

    MergedDatabase { groups }
}
