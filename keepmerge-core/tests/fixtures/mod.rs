//! Test fixtures for merge testing.
//!
//! This module provides builders for KeePassX-style XML documents and paths
//! to the sample exports stored next to this file.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::PathBuf;

/// A credential entry to render into a fixture document.
#[derive(Debug, Clone)]
pub struct FixtureEntry {
    pub title: String,
    pub username: String,
    pub lastmod: String,
    /// Marker written to `<comment>`, used to tell entries apart in the output
    pub marker: String,
}

impl FixtureEntry {
    #[must_use]
    pub fn new(title: &str, username: &str, lastmod: &str, marker: &str) -> Self {
        Self {
            title: title.to_string(),
            username: username.to_string(),
            lastmod: lastmod.to_string(),
            marker: marker.to_string(),
        }
    }

    /// Renders the entry the way KeePassX exports it
    #[must_use]
    pub fn to_xml(&self) -> String {
        format!(
            "<entry>\n   <title>{}</title>\n   <username>{}</username>\n   <password>secret-{}</password>\n   <url/>\n   <comment>{}</comment>\n   <icon>1</icon>\n   <creation>2009-05-01T10:00:00</creation>\n   <lastaccess>{}</lastaccess>\n   <lastmod>{}</lastmod>\n   <expire>Never</expire>\n  </entry>",
            self.title, self.username, self.marker, self.marker, self.lastmod, self.lastmod
        )
    }
}

/// A group to render into a fixture document.
#[derive(Debug, Clone)]
pub struct FixtureGroup {
    pub title: String,
    pub entries: Vec<FixtureEntry>,
}

impl FixtureGroup {
    #[must_use]
    pub fn new(title: &str, entries: Vec<FixtureEntry>) -> Self {
        Self {
            title: title.to_string(),
            entries,
        }
    }
}

/// Renders a complete database document.
#[must_use]
pub fn database_xml(groups: &[FixtureGroup]) -> String {
    let mut xml = String::from("<!DOCTYPE KEEPASSX_DATABASE>\n<database>\n");
    for group in groups {
        let _ = write!(xml, " <group>\n  <title>{}</title>\n  <icon>1</icon>\n", group.title);
        for entry in &group.entries {
            let _ = writeln!(xml, "  {}", entry.to_xml());
        }
        xml.push_str(" </group>\n");
    }
    xml.push_str("</database>\n");
    xml
}

/// Extracts the `<comment>` marker of an entry payload.
#[must_use]
pub fn marker_of(payload: &str) -> &str {
    let start = payload.find("<comment>").map_or(0, |i| i + "<comment>".len());
    let end = payload[start..].find("</comment>").map_or(payload.len(), |i| start + i);
    &payload[start..end]
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Path to the home laptop export fixture.
#[must_use]
pub fn home_export_path() -> PathBuf {
    fixtures_dir().join("home.xml")
}

/// Path to the work laptop export fixture.
#[must_use]
pub fn work_export_path() -> PathBuf {
    fixtures_dir().join("work.xml")
}

/// Path to a fixture whose Backup group holds a malformed entry.
#[must_use]
pub fn broken_backup_export_path() -> PathBuf {
    fixtures_dir().join("broken_backup.xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_files_exist() {
        assert!(home_export_path().exists(), "home.xml fixture should exist");
        assert!(work_export_path().exists(), "work.xml fixture should exist");
        assert!(broken_backup_export_path().exists());
    }

    #[test]
    fn test_marker_of() {
        let entry = FixtureEntry::new("Gmail", "bob", "2020-01-01T00:00:00", "m1");
        assert_eq!(marker_of(&entry.to_xml()), "m1");
    }
}
