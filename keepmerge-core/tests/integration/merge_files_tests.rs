//! Tests for `merge_files` over the sample exports

use std::fs;
use std::path::PathBuf;

use keepmerge_core::{merge_files, Document, MergeError, MergeReport, WriteOptions};
use tempfile::TempDir;

use crate::fixtures::{broken_backup_export_path, home_export_path, work_export_path};

fn output_in(temp: &TempDir) -> PathBuf {
    temp.path().join("merged.xml")
}

#[test]
fn test_merge_home_and_work_exports() {
    let temp = TempDir::new().unwrap();
    let output = output_in(&temp);

    let report = merge_files(
        &[home_export_path(), work_export_path()],
        &output,
        &WriteOptions::default(),
    )
    .unwrap();

    assert_eq!(
        report,
        MergeReport {
            documents: 2,
            groups_seen: 5,
            excluded_groups: 1,
            entries_loaded: 6,
            duplicates_dropped: 2,
            groups_written: 2,
            entries_written: 4,
        }
    );

    let merged = fs::read_to_string(&output).unwrap();
    assert!(merged.starts_with(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE KEEPASSX_DATABASE>\n<database>"
    ));

    // Newest Gmail comes from the work export, the backup copy is ignored
    assert!(merged.contains("<password>work-gmail-new</password>"));
    assert!(!merged.contains("home-gmail-old"));
    assert!(!merged.contains("backup-gmail"));
    assert!(!merged.contains("<title>Backup</title>"));

    // Github has the same lastmod in both, the first input wins
    assert!(merged.contains("home-gh-2019"));
    assert!(!merged.contains("work-gh-2019"));
}

#[test]
fn test_merged_output_order() {
    let temp = TempDir::new().unwrap();
    let output = output_in(&temp);
    merge_files(
        &[home_export_path(), work_export_path()],
        &output,
        &WriteOptions::bare(),
    )
    .unwrap();

    let merged = Document::open(&output).unwrap();
    let groups: Vec<_> = merged.root().children_named("group").collect();
    let titles: Vec<_> = groups
        .iter()
        .map(|g| g.required_text("title").unwrap().into_owned())
        .collect();
    // Byte order puts upper case before lower case
    assert_eq!(titles, ["Internet", "eMail"]);

    let entry_titles: Vec<Vec<String>> = groups
        .iter()
        .map(|g| {
            g.children_named("entry")
                .map(|e| e.required_text("title").unwrap().into_owned())
                .collect()
        })
        .collect();
    assert_eq!(entry_titles, [["Amazon", "Github"], ["Exchange", "Gmail"]]);
}

#[test]
fn test_entry_payload_is_copied_verbatim() {
    let temp = TempDir::new().unwrap();
    let output = output_in(&temp);
    merge_files(&[home_export_path()], &output, &WriteOptions::bare()).unwrap();

    let source = fs::read_to_string(home_export_path()).unwrap();
    let start = source.find("<entry>\n   <title>Amazon").unwrap();
    let end = start + source[start..].find("</entry>").unwrap() + "</entry>".len();
    let amazon = &source[start..end];

    let merged = fs::read_to_string(&output).unwrap();
    assert!(merged.contains(amazon));
    assert!(merged.contains("<comment>Line one&#xD;\nline two &amp; more</comment>"));
}

#[test]
fn test_input_order_breaks_ties() {
    let temp = TempDir::new().unwrap();
    let output = output_in(&temp);
    merge_files(
        &[work_export_path(), home_export_path()],
        &output,
        &WriteOptions::bare(),
    )
    .unwrap();

    let merged = fs::read_to_string(&output).unwrap();
    assert!(merged.contains("work-gh-2019"));
    assert!(!merged.contains("home-gh-2019"));
    assert!(merged.contains("work-gmail-new"));
}

#[test]
fn test_malformed_backup_entries_are_not_read() {
    let temp = TempDir::new().unwrap();
    let output = output_in(&temp);

    let report = merge_files(&[broken_backup_export_path()], &output, &WriteOptions::bare()).unwrap();
    assert_eq!(report.excluded_groups, 1);
    assert_eq!(report.entries_written, 1);

    let merged = fs::read_to_string(&output).unwrap();
    assert!(merged.contains("<title>Banking</title>"));
    assert!(!merged.contains("Half imported"));
}

#[test]
fn test_no_inputs_writes_empty_database() {
    let temp = TempDir::new().unwrap();
    let output = output_in(&temp);

    let report = merge_files::<PathBuf>(&[], &output, &WriteOptions::bare()).unwrap();
    assert_eq!(report, MergeReport::default());
    assert_eq!(fs::read_to_string(&output).unwrap(), "<database/>\n");
}

#[test]
fn test_parse_error_leaves_output_untouched() {
    let temp = TempDir::new().unwrap();
    let output = output_in(&temp);
    fs::write(&output, "previous merge").unwrap();

    let broken = temp.path().join("broken.xml");
    fs::write(&broken, "<database><group><title>Email</title>").unwrap();

    let err = merge_files(&[home_export_path(), broken], &output, &WriteOptions::default())
        .unwrap_err();
    assert!(err.is_document_error());
    assert!(err.to_string().contains("broken.xml"));
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous merge");
}

#[test]
fn test_bad_timestamp_is_a_format_error() {
    let temp = TempDir::new().unwrap();
    let output = output_in(&temp);

    let input = temp.path().join("dates.xml");
    fs::write(
        &input,
        "<database><group><title>Email</title><entry><title>Gmail</title><username>bob</username><lastmod>2021-06-01 12:00</lastmod></entry></group></database>",
    )
    .unwrap();

    let err = merge_files(&[input], &output, &WriteOptions::bare()).unwrap_err();
    assert!(matches!(err, MergeError::Format(_)));
    assert!(!output.exists());
}

#[test]
fn test_missing_input_is_a_read_error() {
    let temp = TempDir::new().unwrap();
    let output = output_in(&temp);

    let err = merge_files(
        &[temp.path().join("missing.xml")],
        &output,
        &WriteOptions::bare(),
    )
    .unwrap_err();
    assert!(matches!(err, MergeError::Read { .. }));
    assert!(err.is_io_error());
    assert!(!output.exists());
}
