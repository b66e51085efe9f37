//! Integration tests for file-level merges
//!
//! These tests merge the sample exports under `tests/fixtures` and check the
//! written document, the report and the failure behavior.

pub mod merge_files_tests;
