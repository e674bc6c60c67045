pub mod text;

use crate::error::Error;
use crate::snapshot::format_timestamp;
use crate::store::diff::ChangeSet;

pub use text::{render_database, render_files};

pub const FILES_TITLE: &str = "File System Changes";
pub const DATABASE_TITLE: &str = "Database Changes";

/// Truncation caps for report content, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// file content
    pub content_chars: usize,
    /// each database field
    pub field_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            content_chars: 500,
            field_chars: 100,
        }
    }
}

/// Full report body, or `None` when nothing changed.
pub fn render_report(
    changes: &ChangeSet,
    previous_timestamp: i64,
    current_timestamp: i64,
    limits: &Limits,
) -> Option<String> {
    let sections = format!(
        "{}{}",
        render_files(&changes.files, FILES_TITLE, limits),
        render_database(&changes.database, DATABASE_TITLE, limits)
    );

    if sections.is_empty() {
        return None;
    }

    let s = changes.summary();
    let mut output = String::new();
    output.push_str(&format!("Site scan completed at {}\n", format_timestamp(current_timestamp)));
    output.push_str(&format!(
        "Comparing against state from {}\n\n",
        format_timestamp(previous_timestamp)
    ));
    output.push_str("--- CHANGE SUMMARY ---\n");
    output.push_str(&format!(
        "Files: {} added, {} modified, {} deleted\n",
        s.files_added, s.files_modified, s.files_deleted
    ));
    output.push_str(&format!(
        "Rows:  {} added, {} modified, {} deleted\n\n",
        s.rows_added, s.rows_modified, s.rows_deleted
    ));
    output.push_str(&sections);

    Some(output)
}

/// Body of the notice sent when a run aborts.
pub fn render_failure(error: &Error, timestamp: i64) -> String {
    format!(
        "Site monitoring run failed at {}\n\nCRITICAL ERROR: {error}\n\n\
         The baseline was not updated; the next run compares against the same state.\n",
        format_timestamp(timestamp)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::diff::Content;
    use std::time::Duration;

    #[test]
    fn empty_change_set_has_no_report() {
        assert!(render_report(&ChangeSet::default(), 0, 60, &Limits::default()).is_none());
    }

    #[test]
    fn report_has_header_summary_and_sections() {
        let mut changes = ChangeSet::default();
        changes
            .files
            .added
            .insert("/site/b.py".into(), Content::Text("print('b')".into()));

        let report = render_report(&changes, 0, 3600, &Limits::default()).unwrap();

        assert!(report.starts_with("Site scan completed at 1970-01-01 01:00:00\n"));
        assert!(report.contains("Comparing against state from 1970-01-01 00:00:00\n"));
        assert!(report.contains("Files: 1 added, 0 modified, 0 deleted\n"));
        assert!(report.contains("--- File System Changes ---\n  [+] ADDED:\n    - File: /site/b.py\n"));
        assert!(!report.contains(DATABASE_TITLE));
    }

    #[test]
    fn failure_notice_names_the_error() {
        let body = render_failure(&Error::Timeout(Duration::from_secs(600)), 0);
        assert!(body.contains("CRITICAL ERROR: scan exceeded its time budget of 10m"));
        assert!(body.contains("baseline was not updated"));
    }
}
