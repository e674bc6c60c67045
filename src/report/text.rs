//! Plain text rendering of change sections.
//!
//! One section per domain, each with Added, Modified and Deleted blocks in
//! that order. Markers are ASCII so the report survives any mail transport.
//! File content and row fields are truncated on char boundaries.

use std::fmt::Write as _;

use super::Limits;
use crate::db::{Row, Value};
use crate::store::diff::{Content, DatabaseChanges, FileChanges, TableRows};

const ADDED: &str = "  [+] ADDED:\n";
const MODIFIED: &str = "  [~] MODIFIED:\n";
const DELETED: &str = "  [-] DELETED:\n";
const CONTENT_TRUNCATED: &str = "\n    ... (content truncated)";

/// Empty string when there is nothing to report for files.
pub fn render_files(changes: &FileChanges, title: &str, limits: &Limits) -> String {
    if changes.is_empty() {
        return String::new();
    }

    let mut output = format!("--- {title} ---\n");

    for (marker, bucket) in [(ADDED, &changes.added), (MODIFIED, &changes.modified)] {
        if bucket.is_empty() {
            continue;
        }
        output.push_str(marker);
        for (path, content) in bucket {
            let _ = writeln!(output, "    - File: {path}");
            output.push_str(&render_content(content, limits.content_chars));
        }
    }

    if !changes.deleted.is_empty() {
        output.push_str(DELETED);
        for path in &changes.deleted {
            let _ = writeln!(output, "    - File: {path}");
        }
    }

    output.push('\n');
    output
}

/// Empty string when there is nothing to report for the database.
pub fn render_database(changes: &DatabaseChanges, title: &str, limits: &Limits) -> String {
    if changes.is_empty() {
        return String::new();
    }

    let mut output = format!("--- {title} ---\n");

    for (marker, bucket) in [(ADDED, &changes.added), (MODIFIED, &changes.modified)] {
        if bucket.is_empty() {
            continue;
        }
        output.push_str(marker);
        render_rows(&mut output, bucket, limits.field_chars);
    }

    if !changes.deleted.is_empty() {
        output.push_str(DELETED);
        for label in &changes.deleted {
            let _ = writeln!(output, "    - {label}");
        }
    }

    output.push('\n');
    output
}

fn render_content(content: &Content, limit: usize) -> String {
    match content {
        Content::Text(text) => {
            let (shown, truncated) = truncate(text, limit);
            let marker = if truncated { CONTENT_TRUNCATED } else { "" };
            format!("    -- Content Start --\n{shown}{marker}\n    -- Content End --\n\n")
        }
        Content::Unavailable => "    (content no longer readable)\n\n".to_string(),
    }
}

fn render_rows(output: &mut String, tables: &TableRows, field_limit: usize) {
    for (table, rows) in tables {
        let _ = writeln!(output, "    - Table: {table}");
        for (pk, row) in rows {
            let _ = writeln!(output, "      - ID: {pk}");
            match row {
                Some(row) => output.push_str(&render_row(row, field_limit)),
                None => output.push_str("        (row no longer present)\n"),
            }
        }
    }
}

fn render_row(row: &Row, field_limit: usize) -> String {
    let mut output = String::new();
    for (column, value) in &row.columns {
        let _ = writeln!(output, "        - {column}: {}", render_value(value, field_limit));
    }
    output
}

pub fn render_value(value: &Value, limit: usize) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => truncate_field(s, limit),
        Value::Blob(b) => format!("<{} bytes> {}", b.len(), truncate_field(&hex::encode(b), limit)),
    }
}

/// Cap a field at `limit` chars, appending "..." when something was cut.
pub fn truncate_field(s: &str, limit: usize) -> String {
    match truncate(s, limit) {
        (shown, true) => format!("{shown}..."),
        (shown, false) => shown.to_string(),
    }
}

/// First `limit` chars of `s`, and whether anything was dropped.
pub fn truncate(s: &str, limit: usize) -> (&str, bool) {
    match s.char_indices().nth(limit) {
        Some((byte_idx, _)) => (&s[..byte_idx], true),
        None => (s, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::diff::RowLabel;
    use std::collections::BTreeMap;

    fn limits() -> Limits {
        Limits::default()
    }

    #[test]
    fn truncation_boundary() {
        let exact = "a".repeat(500);
        let over = "a".repeat(501);

        assert_eq!(truncate(&exact, 500), (exact.as_str(), false));
        let (shown, cut) = truncate(&over, 500);
        assert!(cut);
        assert_eq!(shown.chars().count(), 500);
    }

    #[test]
    fn truncation_respects_multibyte_chars() {
        let text = "é".repeat(10);
        let (shown, cut) = truncate(&text, 3);
        assert_eq!(shown, "ééé");
        assert!(cut);
        assert_eq!(truncate_field("日本語テキスト", 3), "日本語...");
        assert_eq!(truncate_field("日本語", 3), "日本語");
    }

    #[test]
    fn content_marker_only_when_over_limit() {
        let exact = render_content(&Content::Text("x".repeat(500)), 500);
        assert!(!exact.contains("content truncated"));

        let over = render_content(&Content::Text("x".repeat(501)), 500);
        assert!(over.contains("... (content truncated)"));
        assert!(!over.contains(&"x".repeat(501)));
    }

    #[test]
    fn values_render_per_variant() {
        assert_eq!(render_value(&Value::Null, 100), "NULL");
        assert_eq!(render_value(&Value::Text(String::new()), 100), "");
        assert_eq!(render_value(&Value::Integer(-3), 100), "-3");
        assert_eq!(render_value(&Value::Real(2.5), 100), "2.5");
        assert_eq!(render_value(&Value::Blob(vec![1, 2]), 100), "<2 bytes> 0102");
        assert_eq!(render_value(&Value::Text("y".repeat(101)), 100), format!("{}...", "y".repeat(100)));
    }

    #[test]
    fn empty_domain_renders_nothing() {
        assert_eq!(render_files(&FileChanges::default(), "Files", &limits()), "");
        assert_eq!(render_database(&DatabaseChanges::default(), "DB", &limits()), "");
    }

    #[test]
    fn file_section_order_is_added_modified_deleted() {
        let mut changes = FileChanges::default();
        changes.deleted.insert("/site/old.php".into());
        changes.modified.insert("/site/index.php".into(), Content::Text("new body".into()));
        changes.added.insert("/site/new.php".into(), Content::Unavailable);

        let text = render_files(&changes, "File System Changes", &limits());

        assert!(text.starts_with("--- File System Changes ---\n"));
        let added = text.find("[+] ADDED").unwrap();
        let modified = text.find("[~] MODIFIED").unwrap();
        let deleted = text.find("[-] DELETED").unwrap();
        assert!(added < modified && modified < deleted);
        assert!(text.contains("    - File: /site/index.php\n    -- Content Start --\nnew body\n    -- Content End --"));
        assert!(text.contains("(content no longer readable)"));
        assert!(text.is_ascii());
    }

    #[test]
    fn database_section_renders_rows_and_labels() {
        let mut changes = DatabaseChanges::default();
        let row = Row::new(vec![
            ("id".into(), Value::Integer(2)),
            ("note".into(), Value::Null),
            ("title".into(), Value::Text(String::new())),
        ]);
        let mut rows = BTreeMap::new();
        rows.insert("2".to_string(), Some(row));
        rows.insert("3".to_string(), None);
        changes.modified.insert("orders".into(), rows);
        changes.deleted.push(RowLabel { table: "legacy".into(), pk: "9".into() });

        let text = render_database(&changes, "Database Changes", &limits());

        assert!(!text.contains("[+] ADDED"));
        assert!(text.contains(
            "  [~] MODIFIED:\n    - Table: orders\n      - ID: 2\n        - id: 2\n        - note: NULL\n        - title: \n"
        ));
        assert!(text.contains("      - ID: 3\n        (row no longer present)\n"));
        assert!(text.contains("  [-] DELETED:\n    - Database Row: Table: legacy, ID: 9\n"));
    }
}
