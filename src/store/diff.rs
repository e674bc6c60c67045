//! Snapshot comparison engine.
//!
//! Compares a baseline snapshot with a fresh one and classifies every
//! difference as added, modified or deleted:
//! - Files are matched by path and compared by content hash
//! - Tables are matched by name, then rows by primary key value
//! - Added and modified entries carry the current content, fetched on demand
//! - Deleted entries carry only a label, the content is gone
//!
//! A table whose primary key column changed, or that was renamed, is not
//! reconciled: its rows show up as deleted and/or added under the new
//! identity. There is no rename detection.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::warn;

use crate::db::{Row, RowSource};
use crate::deadline::Deadline;
use crate::error::Result;
use crate::snapshot::{FileEntry, Snapshot, TableEntry};

/// Current content of an added or modified file, possibly only a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// The file vanished or became unreadable after it was hashed.
    Unavailable,
}

/// Where the engine gets current content for the entries it reports.
pub trait ContentSource {
    fn file_content(&self, path: &str) -> Content;

    /// `Ok(None)` when the row no longer exists.
    fn fetch_row(&self, table: &str, pk_column: &str, pk_value: &str) -> Result<Option<Row>>;
}

/// Reads files from disk and rows from the live database.
pub struct LiveContent<'a> {
    pub source: Option<&'a dyn RowSource>,
    pub deadline: &'a Deadline,
    /// chars the report will show; files are read only far enough to fill them
    pub content_chars: usize,
}

impl LiveContent<'_> {
    /// Enough bytes for `content_chars` chars of UTF-8 plus one, so the
    /// report can still tell the content was cut.
    fn read_limit(&self) -> u64 {
        (self.content_chars as u64).saturating_mul(4).saturating_add(1)
    }
}

impl ContentSource for LiveContent<'_> {
    fn file_content(&self, path: &str) -> Content {
        let mut bytes = Vec::new();
        let read = File::open(Path::new(path))
            .and_then(|file| file.take(self.read_limit()).read_to_end(&mut bytes));

        match read {
            Ok(_) => Content::Text(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                warn!(path, error = %e, "changed file could not be read for the report");
                Content::Unavailable
            }
        }
    }

    fn fetch_row(&self, table: &str, pk_column: &str, pk_value: &str) -> Result<Option<Row>> {
        self.deadline.check()?;
        match self.source {
            Some(source) => source.fetch_row(table, pk_column, pk_value),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileChanges {
    pub added: BTreeMap<String, Content>,
    pub modified: BTreeMap<String, Content>,
    pub deleted: BTreeSet<String>,
}

impl FileChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// table -> primary key value -> current row (`None` if it could not be fetched)
pub type TableRows = BTreeMap<String, BTreeMap<String, Option<Row>>>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RowLabel {
    pub table: String,
    pub pk: String,
}

impl fmt::Display for RowLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Database Row: Table: {}, ID: {}", self.table, self.pk)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatabaseChanges {
    pub added: TableRows,
    pub modified: TableRows,
    pub deleted: Vec<RowLabel>,
}

impl DatabaseChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeSet {
    pub files: FileChanges,
    pub database: DatabaseChanges,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub files_added: usize,
    pub files_modified: usize,
    pub files_deleted: usize,
    pub rows_added: usize,
    pub rows_modified: usize,
    pub rows_deleted: usize,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.database.is_empty()
    }

    pub fn summary(&self) -> Summary {
        let count_rows = |rows: &TableRows| rows.values().map(BTreeMap::len).sum::<usize>();
        Summary {
            files_added: self.files.added.len(),
            files_modified: self.files.modified.len(),
            files_deleted: self.files.deleted.len(),
            rows_added: count_rows(&self.database.added),
            rows_modified: count_rows(&self.database.modified),
            rows_deleted: self.database.deleted.len(),
        }
    }
}

/// Compare two snapshots and produce the classified change set.
pub fn compare(previous: &Snapshot, current: &Snapshot, content: &dyn ContentSource) -> Result<ChangeSet> {
    Ok(ChangeSet {
        files: compare_files(&previous.files, &current.files, content),
        database: compare_tables(&previous.tables, &current.tables, content)?,
    })
}

pub fn compare_files(
    previous: &BTreeMap<String, FileEntry>,
    current: &BTreeMap<String, FileEntry>,
    content: &dyn ContentSource,
) -> FileChanges {
    let mut changes = FileChanges::default();

    for (path, entry) in current {
        match previous.get(path) {
            None => {
                changes.added.insert(path.clone(), content.file_content(path));
            }
            Some(old) if old.content_hash != entry.content_hash => {
                changes.modified.insert(path.clone(), content.file_content(path));
            }
            Some(_) => {}
        }
    }

    changes.deleted = previous
        .keys()
        .filter(|path| !current.contains_key(*path))
        .cloned()
        .collect();

    changes
}

pub fn compare_tables(
    previous: &BTreeMap<String, TableEntry>,
    current: &BTreeMap<String, TableEntry>,
    content: &dyn ContentSource,
) -> Result<DatabaseChanges> {
    let mut changes = DatabaseChanges::default();

    for (name, table) in current {
        let old_rows = match previous.get(name) {
            Some(old) => {
                if old.primary_key_column != table.primary_key_column {
                    warn!(
                        table = %name,
                        old = %old.primary_key_column,
                        new = %table.primary_key_column,
                        "primary key column changed, rows are matched by the new column"
                    );
                }
                Some(&old.rows)
            }
            // wholly new table, every row is an addition
            None => None,
        };

        for (pk, hash) in &table.rows {
            let bucket = match old_rows.and_then(|rows| rows.get(pk)) {
                None => &mut changes.added,
                Some(old_hash) if old_hash != hash => &mut changes.modified,
                Some(_) => continue,
            };

            let row = content.fetch_row(name, &table.primary_key_column, pk)?;
            bucket.entry(name.clone()).or_default().insert(pk.clone(), row);
        }

        if let Some(old_rows) = old_rows {
            for pk in old_rows.keys().filter(|pk| !table.rows.contains_key(*pk)) {
                changes.deleted.push(RowLabel {
                    table: name.clone(),
                    pk: pk.clone(),
                });
            }
        }
    }

    // dropped (or renamed) tables: every tracked row is reported deleted,
    // the table itself is not reported separately
    for (name, table) in previous.iter().filter(|(name, _)| !current.contains_key(*name)) {
        for pk in table.rows.keys() {
            changes.deleted.push(RowLabel {
                table: name.clone(),
                pk: pk.clone(),
            });
        }
    }

    changes.deleted.sort();
    Ok(changes)
}
