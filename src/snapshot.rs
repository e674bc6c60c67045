//! Point-in-time capture of the monitored surface.
//!
//! A snapshot holds one fingerprint per file and one per database row.
//! Content itself is never stored; the diff engine fetches it on demand
//! for the entries that changed.

use std::collections::BTreeMap;

/// Lowercase hex SHA-256.
pub type Digest = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub content_hash: Digest,
}

impl FileEntry {
    /// First 12 characters of the digest, for listings.
    pub fn short_hash(&self) -> &str {
        match self.content_hash.char_indices().nth(12) {
            Some((end, _)) => &self.content_hash[..end],
            None => &self.content_hash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub table_name: String,
    pub primary_key_column: String,
    /// canonical primary key value -> row digest
    pub rows: BTreeMap<String, Digest>,
}

impl TableEntry {
    pub fn new(table_name: impl Into<String>, primary_key_column: impl Into<String>) -> Self {
        TableEntry {
            table_name: table_name.into(),
            primary_key_column: primary_key_column.into(),
            rows: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Unix epoch seconds.
    pub timestamp: i64,
    pub files: BTreeMap<String, FileEntry>,
    pub tables: BTreeMap<String, TableEntry>,
}

impl Snapshot {
    pub fn empty(timestamp: i64) -> Self {
        Snapshot {
            timestamp,
            files: BTreeMap::new(),
            tables: BTreeMap::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.tables.values().map(|t| t.rows.len()).sum()
    }
}

pub fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Render an epoch timestamp the way reports and the CLI show it.
pub fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
