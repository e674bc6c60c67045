//! Database table capture.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::db::RowSource;
use crate::deadline::Deadline;
use crate::error::{Error, Result};
use crate::hash;
use crate::snapshot::TableEntry;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub scanned: usize,
    pub excluded: usize,
    pub without_key: usize,
    pub rows: usize,
    /// rows dropped because another row had the same canonical key
    pub duplicate_keys: usize,
}

/// Fingerprint every row of every table that has a primary key.
///
/// Any database error aborts the whole capture. A table without a primary
/// key is skipped with a warning and stays invisible until it gains one.
pub fn capture_database(
    source: &dyn RowSource,
    excluded_tables: &BTreeSet<String>,
    deadline: &Deadline,
) -> Result<(BTreeMap<String, TableEntry>, TableStats)> {
    let mut tables = BTreeMap::new();
    let mut stats = TableStats::default();

    for table in source.list_tables()? {
        deadline.check()?;

        if excluded_tables.contains(&table) {
            stats.excluded += 1;
            continue;
        }

        match capture_table(source, &table, deadline) {
            Ok((entry, duplicates)) => {
                stats.scanned += 1;
                stats.rows += entry.rows.len();
                stats.duplicate_keys += duplicates;
                tables.insert(table, entry);
            }
            Err(e @ Error::SchemaIncomplete { .. }) => {
                warn!(table = %table, "{e}, skipping");
                stats.without_key += 1;
            }
            Err(e) => return Err(e),
        }
    }

    debug!(?stats, "database capture finished");
    Ok((tables, stats))
}

/// The entry plus the number of rows whose canonical key collided with an
/// earlier row (e.g. integer `1` and text `"1"` in an untyped key column).
fn capture_table(
    source: &dyn RowSource,
    table: &str,
    deadline: &Deadline,
) -> Result<(TableEntry, usize)> {
    let pk_column = source
        .primary_key(table)?
        .ok_or_else(|| Error::SchemaIncomplete {
            table: table.to_string(),
        })?;

    let mut entry = TableEntry::new(table, pk_column.as_str());
    let mut duplicates = 0;

    source.for_each_row(table, &mut |row| {
        deadline.check()?;

        let pk = match row.get(&pk_column) {
            Some(value) if !value.is_null() => value.as_key(),
            // sqlite lets non-integer primary keys hold NULL; such rows have no identity
            _ => {
                debug!(table, "row without primary key value, not tracked");
                return Ok(());
            }
        };

        let digest = hash::hash_row(&row);
        if entry.rows.insert(pk.clone(), digest).is_some() {
            warn!(table, pk = %pk, "rows share a primary key value, only the last one is tracked");
            duplicates += 1;
        }
        Ok(())
    })?;

    Ok((entry, duplicates))
}
