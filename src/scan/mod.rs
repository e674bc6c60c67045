pub mod database;
pub mod files;

use tracing::info;

use crate::config::Config;
use crate::db::RowSource;
use crate::deadline::Deadline;
use crate::error::Result;
use crate::snapshot::{self, Snapshot};
use database::TableStats;
use files::FileStats;

#[derive(Debug, Default, Clone, Copy)]
pub struct CaptureStats {
    pub files: FileStats,
    pub tables: TableStats,
    pub duration_ms: u128,
}

/// Capture files, then the database if one is configured.
///
/// All or nothing: a database error or an expired deadline discards
/// everything captured so far.
pub fn capture(
    config: &Config,
    source: Option<&dyn RowSource>,
    deadline: &Deadline,
) -> Result<(Snapshot, CaptureStats)> {
    let start = std::time::Instant::now();
    let timestamp = snapshot::now_epoch();

    let (files, file_stats) = files::capture_files(
        &config.monitor_dir,
        &config.excluded_dirs,
        &config.excluded_extensions,
        deadline,
    )?;

    let (tables, table_stats) = match source {
        Some(source) => database::capture_database(source, &config.excluded_tables, deadline)?,
        None => Default::default(),
    };

    let stats = CaptureStats {
        files: file_stats,
        tables: table_stats,
        duration_ms: start.elapsed().as_millis(),
    };

    info!(
        files = stats.files.hashed,
        files_skipped = stats.files.excluded + stats.files.unreadable,
        tables = stats.tables.scanned,
        tables_skipped = stats.tables.excluded + stats.tables.without_key,
        rows = stats.tables.rows,
        duplicate_keys = stats.tables.duplicate_keys,
        duration_ms = stats.duration_ms as u64,
        "capture complete"
    );

    Ok((
        Snapshot {
            timestamp,
            files,
            tables,
        },
        stats,
    ))
}
