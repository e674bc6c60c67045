use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors produced while capturing, comparing, reporting or persisting snapshots.
///
/// Only [`Error::is_fatal`] kinds abort a monitoring cycle. The rest are
/// recovered where they happen and only show up in logs.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read {path}: {source}")]
    ResourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("table '{table}' has no primary key")]
    SchemaIncomplete { table: String },

    #[error("database capture failed: {0}")]
    Capture(#[from] rusqlite::Error),

    #[error("failed to save state file {path}: {source}")]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode state: {0}")]
    StateEncoding(#[from] serde_json::Error),

    #[error("notification failed: {0}")]
    Notification(String),

    #[error("scan exceeded its time budget of {}", humantime::format_duration(*.0))]
    Timeout(Duration),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for the conditions that must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Capture(_) | Error::Persistence { .. } | Error::StateEncoding(_) | Error::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
