//! Baseline persistence.
//!
//! The last successful snapshot lives in a single JSON file:
//! - Loading never fails: a missing or corrupt file becomes an empty
//!   baseline stamped one scan interval ago
//! - Saving writes a sibling temp file and renames it over the old one,
//!   so an interrupted save leaves the previous baseline intact

pub mod diff;
pub mod state;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::snapshot::{self, format_timestamp, Snapshot};

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StateStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored baseline as-is; `Ok(None)` if there is none yet.
    pub fn peek(&self) -> Result<Option<Snapshot>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(Error::ResourceUnreadable {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Ok(Some(state::from_json(&text)?))
    }

    /// Baseline for the next comparison. Never fails.
    pub fn load(&self, scan_interval: Duration) -> Snapshot {
        match self.peek() {
            Ok(Some(snapshot)) => {
                info!(
                    path = %self.path.display(),
                    from = %format_timestamp(snapshot.timestamp),
                    "loaded previous state"
                );
                return snapshot;
            }
            Ok(None) => {
                info!(path = %self.path.display(), "no previous state, starting from an empty baseline");
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "previous state unusable, starting from an empty baseline");
            }
        }

        let interval = i64::try_from(scan_interval.as_secs()).unwrap_or(i64::MAX);
        Snapshot::empty(snapshot::now_epoch().saturating_sub(interval))
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let json = state::to_json(snapshot)?;
        let persistence = |source: std::io::Error| Error::Persistence {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(persistence)?;
        }

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);

        std::fs::write(&tmp, json).map_err(persistence)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(persistence(e));
        }

        info!(path = %self.path.display(), "current state saved");
        Ok(())
    }
}
