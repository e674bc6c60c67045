//! File tree capture.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::deadline::Deadline;
use crate::error::Result;
use crate::hash;
use crate::snapshot::FileEntry;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileStats {
    pub hashed: usize,
    pub excluded: usize,
    pub unreadable: usize,
}

/// Hash every regular file under `root` that survives the exclusion rules.
///
/// Excluded directories are pruned rather than descended. Symlinks to
/// regular files are hashed under the link's path; directory links are not
/// followed. Walk errors, dangling links and unreadable files are logged and
/// skipped; only the deadline can fail this.
pub fn capture_files(
    root: &Path,
    excluded_dirs: &BTreeSet<String>,
    excluded_extensions: &BTreeSet<String>,
    deadline: &Deadline,
) -> Result<(BTreeMap<String, FileEntry>, FileStats)> {
    let mut files = BTreeMap::new();
    let mut stats = FileStats::default();

    if !root.exists() {
        warn!(root = %root.display(), "monitored directory does not exist");
        return Ok((files, stats));
    }

    // depth 0 is the root itself, which is never excluded by name
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded_segment(e.file_name(), excluded_dirs));

    for entry in walker {
        deadline.check()?;

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "unknown path".to_string());
                warn!(path = %path, error = %e, "skipping unreadable entry");
                stats.unreadable += 1;
                continue;
            }
        };

        let path = entry.path();

        if entry.path_is_symlink() {
            // file links are hashed through their target; directory links stay unfollowed
            match std::fs::metadata(path) {
                Ok(target) if target.is_file() => {}
                Ok(_) => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping dangling symlink");
                    stats.unreadable += 1;
                    continue;
                }
            }
        } else if !entry.file_type().is_file() {
            continue;
        }

        if has_excluded_extension(path, excluded_extensions) {
            stats.excluded += 1;
            continue;
        }

        match hash::hash_file(path) {
            Ok(content_hash) => {
                let key = path.to_string_lossy().into_owned();
                files.insert(
                    key.clone(),
                    FileEntry {
                        path: key,
                        content_hash,
                    },
                );
                stats.hashed += 1;
            }
            Err(e) => {
                warn!(error = %e, "skipping file");
                stats.unreadable += 1;
            }
        }
    }

    debug!(?stats, "file capture finished");
    Ok((files, stats))
}

fn is_excluded_segment(name: &OsStr, excluded_dirs: &BTreeSet<String>) -> bool {
    name.to_str()
        .map(|s| excluded_dirs.contains(s))
        .unwrap_or(false)
}

fn has_excluded_extension(path: &Path, excluded_extensions: &BTreeSet<String>) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| excluded_extensions.contains(&ext.to_lowercase()))
        .unwrap_or(false)
}

/// True when any segment of `relative` names an excluded directory, or its
/// extension is excluded. Mirrors the pruning done during the walk.
pub fn is_excluded(
    relative: &Path,
    excluded_dirs: &BTreeSet<String>,
    excluded_extensions: &BTreeSet<String>,
) -> bool {
    relative
        .components()
        .any(|c| is_excluded_segment(c.as_os_str(), excluded_dirs))
        || has_excluded_extension(relative, excluded_extensions)
}
