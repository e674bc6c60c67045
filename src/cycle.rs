//! One monitoring run: capture, compare, report, persist.
//!
//! The baseline only advances after a run that captured, compared and
//! attempted delivery without a fatal error. Any fatal error is logged,
//! announced through the notifier and leaves the state file untouched.

use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::{RowSource, SqliteSource};
use crate::deadline::Deadline;
use crate::error::{Error, Result};
use crate::notify::Notifier;
use crate::report;
use crate::scan;
use crate::snapshot;
use crate::store::diff::{self, LiveContent, Summary};
use crate::store::StateStore;

const FAILURE_SUBJECT: &str = "Site Monitoring Run Failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub summary: Summary,
    /// a change report was handed to the notifier and accepted
    pub notified: bool,
    pub baseline_saved: bool,
}

/// Open the configured database, then run one cycle against it.
pub fn run(config: &Config, store: &StateStore, notifier: &dyn Notifier) -> Result<Outcome> {
    let deadline = Deadline::new(config.time_budget);

    let result = match &config.database {
        Some(path) => SqliteSource::open(path)
            .and_then(|db| execute(config, Some(&db), store, notifier, &deadline)),
        None => execute(config, None, store, notifier, &deadline),
    };

    result.map_err(|e| announce_failure(e, notifier))
}

/// Run one cycle against an already opened row source.
pub fn run_with_source(
    config: &Config,
    source: Option<&dyn RowSource>,
    store: &StateStore,
    notifier: &dyn Notifier,
) -> Result<Outcome> {
    let deadline = Deadline::new(config.time_budget);
    execute(config, source, store, notifier, &deadline).map_err(|e| announce_failure(e, notifier))
}

fn execute(
    config: &Config,
    source: Option<&dyn RowSource>,
    store: &StateStore,
    notifier: &dyn Notifier,
    deadline: &Deadline,
) -> Result<Outcome> {
    let previous = store.load(config.scan_interval);
    let (current, _) = scan::capture(config, source, deadline)?;

    let content = LiveContent {
        source,
        deadline,
        content_chars: config.limits.content_chars,
    };
    let changes = diff::compare(&previous, &current, &content)?;
    deadline.check()?;

    let summary = changes.summary();
    let mut notified = false;

    match report::render_report(&changes, previous.timestamp, current.timestamp, &config.limits) {
        Some(body) => {
            info!(?summary, "changes detected");
            match notifier.send(config.subject(), &body) {
                Ok(()) => notified = true,
                Err(e) => warn!(error = %e, "change report could not be delivered"),
            }
        }
        None => info!("no changes detected"),
    }

    if config.dry_run {
        info!("dry run, baseline not updated");
        return Ok(Outcome {
            summary,
            notified,
            baseline_saved: false,
        });
    }

    store.save(&current)?;

    Ok(Outcome {
        summary,
        notified,
        baseline_saved: true,
    })
}

fn announce_failure(e: Error, notifier: &dyn Notifier) -> Error {
    error!(error = %e, "monitoring run failed, baseline not updated");

    let body = report::render_failure(&e, snapshot::now_epoch());
    if let Err(notify_err) = notifier.send(FAILURE_SUBJECT, &body) {
        error!(error = %notify_err, "failure notice could not be delivered");
    }

    e
}
