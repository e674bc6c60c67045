//! Snapshot-based drift detection for a website's files and database.
//!
//! Each run fingerprints every monitored file and database row, compares
//! the result with the previous run's baseline, and reports what was added,
//! modified or deleted along with the current content of changed items.

pub mod cli;
pub mod config;
pub mod cycle;
pub mod db;
pub mod deadline;
pub mod error;
pub mod hash;
pub mod logging;
pub mod notify;
pub mod report;
pub mod scan;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};
