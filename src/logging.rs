//! Tracing subscriber setup.
//!
//! Library code only emits `tracing` events; the binary installs a
//! subscriber once. `RUST_LOG` overrides the default filter.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT_ONCE: Once = Once::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human-readable lines on stderr
    Pretty,
    /// One JSON object per event, for log shippers
    Json,
}

pub fn init(format: Format, verbose: bool) {
    INIT_ONCE.call_once(|| {
        let default = if verbose { "sitewatch=debug" } else { "sitewatch=info" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);

        // a second global subscriber (e.g. from a test harness) is not an error here
        let _ = match format {
            Format::Pretty => builder.try_init(),
            Format::Json => builder.json().try_init(),
        };
    });
}
