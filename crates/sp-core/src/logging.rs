//! Logging bootstrap using tracing.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const LOG_FILTER_ENV: &str = "STYLEPAD_LOG";
const DEFAULT_FILTER: &str = "stylepad=info,warn";

/// Installs the global subscriber. Log level is controlled by `STYLEPAD_LOG`,
/// e.g. `STYLEPAD_LOG=sp_session=debug,sp_patch=trace`.
///
/// Calling this twice is harmless; the second install is ignored.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init();

    if installed.is_ok() {
        tracing::info!("Stylepad logging initialised");
    }
}
