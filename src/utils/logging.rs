//! Diagnostic logging setup.
//!
//! All diagnostics go through `tracing` to stderr so stdout stays free for
//! command output such as completion scripts. `RUST_LOG` takes precedence
//! over the command-line verbosity flags. Lines are printed above the
//! progress bar while one is drawing.

use crate::utils::progress::LogWriter;
use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(|| LogWriter)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
