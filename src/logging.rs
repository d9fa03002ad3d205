//! Tracing subscriber setup for the `logfit` binary.
//!
//! Logs go to stderr so that reports on stdout stay machine-friendly.
//! `RUST_LOG` takes precedence over the `-v` flag.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Call once, from the binary.
pub fn init_logger(verbose: bool) {
    let default = if verbose {
        "loglayer_fit=debug,warn"
    } else {
        "loglayer_fit=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
