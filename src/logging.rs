//! Logging initialization
//!
//! Structured logging via `tracing`, human-readable or JSON, with
//! `DEBATTLE_LOG_LEVEL` overriding the CLI verbosity.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides verbosity
pub const LOG_LEVEL_ENV: &str = "DEBATTLE_LOG_LEVEL";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Human,
    /// Newline-delimited JSON
    Json,
}

/// Map a `-v` count to a tracing directive (0 → warn, saturating at trace)
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_logging(format: LogFormat, verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));
    let show_target = verbosity >= 2;

    match format {
        LogFormat::Human => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
