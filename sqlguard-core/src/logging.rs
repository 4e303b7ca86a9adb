//! Logging setup for sqlguard binaries.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the host. Output goes to stderr so stdout stays reserved for the
//! sanitized query.

use crate::Result;
use tracing_subscriber::EnvFilter;

/// Maps CLI verbosity flags to a maximum level.
///
/// `quiet` wins over any number of `-v`: 0 is INFO, 1 is DEBUG, 2+ is TRACE.
pub fn verbosity_level(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Initializes stderr logging based on verbosity level.
///
/// A `RUST_LOG` directive, when set, takes precedence over the flags.
///
/// # Example
/// ```rust,no_run
/// use sqlguard_core::logging::init_logging;
///
/// init_logging(1, false).expect("Failed to initialize logging");
/// ```
///
/// # Errors
/// Returns a configuration error when a global subscriber is already set.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = verbosity_level(verbose, quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| {
            crate::error::SqlGuardError::configuration(format!(
                "Failed to initialize logging: {e}"
            ))
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // A global subscriber can only be installed once per process, so only
    // the level mapping is exercised here.
    #[test]
    fn test_verbosity_levels() {
        let test_cases = [
            ((0, true), tracing::Level::ERROR),
            ((5, true), tracing::Level::ERROR),
            ((0, false), tracing::Level::INFO),
            ((1, false), tracing::Level::DEBUG),
            ((2, false), tracing::Level::TRACE),
            ((10, false), tracing::Level::TRACE),
        ];

        for ((verbose, quiet), expected) in test_cases {
            assert_eq!(
                verbosity_level(verbose, quiet),
                expected,
                "Failed for quiet={quiet}, verbose={verbose}"
            );
        }
    }
}
