//! Tracing bootstrap for the binary and long-running harnesses.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used when neither the caller nor `RUST_LOG` picks one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Install a stderr `fmt` subscriber.
///
/// `level` takes precedence over `RUST_LOG`; an unparsable filter falls back
/// to [`DEFAULT_LOG_LEVEL`]. Returns `false` if a global subscriber was
/// already installed.
pub fn init(level: Option<&str>) -> bool {
    let installed = tracing_subscriber::registry()
        .with(filter_for(level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(level = ?level, "telemetry initialized");
    }
    installed
}

fn filter_for(level: Option<&str>) -> EnvFilter {
    match level {
        Some(l) => EnvFilter::try_new(l).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_prefers_explicit_level() {
        assert_eq!(filter_for(Some("debug")).to_string(), "debug");
        assert_eq!(filter_for(Some("crownfall=trace")).to_string(), "crownfall=trace");
    }

    #[test]
    fn test_bad_filter_falls_back_to_default() {
        assert_eq!(filter_for(Some("crownfall=loud")).to_string(), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_second_init_reports_existing_subscriber() {
        let _ = init(Some("not a [valid filter"));
        assert!(!init(Some("debug")));
    }
}
