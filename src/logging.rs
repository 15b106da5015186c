//! Structured logging setup for the CLI and the scoring server.
//!
//! Logs go to stderr so that stdout stays reserved for reports and server responses.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable that overrides the computed filter
pub const LOG_ENV: &str = "PODIUM_LOG";

/// Filter directive for the given CLI flags. An explicit level wins over `verbose`.
pub fn filter_directive(verbose: bool, log_level: Option<&str>) -> String {
    match (verbose, log_level) {
        (_, Some(level)) if level.contains('=') => level.to_string(),
        (_, Some(level)) => format!("podium={}", level),
        (true, None) => "podium=debug".to_string(),
        (false, None) => "podium=warn".to_string(),
    }
}

/// Initialize structured logging based on CLI arguments
pub fn init_tracing(
    verbose: bool,
    log_level: Option<&str>,
    log_json: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let directive = filter_directive(verbose, log_level);

    // RUST_LOG, then PODIUM_LOG, then the CLI flags
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env(LOG_ENV))
        .unwrap_or_else(|_| EnvFilter::new(directive));

    let registry = tracing_subscriber::registry().with(filter);

    if log_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_span_events(fmt::format::FmtSpan::CLOSE),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_warn() {
        assert_eq!(filter_directive(false, None), "podium=warn");
    }

    #[test]
    fn test_verbose_is_debug() {
        assert_eq!(filter_directive(true, None), "podium=debug");
    }

    #[test]
    fn test_explicit_level_wins() {
        assert_eq!(filter_directive(true, Some("trace")), "podium=trace");
        assert_eq!(
            filter_directive(false, Some("podium=info,reqwest=warn")),
            "podium=info,reqwest=warn"
        );
    }
}
