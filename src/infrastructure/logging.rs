//! Logging configuration
//!
//! Diagnostics go to stderr so that `EXEC:` lines and listings on stdout stay
//! clean.

/// Initializes logging with the specified level
///
/// `RUST_LOG` overrides `level` when set. Calling this more than once keeps
/// the first subscriber.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log level for a `VERBOSE` value
#[must_use]
pub fn level_for(verbose: Option<&str>) -> &'static str {
    match verbose.map(str::trim) {
        Some(v) if !v.is_empty() && v != "0" => "debug",
        _ => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging("debug");
        init_logging("info");
    }

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(None), "info");
        assert_eq!(level_for(Some("")), "info");
        assert_eq!(level_for(Some("0")), "info");
        assert_eq!(level_for(Some("1")), "debug");
        assert_eq!(level_for(Some("yes")), "debug");
    }
}
