//! Logging setup for the CLI and server binaries
//!
//! Both binaries install one global `tracing` subscriber at startup.
//! At debug level and above the output includes the module path and
//! thread id, so per-batch messages can be traced to their source.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Parse a log level name, case-insensitively.
///
/// Accepts the five `tracing` level names; `warning` is an alias for
/// `warn`. Returns `None` for anything else.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Install the global subscriber with `level` as the maximum level
pub fn init_logging(level: Level) -> Result<(), String> {
    // Level compares by verbosity: TRACE is the greatest value
    let detailed = level >= Level::DEBUG;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(detailed)
        .with_thread_ids(detailed)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("failed to set global subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_known_names() {
        assert_eq!(parse_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_level("INFO"), Some(Level::INFO));
        assert_eq!(parse_level("Warning"), Some(Level::WARN));
        assert_eq!(parse_level("warn"), Some(Level::WARN));
    }

    #[test]
    fn test_parse_level_rejects_unknown_names() {
        assert_eq!(parse_level(""), None);
        assert_eq!(parse_level("loud"), None);
        assert_eq!(parse_level("4"), None);
    }
}
