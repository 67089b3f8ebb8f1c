//! Utility Modules
//!
//! Shared infrastructure:
//! - `error`: Error types and result helpers
//! - `logging`: Tracing-based logging setup
//! - `metrics`: Evaluation metrics (accuracy, F1, confusion matrix)

pub mod error;
pub mod logging;
pub mod metrics;

// Re-export main types for convenience
pub use error::{DermScanError, Result};
pub use logging::init_logging;
pub use metrics::{ConfusionMatrix, Metrics};

/// Render an elapsed duration as a compact human-readable string
pub fn format_duration(elapsed: std::time::Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    if seconds < 60.0 {
        return format!("{:.1}s", seconds);
    }

    let whole = elapsed.as_secs();
    if whole < 3600 {
        format!("{}m {}s", whole / 60, whole % 60)
    } else {
        format!("{}h {}m", whole / 3600, (whole % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(45_300)), "45.3s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m");
    }
}
