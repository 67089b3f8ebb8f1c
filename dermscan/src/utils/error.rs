//! Error types
//!
//! One library-wide error enum built on `thiserror`. The binaries wrap
//! it in `anyhow` at the top level; the prediction server maps selected
//! variants to HTTP status codes.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced by the dermscan library
#[derive(Error, Debug)]
pub enum DermScanError {
    /// An image file could not be read or decoded
    #[error("failed to load image {path}: {reason}")]
    ImageLoad { path: PathBuf, reason: String },

    /// Dataset scanning or indexing failed
    #[error("dataset error: {0}")]
    Dataset(String),

    /// A model checkpoint could not be loaded or saved
    #[error("model error: {0}")]
    Model(String),

    /// The forward pass produced unusable output
    #[error("inference error: {0}")]
    Inference(String),

    /// A configuration file or value was rejected
    #[error("invalid config: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// Caller-supplied input was unusable. The server returns these as
    /// 400 responses.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("path not found: {0}")]
    PathNotFound(PathBuf),
}

impl DermScanError {
    /// Shorthand for [`DermScanError::ImageLoad`]
    pub fn image_load(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::ImageLoad {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience Result type for dermscan operations
pub type Result<T> = std::result::Result<T, DermScanError>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, msg: &str) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| DermScanError::InvalidInput(format!("{}: {}", msg, e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| DermScanError::InvalidInput(format!("{}: {}", f(), e)))
    }
}

impl<T> ResultExt<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| DermScanError::InvalidInput(msg.to_string()))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.ok_or_else(|| DermScanError::InvalidInput(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_wording() {
        let err = DermScanError::Dataset("no images found".to_string());
        assert_eq!(err.to_string(), "dataset error: no images found");

        let err = DermScanError::PathNotFound(PathBuf::from("/data/skin"));
        assert_eq!(err.to_string(), "path not found: /data/skin");
    }

    #[test]
    fn test_image_load_includes_path_and_reason() {
        let path = Path::new("/data/skin/train/1.Eczema/sample.jpg");
        let err = DermScanError::image_load(path, "unexpected EOF");

        let shown = err.to_string();
        assert!(shown.contains("sample.jpg"));
        assert!(shown.contains("unexpected EOF"));
    }

    #[test]
    fn test_result_context_wraps_source_error() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));

        let err = result.context("reading labels").unwrap_err();
        assert!(matches!(err, DermScanError::InvalidInput(_)));
        assert!(err.to_string().contains("reading labels"));
    }

    #[test]
    fn test_option_with_context() {
        let opt: Option<u32> = None;
        let err = opt.with_context(|| "no candidate".to_string()).unwrap_err();
        assert!(err.to_string().contains("no candidate"));
    }
}
