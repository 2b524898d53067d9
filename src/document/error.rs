//! Error types for the document pipeline

use crate::text::chunking::ChunkingError;
use std::path::{Path, PathBuf};

/// Errors raised while parsing, chunking or persisting one input file
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Config(#[from] ChunkingError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Create a parse error
    pub fn parse<P: AsRef<Path>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create an I/O error bound to a path
    pub fn io<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Check if the error only affects the current file
    ///
    /// Input, parse and I/O failures are contained to one file of a batch;
    /// configuration errors abort the whole invocation.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> &'static str {
        match self {
            Self::InputNotFound(_) => "input",
            Self::Parse { .. } | Self::UnsupportedFormat(_) => "parse",
            Self::Config(_) => "config",
            Self::Io { .. } | Self::Serialization(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let missing = PipelineError::InputNotFound(PathBuf::from("missing.txt"));
        assert_eq!(missing.category(), "input");
        assert!(missing.is_recoverable());

        let parse = PipelineError::parse("broken.json", "expected array");
        assert_eq!(parse.category(), "parse");
        assert!(parse.is_recoverable());
        assert_eq!(
            parse.to_string(),
            "Failed to parse broken.json: expected array"
        );

        let unsupported = PipelineError::UnsupportedFormat(PathBuf::from("scan.pdf"));
        assert_eq!(unsupported.category(), "parse");

        let io = PipelineError::io(
            "out/a.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(io.category(), "io");
        assert!(io.is_recoverable());
    }

    #[test]
    fn test_config_errors_are_fatal() {
        let error: PipelineError = ChunkingError::MissingLanguage.into();
        assert_eq!(error.category(), "config");
        assert!(!error.is_recoverable());
        assert_eq!(error.to_string(), "The 'code' strategy requires a language");
    }
}
