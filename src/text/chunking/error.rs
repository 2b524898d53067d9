//! Error types for text chunking

/// Error types for splitter configuration and chunking operations
///
/// Every variant describes a caller mistake: nothing here is retried or
/// silently corrected.
#[derive(thiserror::Error, Debug)]
pub enum ChunkingError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid chunk size: chunk_size must be greater than 0")]
    InvalidChunkSize,

    #[error("Chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { overlap: usize, size: usize },

    #[error("Unknown chunking strategy: {0}")]
    UnknownStrategy(String),

    #[error("The 'code' strategy requires a language")]
    MissingLanguage,

    #[error("Unknown code language: {0}")]
    UnknownLanguage(String),

    #[error("Separator pattern error: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type for chunking operations
pub type Result<T> = std::result::Result<T, ChunkingError>;

impl ChunkingError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an overlap validation error
    pub fn overlap_too_large(overlap: usize, size: usize) -> Self {
        Self::OverlapTooLarge { overlap, size }
    }

    /// Create an unknown strategy error
    pub fn unknown_strategy<S: Into<String>>(tag: S) -> Self {
        Self::UnknownStrategy(tag.into())
    }

    /// Create an unknown language error
    pub fn unknown_language<S: Into<String>>(name: S) -> Self {
        Self::UnknownLanguage(name.into())
    }

    /// Configuration errors indicate caller error and are never recoverable
    pub fn is_recoverable(&self) -> bool {
        false
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::InvalidChunkSize => "invalid_chunk_size",
            Self::OverlapTooLarge { .. } => "overlap_too_large",
            Self::UnknownStrategy(_) => "unknown_strategy",
            Self::MissingLanguage => "missing_language",
            Self::UnknownLanguage(_) => "unknown_language",
            Self::Regex(_) => "regex",
        }
    }
}
