//! Configuration and statistics for text splitting

use super::error::{ChunkingError, Result};
use super::language::{DEFAULT_SEPARATORS, Language};
use super::length::{CharCount, LengthFunction};
use super::types::TextChunk;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Splitting policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkingStrategy {
    /// Coarse-to-fine recursion over a separator list
    Recursive,
    /// Single literal separator
    Fixed,
    /// Recursive over a per-language syntax table
    Code,
}

impl ChunkingStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ChunkingStrategy::Recursive => "recursive",
            ChunkingStrategy::Fixed => "fixed",
            ChunkingStrategy::Code => "code",
        }
    }
}

impl FromStr for ChunkingStrategy {
    type Err = ChunkingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recursive" => Ok(ChunkingStrategy::Recursive),
            // "character" is the historical name of the fixed splitter
            "fixed" | "character" => Ok(ChunkingStrategy::Fixed),
            "code" => Ok(ChunkingStrategy::Code),
            _ => Err(ChunkingError::unknown_strategy(s)),
        }
    }
}

impl fmt::Display for ChunkingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What happens to a matched separator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeepSeparator {
    /// Drop it; it is re-inserted between units when they are packed together
    None,
    /// Prefix it to the following piece
    #[default]
    Start,
    /// Append it to the preceding piece
    End,
}

/// How `chunk_size` bounds a chunk packed from several units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeBound {
    /// Packed chunks may reach `chunk_size`
    #[default]
    Inclusive,
    /// Packed chunks stay strictly below `chunk_size`; a single unit may still reach it
    Exclusive,
}

impl SizeBound {
    /// Whether a chunk of `length` must be closed before growing to that size
    pub fn exceeded(&self, length: usize, chunk_size: usize) -> bool {
        match self {
            SizeBound::Inclusive => length > chunk_size,
            SizeBound::Exclusive => length >= chunk_size,
        }
    }
}

/// Immutable splitter configuration
#[derive(Clone)]
pub struct SplitterConfig {
    pub strategy: ChunkingStrategy,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separators: Vec<String>,
    pub separator_is_regex: bool,
    pub keep_separator: KeepSeparator,
    pub strip_whitespace: bool,
    pub track_start_index: bool,
    pub size_bound: SizeBound,
    pub language: Option<Language>,
    pub length_function: Arc<dyn LengthFunction>,
}

impl SplitterConfig {
    pub const DEFAULT_CHUNK_SIZE: usize = 1000;
    pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
    pub const DEFAULT_FIXED_SEPARATOR: &'static str = "\n\n";

    /// Recursive splitting over paragraphs, lines, words and characters
    pub fn recursive(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            strategy: ChunkingStrategy::Recursive,
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            separator_is_regex: false,
            keep_separator: KeepSeparator::Start,
            strip_whitespace: true,
            track_start_index: true,
            size_bound: SizeBound::Inclusive,
            language: None,
            length_function: Arc::new(CharCount),
        }
    }

    /// Splitting on a single separator (blank lines by default)
    pub fn fixed(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            strategy: ChunkingStrategy::Fixed,
            separators: vec![Self::DEFAULT_FIXED_SEPARATOR.to_string()],
            keep_separator: KeepSeparator::None,
            // whole paragraphs are grouped only while they stay under the budget
            size_bound: SizeBound::Exclusive,
            ..Self::recursive(chunk_size, chunk_overlap)
        }
    }

    /// Syntax-aware splitting using the language's separator table
    pub fn code(language: Language, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            strategy: ChunkingStrategy::Code,
            separators: language.separators().iter().map(|s| s.to_string()).collect(),
            separator_is_regex: true,
            language: Some(language),
            ..Self::recursive(chunk_size, chunk_overlap)
        }
    }

    /// Build from loosely typed inputs (CLI / settings), validating everything up front
    pub fn from_strategy(
        strategy: &str,
        chunk_size: usize,
        chunk_overlap: usize,
        language: Option<&str>,
    ) -> Result<Self> {
        let config = match strategy.parse::<ChunkingStrategy>()? {
            ChunkingStrategy::Recursive => Self::recursive(chunk_size, chunk_overlap),
            ChunkingStrategy::Fixed => Self::fixed(chunk_size, chunk_overlap),
            ChunkingStrategy::Code => {
                let language = language
                    .ok_or(ChunkingError::MissingLanguage)?
                    .parse::<Language>()?;
                Self::code(language, chunk_size, chunk_overlap)
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the separator list with a single separator (fixed strategy)
    pub fn with_separator(self, separator: impl Into<String>) -> Self {
        self.with_separators([separator.into()])
    }

    pub fn with_separator_regex(mut self, is_regex: bool) -> Self {
        self.separator_is_regex = is_regex;
        self
    }

    pub fn with_keep_separator(mut self, keep_separator: KeepSeparator) -> Self {
        self.keep_separator = keep_separator;
        self
    }

    pub fn with_strip_whitespace(mut self, strip: bool) -> Self {
        self.strip_whitespace = strip;
        self
    }

    pub fn with_start_index(mut self, track: bool) -> Self {
        self.track_start_index = track;
        self
    }

    pub fn with_size_bound(mut self, size_bound: SizeBound) -> Self {
        self.size_bound = size_bound;
        self
    }

    pub fn with_length_function<L: LengthFunction + 'static>(mut self, length: L) -> Self {
        self.length_function = Arc::new(length);
        self
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChunkingError::overlap_too_large(
                self.chunk_overlap,
                self.chunk_size,
            ));
        }
        if self.strategy == ChunkingStrategy::Code && self.language.is_none() {
            return Err(ChunkingError::MissingLanguage);
        }
        if self.separators.is_empty() {
            return Err(ChunkingError::configuration(
                "at least one separator is required",
            ));
        }
        if self.strategy == ChunkingStrategy::Fixed && self.separators.len() != 1 {
            return Err(ChunkingError::configuration(format!(
                "the fixed strategy takes exactly one separator, got {}",
                self.separators.len()
            )));
        }
        Ok(())
    }

    /// Label used in output file names and logs
    pub fn label(&self) -> String {
        match self.language {
            Some(language) if self.strategy == ChunkingStrategy::Code => {
                format!("code_{language}")
            }
            _ => self.strategy.name().to_string(),
        }
    }
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self::recursive(Self::DEFAULT_CHUNK_SIZE, Self::DEFAULT_CHUNK_OVERLAP)
    }
}

impl fmt::Debug for SplitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitterConfig")
            .field("strategy", &self.strategy)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("separators", &self.separators)
            .field("separator_is_regex", &self.separator_is_regex)
            .field("keep_separator", &self.keep_separator)
            .field("strip_whitespace", &self.strip_whitespace)
            .field("track_start_index", &self.track_start_index)
            .field("size_bound", &self.size_bound)
            .field("language", &self.language)
            .field("length_function", &self.length_function.name())
            .finish()
    }
}

/// Statistical information for one chunking run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkingStatistics {
    /// Total processing time
    pub total_processing_time: Duration,
    pub input_element_count: usize,
    pub input_char_count: usize,
    pub total_chunks_created: usize,
    /// Chunks longer than chunk_size (single atomic units kept whole)
    pub oversized_chunks: usize,
    pub max_chunk_length: usize,
    pub min_chunk_length: usize,
    pub avg_chunk_length: f32,
}

impl ChunkingStatistics {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record input text statistics
    pub fn record_input(&mut self, text: &str) {
        self.input_element_count += 1;
        self.input_char_count += text.chars().count();
    }

    /// Record one emitted chunk with its size under the configured metric
    pub fn record_chunk(&mut self, length: usize, chunk_size: usize) {
        self.total_chunks_created += 1;
        if length > chunk_size {
            self.oversized_chunks += 1;
        }
        if self.max_chunk_length == 0 || length > self.max_chunk_length {
            self.max_chunk_length = length;
        }
        if self.min_chunk_length == 0 || length < self.min_chunk_length {
            self.min_chunk_length = length;
        }
        let n = self.total_chunks_created as f32;
        self.avg_chunk_length += (length as f32 - self.avg_chunk_length) / n;
    }

    /// Collect statistics for chunks already produced
    pub fn from_chunks(chunks: &[TextChunk], config: &SplitterConfig) -> Self {
        let mut stats = Self::new();
        for chunk in chunks {
            stats.record_chunk(
                config.length_function.length(&chunk.content),
                config.chunk_size,
            );
        }
        stats
    }

    /// Get summary as string for logging
    pub fn summary(&self) -> String {
        format!(
            "Chunking Stats: {} elements ({} chars) -> {} chunks \
            (len min/avg/max {}/{:.1}/{}, {} oversized) in {:.2}ms",
            self.input_element_count,
            self.input_char_count,
            self.total_chunks_created,
            self.min_chunk_length,
            self.avg_chunk_length,
            self.max_chunk_length,
            self.oversized_chunks,
            self.total_processing_time.as_secs_f64() * 1000.0,
        )
    }
}
