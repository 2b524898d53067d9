//! Separator-driven text chunking for retrieval pipelines
//!
//! Splits text into bounded, overlapping chunks that follow natural boundaries
//! (paragraphs, lines, words, or syntax constructs for source code) and records
//! where each chunk starts in the original text.

pub mod config;
pub mod error;
pub mod language;
pub mod length;
pub mod splitter;
pub mod types;

// Re-export main public interfaces
pub use config::{ChunkingStatistics, ChunkingStrategy, KeepSeparator, SizeBound, SplitterConfig};
pub use error::{ChunkingError, Result};
pub use language::{DEFAULT_SEPARATORS, Language};
pub use length::{ByteCount, CharCount, LengthFunction, TokenLength, TokenProvider};
pub use splitter::TextSplitter;
pub use types::TextChunk;
