//! Element pipeline: parse files into elements, chunk them, persist the chunks

pub mod element;
pub mod error;
pub mod orchestrator;
pub mod parser;
pub mod pipeline;
pub mod sink;

pub use element::{Chunk, Element, ElementKind, Metadata};
pub use error::{PipelineError, Result};
pub use orchestrator::{
    ChunkingPlan, FileReport, OutputReport, PipelineConfig, PipelineOrchestrator,
    PipelineSettings,
};
pub use parser::{
    DocumentParser, ElementJsonParser, ParseOptions, ParseStrategy, ParserRegistry,
    PlainTextParser,
};
pub use pipeline::{chunk_elements, chunk_elements_with_statistics, normalize_element, normalize_elements};
pub use sink::{load_chunks_from_json, save_chunks_to_json};
