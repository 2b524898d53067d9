//! Element normalization and element-to-chunk conversion

use super::element::{Chunk, Element};
use crate::text::chunking::{ChunkingStatistics, Result, SplitterConfig, TextSplitter};
use serde_json::Value;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// HTML rendering of a table, attached by structural parsers
pub const TABLE_HTML_KEY: &str = "text_as_html";
pub const SOURCE_KEY: &str = "source";
pub const START_INDEX_KEY: &str = "start_index";
pub const CATEGORY_KEY: &str = "category";
pub const ELEMENT_ID_KEY: &str = "element_id";

/// Clean one parser element for chunking
///
/// Tables with blank text take their HTML rendering as content, and the HTML
/// field is removed either way. Null metadata values are dropped, `source` is
/// set from the parser's `filename` (falling back to `fallback_source`), and
/// the element's category and id are stamped into its metadata.
pub fn normalize_element(mut element: Element, fallback_source: &str) -> Element {
    if element.kind.is_table() {
        let html = element.metadata.shift_remove(TABLE_HTML_KEY);
        if element.text.trim().is_empty() {
            match html {
                Some(Value::String(html)) if !html.is_empty() => {
                    debug!("table element without text, using its HTML rendering");
                    element.text = html;
                }
                _ => {}
            }
        }
    }

    element.metadata.retain(|_, value| !value.is_null());

    let source = element
        .metadata
        .get("filename")
        .cloned()
        .unwrap_or_else(|| Value::String(fallback_source.to_string()));
    element.metadata.insert(SOURCE_KEY.to_string(), source);

    element
        .metadata
        .entry(CATEGORY_KEY)
        .or_insert_with(|| Value::String(element.kind.name().to_string()));
    if let Some(id) = &element.element_id {
        element
            .metadata
            .entry(ELEMENT_ID_KEY)
            .or_insert_with(|| Value::String(id.clone()));
    }
    element
}

/// Normalize every element parsed from `path`, keeping order and count
pub fn normalize_elements(elements: Vec<Element>, path: &Path) -> Vec<Element> {
    let fallback_source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    elements
        .into_iter()
        .map(|element| normalize_element(element, &fallback_source))
        .collect()
}

/// Split every element's text and re-attach its metadata to each piece
pub fn chunk_elements(elements: &[Element], config: &SplitterConfig) -> Result<Vec<Chunk>> {
    chunk_elements_with_statistics(elements, config).map(|(chunks, _)| chunks)
}

/// [`chunk_elements`] that also reports what the run produced
pub fn chunk_elements_with_statistics(
    elements: &[Element],
    config: &SplitterConfig,
) -> Result<(Vec<Chunk>, ChunkingStatistics)> {
    let start_time = Instant::now();
    let splitter = TextSplitter::new(config.clone())?;
    let mut stats = ChunkingStatistics::new();
    let mut chunks = Vec::new();

    for element in elements {
        stats.record_input(&element.text);
        for piece in splitter.split_text(&element.text) {
            stats.record_chunk(
                config.length_function.length(&piece.content),
                config.chunk_size,
            );
            let mut metadata = element.metadata.clone();
            if config.track_start_index {
                metadata.insert(START_INDEX_KEY.to_string(), Value::from(piece.char_start));
            }
            chunks.push(Chunk::new(piece.content, metadata));
        }
    }

    stats.total_processing_time = start_time.elapsed();
    info!("[{}] {}", config.label(), stats.summary());
    Ok((chunks, stats))
}
