//! Document parser collaborators
//!
//! The chunking pipeline only consumes [`Element`]s. Parsers turn an input
//! file into that list: [`ElementJsonParser`] loads elements produced by an
//! external structural parser (PDF, DOCX, ...), [`PlainTextParser`] handles
//! text, markdown and source files directly.

use super::element::{Element, ElementKind, Metadata};
use super::error::{PipelineError, Result};
use crate::text::chunking::Language;
use crate::util::encoding::encode_to_utf8_raw;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

/// Layout analysis hint passed to the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    #[default]
    Auto,
    Fast,
    HiRes,
}

impl ParseStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ParseStrategy::Auto => "auto",
            ParseStrategy::Fast => "fast",
            ParseStrategy::HiRes => "hi_res",
        }
    }
}

impl FromStr for ParseStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ParseStrategy::Auto),
            "fast" => Ok(ParseStrategy::Fast),
            "hi_res" | "hi-res" | "hires" => Ok(ParseStrategy::HiRes),
            other => Err(format!("unknown parse strategy: {other}")),
        }
    }
}

/// Options forwarded to the document parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub strategy: ParseStrategy,
    /// OCR language hint, e.g. `chi_sim+eng`
    pub ocr_languages: Option<String>,
    pub extract_images_in_pdf: bool,
    /// Keep the HTML rendering of tables
    pub infer_table_structure: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strategy: ParseStrategy::Auto,
            ocr_languages: None,
            extract_images_in_pdf: false,
            infer_table_structure: true,
        }
    }
}

impl ParseOptions {
    /// OCR language hint split into individual codes
    pub fn languages(&self) -> Vec<String> {
        self.ocr_languages
            .as_deref()
            .map(|langs| {
                langs
                    .split(['+', ','])
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Turns one input file into parsed elements
pub trait DocumentParser: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Whether this parser handles the file
    fn supports(&self, path: &Path) -> bool;

    fn parse(&self, path: &Path, options: &ParseOptions) -> Result<Vec<Element>>;
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Loads a JSON array of elements written by a structural document parser
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementJsonParser;

impl DocumentParser for ElementJsonParser {
    fn name(&self) -> &str {
        "element-json"
    }

    fn supports(&self, path: &Path) -> bool {
        extension(path).as_deref() == Some("json")
    }

    fn parse(&self, path: &Path, options: &ParseOptions) -> Result<Vec<Element>> {
        let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
        let mut elements: Vec<Element> = serde_json::from_slice(&bytes)
            .map_err(|e| PipelineError::parse(path, format!("invalid element list: {e}")))?;

        if !options.infer_table_structure {
            for element in elements.iter_mut().filter(|e| e.kind.is_table()) {
                element.metadata.shift_remove("text_as_html");
            }
        }
        Ok(elements)
    }
}

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}\s").unwrap());
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+•]|\d+[.)])\s").unwrap());
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

/// Reads text, markdown and source files
///
/// Prose is split into blank-line separated blocks, each classified as a
/// title, list item or narrative text. A source file becomes a single code
/// element so syntax-aware chunking sees the whole file.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextParser;

impl PlainTextParser {
    const PROSE_EXTENSIONS: [&'static str; 7] = ["txt", "text", "md", "markdown", "rst", "log", "csv"];

    fn code_language(path: &Path) -> Option<Language> {
        Language::from_path(path).filter(Language::is_source_code)
    }

    fn filetype(path: &Path) -> String {
        if let Some(language) = Self::code_language(path) {
            return format!("text/x-{}", language.name());
        }
        match extension(path).as_deref() {
            Some("md") | Some("markdown") => "text/markdown",
            Some("rst") => "text/x-rst",
            Some("csv") => "text/csv",
            _ => "text/plain",
        }
        .to_string()
    }

    fn base_metadata(path: &Path, options: &ParseOptions) -> Metadata {
        let mut metadata = Metadata::new();
        if let Some(name) = path.file_name() {
            metadata.insert("filename".to_string(), name.to_string_lossy().into());
        }
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            metadata.insert("file_directory".to_string(), dir.to_string_lossy().into());
        }
        metadata.insert("filetype".to_string(), Self::filetype(path).into());
        let modified = fs::metadata(path).and_then(|m| m.modified()).ok();
        if let Some(modified) = modified {
            let modified: DateTime<Utc> = modified.into();
            metadata.insert("last_modified".to_string(), modified.to_rfc3339().into());
        }
        let languages = options.languages();
        if !languages.is_empty() {
            metadata.insert("languages".to_string(), Value::from(languages));
        }
        metadata
    }

    fn classify(block: &str) -> ElementKind {
        if block.starts_with("```") {
            ElementKind::CodeSnippet
        } else if HEADING.is_match(block) && !block.contains('\n') {
            ElementKind::Title
        } else if block.lines().all(|line| LIST_ITEM.is_match(line)) {
            ElementKind::ListItem
        } else {
            ElementKind::NarrativeText
        }
    }

    fn blocks(text: &str) -> Vec<&str> {
        BLANK_LINES
            .split(text)
            .map(str::trim)
            .filter(|block| !block.is_empty())
            .collect()
    }
}

impl DocumentParser for PlainTextParser {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn supports(&self, path: &Path) -> bool {
        let prose = extension(path)
            .is_some_and(|ext| Self::PROSE_EXTENSIONS.contains(&ext.as_str()));
        prose || Self::code_language(path).is_some()
    }

    fn parse(&self, path: &Path, options: &ParseOptions) -> Result<Vec<Element>> {
        let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
        let text = encode_to_utf8_raw(&bytes).map_err(|e| PipelineError::parse(path, e.to_string()))?;
        let metadata = Self::base_metadata(path, options);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let elements: Vec<Element> = if Self::code_language(path).is_some() {
            if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![Element {
                    kind: ElementKind::CodeSnippet,
                    element_id: Some(format!("{stem}-0000")),
                    text,
                    metadata,
                }]
            }
        } else {
            Self::blocks(&text)
                .into_iter()
                .enumerate()
                .map(|(index, block)| Element {
                    kind: Self::classify(block),
                    element_id: Some(format!("{stem}-{index:04}")),
                    text: block.to_string(),
                    metadata: metadata.clone(),
                })
                .collect()
        };
        debug!(
            "{} parsed {} into {} elements",
            self.name(),
            path.display(),
            elements.len()
        );
        Ok(elements)
    }
}

/// Parsers tried in registration order
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn DocumentParser>>,
}

impl ParserRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Registry with the built-in parsers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ElementJsonParser);
        registry.register(PlainTextParser);
        registry
    }

    pub fn register<P: DocumentParser + 'static>(&mut self, parser: P) {
        self.parsers.push(Arc::new(parser));
    }

    pub fn names(&self) -> Vec<&str> {
        self.parsers.iter().map(|p| p.name()).collect()
    }

    /// Get the first parser that handles the file
    pub fn get_for_file(&self, path: &Path) -> Option<Arc<dyn DocumentParser>> {
        self.parsers.iter().find(|p| p.supports(path)).cloned()
    }

    /// Parse a file with the matching parser
    pub fn parse(&self, path: &Path, options: &ParseOptions) -> Result<Vec<Element>> {
        if !path.exists() {
            return Err(PipelineError::InputNotFound(path.to_path_buf()));
        }
        let parser = self
            .get_for_file(path)
            .ok_or_else(|| PipelineError::UnsupportedFormat(path.to_path_buf()))?;

        info!(
            "Parsing {} with {} (strategy: {})",
            path.display(),
            parser.name(),
            options.strategy.name()
        );
        let elements = parser.parse(path, options)?;
        info!("Parsed {} elements from {}", elements.len(), path.display());
        Ok(elements)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
