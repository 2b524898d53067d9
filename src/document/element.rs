//! Parsed elements and the chunks produced from them

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form, insertion-ordered element metadata
pub type Metadata = serde_json::Map<String, Value>;

/// Element categories emitted by structural document parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ElementKind {
    Title,
    NarrativeText,
    ListItem,
    Table,
    TableChunk,
    Image,
    FigureCaption,
    Header,
    Footer,
    PageBreak,
    PageNumber,
    Address,
    EmailAddress,
    Formula,
    CodeSnippet,
    CompositeElement,
    #[default]
    #[serde(other)]
    UncategorizedText,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Title => "Title",
            ElementKind::NarrativeText => "NarrativeText",
            ElementKind::ListItem => "ListItem",
            ElementKind::Table => "Table",
            ElementKind::TableChunk => "TableChunk",
            ElementKind::Image => "Image",
            ElementKind::FigureCaption => "FigureCaption",
            ElementKind::Header => "Header",
            ElementKind::Footer => "Footer",
            ElementKind::PageBreak => "PageBreak",
            ElementKind::PageNumber => "PageNumber",
            ElementKind::Address => "Address",
            ElementKind::EmailAddress => "EmailAddress",
            ElementKind::Formula => "Formula",
            ElementKind::CodeSnippet => "CodeSnippet",
            ElementKind::CompositeElement => "CompositeElement",
            ElementKind::UncategorizedText => "UncategorizedText",
        }
    }

    /// Map a parser category name; unknown names become `UncategorizedText`
    pub fn from_category(category: &str) -> Self {
        serde_json::from_value(Value::String(category.to_string())).unwrap_or_default()
    }

    /// Tables may carry their content only as HTML
    pub fn is_table(&self) -> bool {
        matches!(self, ElementKind::Table | ElementKind::TableChunk)
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One unit of parsed document content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type", default)]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Element {
    pub fn new(kind: ElementKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            element_id: None,
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_element_id(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }
}

/// Serialized unit of output: content plus the originating element's metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(rename = "page_content")]
    pub content: String,
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Start offset recorded by the splitter, if offset tracking was enabled
    pub fn start_index(&self) -> Option<usize> {
        self.metadata
            .get("start_index")
            .and_then(Value::as_u64)
            .map(|v| v as usize)
    }
}

/// An element kept whole (the unchunked "parsed only" view)
impl From<Element> for Chunk {
    fn from(element: Element) -> Self {
        Self {
            content: element.text,
            metadata: element.metadata,
        }
    }
}
