//! Core data structures for text splitting

/// One piece of split text with its position in the original span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Chunk content
    pub content: String,
    /// Character offset of the first retained character in the original text
    pub char_start: usize,
    /// Index of this chunk in the sequence
    pub chunk_index: usize,
}

impl TextChunk {
    pub fn new(content: String, char_start: usize, chunk_index: usize) -> Self {
        Self {
            content,
            char_start,
            chunk_index,
        }
    }

    /// Get the length of the chunk in characters
    pub fn char_length(&self) -> usize {
        self.content.chars().count()
    }

    /// Check if this chunk is empty
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Character range covered when the chunk is a contiguous slice of the original
    pub fn char_range(&self) -> (usize, usize) {
        (self.char_start, self.char_start + self.char_length())
    }
}

/// A borrowed slice of the original text, located by byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span<'a> {
    pub text: &'a str,
    pub start: usize,
}

impl<'a> Span<'a> {
    pub fn new(text: &'a str, start: usize) -> Self {
        Self { text, start }
    }

    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_chunk_creation() {
        let chunk = TextChunk::new("これはテストです。".to_string(), 10, 0);

        assert_eq!(chunk.content, "これはテストです。");
        assert_eq!(chunk.char_start, 10);
        assert_eq!(chunk.chunk_index, 0);
        assert_eq!(chunk.char_length(), 9);
        assert!(!chunk.is_empty());
        assert_eq!(chunk.char_range(), (10, 19));
    }

    #[test]
    fn test_empty_chunk() {
        let chunk = TextChunk::new(String::new(), 0, 0);
        assert!(chunk.is_empty());
        assert_eq!(chunk.char_length(), 0);
        assert_eq!(chunk.char_range(), (0, 0));
    }

    #[test]
    fn test_span_end() {
        let text = "hello world";
        let span = Span::new(&text[6..], 6);
        assert_eq!(span.end(), text.len());
        assert!(!span.is_empty());
        assert!(Span::new("", 3).is_empty());
    }
}
