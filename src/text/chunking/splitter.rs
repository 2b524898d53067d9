//! Recursive and fixed-separator text splitting with offset tracking

use super::{
    config::{ChunkingStrategy, KeepSeparator, SplitterConfig},
    error::Result,
    types::{Span, TextChunk},
};
use itertools::Itertools;
use regex::Regex;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Packed chunk content located by byte offset in the original text
#[derive(Debug, Clone)]
struct Packed {
    content: String,
    start: usize,
}

/// Splits one text span into bounded, overlapping chunks
///
/// Every piece produced along the way is a slice of the original text, so
/// chunk offsets are exact even when the same substring occurs many times.
pub struct TextSplitter {
    config: SplitterConfig,
    /// One compiled pattern per separator; `None` is the per-character split
    patterns: Vec<Option<Regex>>,
}

impl TextSplitter {
    /// Create a splitter, rejecting invalid configurations before any work is done
    pub fn new(config: SplitterConfig) -> Result<Self> {
        config.validate()?;

        let patterns = config
            .separators
            .iter()
            .map(|sep| {
                if sep.is_empty() {
                    Ok(None)
                } else if config.separator_is_regex {
                    Regex::new(sep).map(Some)
                } else {
                    Regex::new(&regex::escape(sep)).map(Some)
                }
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(
            "Created {} splitter: chunk_size={}, chunk_overlap={}, {} separators",
            config.strategy,
            config.chunk_size,
            config.chunk_overlap,
            patterns.len()
        );

        Ok(Self { config, patterns })
    }

    /// Get configuration reference
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split `text` into ordered chunks with character start offsets
    pub fn split_text(&self, text: &str) -> Vec<TextChunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let root = Span::new(text, 0);
        let packed = match self.config.strategy {
            ChunkingStrategy::Fixed => {
                let (splits, merge_separator) = self.split_on(root, 0);
                self.merge_splits(&splits, &merge_separator)
            }
            ChunkingStrategy::Recursive | ChunkingStrategy::Code => self.split_recursive(root, 0),
        };

        let chunks = Self::locate_chunks(text, packed);
        debug!(
            "Split {} bytes into {} chunks ({} strategy)",
            text.len(),
            chunks.len(),
            self.config.strategy
        );
        chunks
    }

    /// Split many texts independently
    pub fn split_texts(&self, texts: &[&str]) -> Vec<Vec<TextChunk>> {
        texts.iter().map(|text| self.split_text(text)).collect()
    }

    fn length(&self, text: &str) -> usize {
        self.config.length_function.length(text)
    }

    /// Coarse-to-fine recursion: split on the first separator present, descend only for oversized pieces
    fn split_recursive<'a>(&self, span: Span<'a>, first: usize) -> Vec<Packed> {
        let mut index = self.patterns.len() - 1;
        let mut finer: Option<usize> = None;
        for (i, pattern) in self.patterns.iter().enumerate().skip(first) {
            match pattern {
                None => {
                    index = i;
                    break;
                }
                Some(re) if re.is_match(span.text) => {
                    index = i;
                    finer = (i + 1 < self.patterns.len()).then_some(i + 1);
                    break;
                }
                Some(_) => {}
            }
        }

        let (splits, merge_separator) = self.split_on(span, index);
        let mut final_chunks = Vec::new();
        let mut good_splits: Vec<Span<'a>> = Vec::new();

        for split in splits {
            if self.length(split.text) <= self.config.chunk_size {
                good_splits.push(split);
                continue;
            }
            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits, &merge_separator));
                good_splits.clear();
            }
            match finer {
                Some(next) => final_chunks.extend(self.split_recursive(split, next)),
                None => {
                    warn!(
                        "No finer separator left, keeping oversized piece of size {} (chunk_size {})",
                        self.length(split.text),
                        self.config.chunk_size
                    );
                    final_chunks.extend(self.join(&[split], ""));
                }
            }
        }
        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, &merge_separator));
        }
        final_chunks
    }

    /// Split a span on separator `index`, returning the non-empty pieces and the
    /// separator to re-insert when packing them
    fn split_on<'a>(&self, span: Span<'a>, index: usize) -> (Vec<Span<'a>>, String) {
        let text = span.text;
        let Some(re) = &self.patterns[index] else {
            let chars = text
                .char_indices()
                .map(|(offset, c)| Span::new(&text[offset..offset + c.len_utf8()], span.start + offset))
                .collect();
            return (chars, String::new());
        };

        let mut pieces = Vec::new();
        let mut prev = 0;
        let mut first_match: Option<&str> = None;
        for m in re.find_iter(text) {
            first_match.get_or_insert(m.as_str());
            match self.config.keep_separator {
                KeepSeparator::None => {
                    pieces.push(Span::new(&text[prev..m.start()], span.start + prev));
                    prev = m.end();
                }
                KeepSeparator::Start => {
                    pieces.push(Span::new(&text[prev..m.start()], span.start + prev));
                    prev = m.start();
                }
                KeepSeparator::End => {
                    pieces.push(Span::new(&text[prev..m.end()], span.start + prev));
                    prev = m.end();
                }
            }
        }
        pieces.push(Span::new(&text[prev..], span.start + prev));
        pieces.retain(|piece| !piece.is_empty());

        let merge_separator = match self.config.keep_separator {
            KeepSeparator::None if self.config.separator_is_regex => first_match.unwrap_or_default(),
            KeepSeparator::None => self.config.separators[index].as_str(),
            KeepSeparator::Start | KeepSeparator::End => "",
        };
        (pieces, merge_separator.to_string())
    }

    /// Greedy packing with backward overlap
    ///
    /// Units are appended until the next one would exceed the size bound; the
    /// next chunk then starts with the trailing units of the previous one whose
    /// combined size fits in `chunk_overlap` (possibly none).
    fn merge_splits(&self, splits: &[Span<'_>], separator: &str) -> Vec<Packed> {
        let chunk_size = self.config.chunk_size;
        let bound = self.config.size_bound;
        let separator_len = self.length(separator);

        let mut docs = Vec::new();
        let mut current: VecDeque<(Span<'_>, usize)> = VecDeque::new();
        let mut total = 0;

        for split in splits {
            let len = self.length(split.text);
            let joiner = if current.is_empty() { 0 } else { separator_len };

            if !current.is_empty() && bound.exceeded(total + joiner + len, chunk_size) {
                if total > chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, chunk_size
                    );
                }
                let units: Vec<Span<'_>> = current.iter().map(|(s, _)| *s).collect();
                docs.extend(self.join(&units, separator));

                while let Some(&(_, first_len)) = current.front() {
                    let keeps_too_much = total > self.config.chunk_overlap;
                    let blocks_next = total > 0 && bound.exceeded(total + separator_len + len, chunk_size);
                    if !(keeps_too_much || blocks_next) {
                        break;
                    }
                    total -= first_len + if current.len() > 1 { separator_len } else { 0 };
                    current.pop_front();
                }
            }

            current.push_back((*split, len));
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        let units: Vec<Span<'_>> = current.iter().map(|(s, _)| *s).collect();
        docs.extend(self.join(&units, separator));
        docs
    }

    /// Join units, strip, and map the first retained byte back to the original text
    fn join(&self, units: &[Span<'_>], separator: &str) -> Option<Packed> {
        let first = units.first()?;
        let joined = units.iter().map(|s| s.text).join(separator);

        let (content, lead) = if self.config.strip_whitespace {
            let trimmed = joined.trim_start();
            (trimmed.trim_end().to_string(), joined.len() - trimmed.len())
        } else {
            (joined, 0)
        };
        if content.is_empty() {
            return None;
        }

        let mut remaining = lead;
        let mut start = first.start;
        for (i, unit) in units.iter().enumerate() {
            if remaining < unit.text.len() {
                start = unit.start + remaining;
                break;
            }
            remaining -= unit.text.len();
            if i + 1 == units.len() {
                start = unit.end();
                break;
            }
            if remaining < separator.len() {
                // trimmed into an inserted separator: it follows the unit in the original text
                start = unit.end() + remaining;
                break;
            }
            remaining -= separator.len();
        }

        Some(Packed { content, start })
    }

    /// Convert byte offsets to character offsets, keeping them non-decreasing
    fn locate_chunks(text: &str, packed: Vec<Packed>) -> Vec<TextChunk> {
        let mut cursor_byte = 0;
        let mut cursor_char = 0;
        packed
            .into_iter()
            .enumerate()
            .map(|(index, p)| {
                let byte = p.start.max(cursor_byte).min(text.len());
                cursor_char += text[cursor_byte..byte].chars().count();
                cursor_byte = byte;
                TextChunk::new(p.content, cursor_char, index)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::chunking::{ChunkingError, Language, LengthFunction};

    fn contents(chunks: &[TextChunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.content.as_str()).collect()
    }

    fn starts(chunks: &[TextChunk]) -> Vec<usize> {
        chunks.iter().map(|c| c.char_start).collect()
    }

    /// Every chunk must sit at its recorded offset when it is a contiguous slice
    fn assert_offsets_match(text: &str, chunks: &[TextChunk]) {
        let chars: Vec<char> = text.chars().collect();
        for chunk in chunks {
            let (start, end) = chunk.char_range();
            let expected: String = chars[start..end.min(chars.len())].iter().collect();
            assert_eq!(
                chunk.content, expected,
                "chunk {} does not match its offset {}",
                chunk.chunk_index, chunk.char_start
            );
        }
    }

    /// Characters of `prev` repeated at the start of `next`
    fn overlap_between(prev: &TextChunk, next: &TextChunk) -> usize {
        (prev.char_start + prev.char_length()).saturating_sub(next.char_start)
    }

    fn assert_overlap_bounded(chunks: &[TextChunk], overlap: usize) {
        for pair in chunks.windows(2) {
            assert!(
                overlap_between(&pair[0], &pair[1]) <= overlap,
                "chunks {} and {} share more than {overlap} characters",
                pair[0].chunk_index,
                pair[1].chunk_index
            );
        }
    }

    #[test]
    fn test_recursive_splits_on_paragraphs() {
        let config = SplitterConfig::recursive(3, 0).with_separators(["\n\n"]);
        let splitter = TextSplitter::new(config).unwrap();

        let chunks = splitter.split_text("A\n\nB\n\nC");
        assert_eq!(contents(&chunks), vec!["A", "B", "C"]);
        assert_eq!(starts(&chunks), vec![0, 3, 6]);
    }

    #[test]
    fn test_fixed_keeps_paragraphs_apart() {
        let splitter = TextSplitter::new(SplitterConfig::fixed(12, 0)).unwrap();

        let text = "para1\n\npara2\n\npara3";
        let chunks = splitter.split_text(text);
        assert_eq!(contents(&chunks), vec!["para1", "para2", "para3"]);
        assert_eq!(starts(&chunks), vec![0, 7, 14]);
    }

    #[test]
    fn test_fixed_packs_with_overlap() {
        let splitter = TextSplitter::new(SplitterConfig::fixed(10, 4)).unwrap();

        let chunks = splitter.split_text("p1\n\np2\n\np3\n\np4");
        assert_eq!(
            contents(&chunks),
            vec!["p1\n\np2", "p2\n\np3", "p3\n\np4"]
        );
        assert_eq!(starts(&chunks), vec![0, 4, 8]);
        assert_offsets_match("p1\n\np2\n\np3\n\np4", &chunks);
    }

    #[test]
    fn test_fixed_keeps_oversized_segment_whole() {
        let splitter = TextSplitter::new(SplitterConfig::fixed(10, 0)).unwrap();

        let text = "short\n\nthis segment is far too long\n\nend";
        let chunks = splitter.split_text(text);
        assert_eq!(
            contents(&chunks),
            vec!["short", "this segment is far too long", "end"]
        );
        assert_eq!(starts(&chunks), vec![0, 7, 37]);
    }

    #[test]
    fn test_fixed_empty_separator_splits_per_character() {
        let config = SplitterConfig::fixed(2, 0).with_separator("");
        let splitter = TextSplitter::new(config).unwrap();

        let chunks = splitter.split_text("abcde");
        assert!(chunks.iter().all(|c| c.char_length() <= 2));
        assert_eq!(contents(&chunks).concat(), "abcde");
        assert_offsets_match("abcde", &chunks);
    }

    #[test]
    fn test_recursive_word_overlap() {
        let splitter = TextSplitter::new(SplitterConfig::recursive(15, 5)).unwrap();

        let text = "Hello world this is a test message";
        let chunks = splitter.split_text(text);
        assert_eq!(
            contents(&chunks),
            vec!["Hello world", "this is a test", "test message"]
        );
        assert_eq!(starts(&chunks), vec![0, 12, 22]);
        assert_offsets_match(text, &chunks);
    }

    #[test]
    fn test_repeated_content_gets_distinct_offsets() {
        let splitter = TextSplitter::new(SplitterConfig::recursive(8, 4)).unwrap();

        let text = "abc abc abc abc";
        let chunks = splitter.split_text(text);
        assert_eq!(contents(&chunks), vec!["abc abc", "abc abc", "abc abc"]);
        assert_eq!(starts(&chunks), vec![0, 4, 8]);
    }

    #[test]
    fn test_character_fallback_for_long_words() {
        let splitter = TextSplitter::new(SplitterConfig::recursive(4, 0)).unwrap();

        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(contents(&chunks), vec!["abcd", "efgh", "ij"]);
        assert_eq!(starts(&chunks), vec![0, 4, 8]);
    }

    #[test]
    fn test_oversized_word_kept_whole_without_character_fallback() {
        let config = SplitterConfig::recursive(5, 0).with_separators(["\n\n", "\n", " "]);
        let splitter = TextSplitter::new(config).unwrap();

        let text = "tiny supercalifragilistic end";
        let chunks = splitter.split_text(text);
        assert_eq!(
            contents(&chunks),
            vec!["tiny", "supercalifragilistic", "end"]
        );
        assert_eq!(starts(&chunks), vec![0, 5, 26]);
        assert_eq!(chunks[1].char_length(), 20);
    }

    #[test]
    fn test_unicode_offsets_are_characters() {
        let splitter = TextSplitter::new(SplitterConfig::recursive(5, 0)).unwrap();

        let text = "これは。\n\nテストです。";
        let chunks = splitter.split_text(text);
        assert_eq!(contents(&chunks), vec!["これは。", "テストで", "す。"]);
        assert_eq!(starts(&chunks), vec![0, 6, 10]);
        assert_offsets_match(text, &chunks);
    }

    #[test]
    fn test_code_splits_on_function_boundaries() {
        let splitter = TextSplitter::new(SplitterConfig::code(Language::Python, 30, 0)).unwrap();

        let text = "def foo():\n    return 1\n\ndef bar():\n    return 2\n";
        let chunks = splitter.split_text(text);
        assert_eq!(
            contents(&chunks),
            vec!["def foo():\n    return 1", "def bar():\n    return 2"]
        );
        assert_eq!(starts(&chunks), vec![0, 25]);
    }

    #[test]
    fn test_code_keeps_small_file_whole() {
        let splitter = TextSplitter::new(SplitterConfig::code(Language::Python, 60, 0)).unwrap();

        let text = "def foo():\n    return 1\n\ndef bar():\n    return 2\n";
        let chunks = splitter.split_text(text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text.trim());
    }

    #[test]
    fn test_markdown_prefers_headings() {
        let splitter =
            TextSplitter::new(SplitterConfig::code(Language::Markdown, 20, 0)).unwrap();

        let text = "# Title\n\nIntro text.\n\n## Section\n\nBody.";
        let chunks = splitter.split_text(text);
        assert_eq!(
            contents(&chunks),
            vec!["# Title", "Intro text.", "## Section\n\nBody."]
        );
        assert_eq!(starts(&chunks), vec![0, 9, 22]);
        assert_offsets_match(text, &chunks);
    }

    #[test]
    fn test_keep_separator_end() {
        let config = SplitterConfig::recursive(6, 0)
            .with_separators([". "])
            .with_keep_separator(KeepSeparator::End);
        let splitter = TextSplitter::new(config).unwrap();

        let chunks = splitter.split_text("One. Two. Six.");
        assert_eq!(contents(&chunks), vec!["One.", "Two.", "Six."]);
        assert_eq!(starts(&chunks), vec![0, 5, 10]);
    }

    #[test]
    fn test_regex_separator() {
        let config = SplitterConfig::fixed(8, 0)
            .with_separator(r"\s*;\s*")
            .with_separator_regex(true);
        let splitter = TextSplitter::new(config).unwrap();

        let chunks = splitter.split_text("alpha ; beta;gamma");
        assert_eq!(contents(&chunks), vec!["alpha", "beta", "gamma"]);
        assert_eq!(starts(&chunks), vec![0, 8, 13]);
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let config = SplitterConfig::fixed(8, 0)
            .with_separator("(unclosed")
            .with_separator_regex(true);
        assert!(matches!(
            TextSplitter::new(config),
            Err(ChunkingError::Regex(_))
        ));

        // the same text is fine as a literal
        let config = SplitterConfig::fixed(8, 0).with_separator("(unclosed");
        assert!(TextSplitter::new(config).is_ok());
    }

    #[test]
    fn test_overlap_not_smaller_than_size_is_rejected() {
        assert!(matches!(
            TextSplitter::new(SplitterConfig::recursive(10, 10)),
            Err(ChunkingError::OverlapTooLarge { .. })
        ));
        assert!(matches!(
            TextSplitter::new(SplitterConfig::fixed(10, 20)),
            Err(ChunkingError::OverlapTooLarge { .. })
        ));
    }

    #[test]
    fn test_empty_and_whitespace_text() {
        let splitter = TextSplitter::new(SplitterConfig::recursive(10, 0)).unwrap();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("   \n\n  \n").is_empty());
    }

    #[test]
    fn test_without_strip_whitespace() {
        let config = SplitterConfig::recursive(3, 0)
            .with_separators(["\n\n"])
            .with_strip_whitespace(false);
        let splitter = TextSplitter::new(config).unwrap();

        let chunks = splitter.split_text("A\n\nB");
        assert_eq!(contents(&chunks), vec!["A", "\n\nB"]);
        assert_eq!(starts(&chunks), vec![0, 1]);
    }

    #[test]
    fn test_strip_into_separator_keeps_its_offset() {
        let config = SplitterConfig::fixed(100, 0).with_separator("---");
        let splitter = TextSplitter::new(config).unwrap();

        let text = " \n---\nfoo";
        let chunks = splitter.split_text(text);
        assert_eq!(contents(&chunks), vec!["---\nfoo"]);
        assert_eq!(starts(&chunks), vec![2]);
        assert_offsets_match(text, &chunks);
    }

    #[test]
    fn test_custom_length_function() {
        // size measured in words
        let words = |text: &str| text.split_whitespace().count();
        let config = SplitterConfig::recursive(3, 0)
            .with_separators([" "])
            .with_length_function(words);
        let splitter = TextSplitter::new(config).unwrap();

        let chunks = splitter.split_text("one two three four five six seven");
        assert_eq!(
            contents(&chunks),
            vec!["one two three", "four five six", "seven"]
        );
        for chunk in &chunks {
            assert!(words.length(&chunk.content) <= 3);
        }
    }

    #[test]
    fn test_size_and_offset_invariants_on_prose() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit.\n\n\
                    Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua.\n\
                    Ut enim ad minim veniam, quis nostrud exercitation ullamco laboris.\n\n\
                    Duis aute irure dolor in reprehenderit in voluptate velit esse.";

        for (size, overlap) in [(20, 0), (40, 10), (64, 16), (100, 30)] {
            let splitter = TextSplitter::new(SplitterConfig::recursive(size, overlap)).unwrap();
            let chunks = splitter.split_text(text);

            assert!(!chunks.is_empty());
            for chunk in &chunks {
                assert!(chunk.char_length() <= size, "{size}/{overlap}: {chunk:?}");
            }
            for pair in chunks.windows(2) {
                assert!(pair[0].char_start <= pair[1].char_start);
            }
            assert_overlap_bounded(&chunks, overlap);
            for (i, chunk) in chunks.iter().enumerate() {
                assert_eq!(chunk.chunk_index, i);
            }
            assert_offsets_match(text, &chunks);
        }
    }

    #[test]
    fn test_fixed_overlap_stays_within_bound() {
        let text = "one two\n\nthree four\n\nfive\n\nsix seven eight\n\nnine\n\nten eleven";

        let mut shared = 0;
        for (size, overlap) in [(16, 6), (24, 10), (40, 20)] {
            let splitter = TextSplitter::new(SplitterConfig::fixed(size, overlap)).unwrap();
            let chunks = splitter.split_text(text);

            for chunk in &chunks {
                assert!(chunk.char_length() <= size, "{size}/{overlap}: {chunk:?}");
            }
            for pair in chunks.windows(2) {
                assert!(pair[0].char_start <= pair[1].char_start);
                shared += overlap_between(&pair[0], &pair[1]);
            }
            assert_overlap_bounded(&chunks, overlap);
            assert_offsets_match(text, &chunks);
        }
        assert!(shared > 0, "no configuration produced overlapping chunks");
    }

    #[test]
    fn test_split_texts() {
        let splitter = TextSplitter::new(SplitterConfig::recursive(100, 0)).unwrap();
        let results = splitter.split_texts(&["first", "", "third text"]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0][0].content, "first");
        assert!(results[1].is_empty());
        assert_eq!(results[2][0].content, "third text");
    }
}
