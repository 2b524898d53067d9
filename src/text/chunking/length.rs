//! Pluggable size metrics for chunking

use tracing::warn;

/// Maps a text span to the scalar size that `chunk_size` and `chunk_overlap` are measured in
pub trait LengthFunction: Send + Sync {
    fn length(&self, text: &str) -> usize;

    /// Short name used in logs
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> LengthFunction for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn length(&self, text: &str) -> usize {
        self(text)
    }
}

/// Counts Unicode scalar values (the default metric)
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCount;

impl LengthFunction for CharCount {
    fn length(&self, text: &str) -> usize {
        text.chars().count()
    }

    fn name(&self) -> &str {
        "chars"
    }
}

/// Counts UTF-8 bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCount;

impl LengthFunction for ByteCount {
    fn length(&self, text: &str) -> usize {
        text.len()
    }

    fn name(&self) -> &str {
        "bytes"
    }
}

/// Generic token provider trait for text tokenization
///
/// This trait abstracts tokenization functionality to allow different
/// tokenizer implementations (llama.cpp, HuggingFace tokenizers, etc.)
pub trait TokenProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Tokenize a single text string into token IDs
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, Self::Error>;

    /// Get estimated token count without full tokenization (optional fast path)
    fn estimate_token_count(&self, text: &str) -> Result<usize, Self::Error> {
        self.tokenize(text).map(|tokens| tokens.len())
    }
}

/// Token-count metric backed by a [`TokenProvider`]
///
/// Falls back to a rough 4-characters-per-token estimate when the provider fails.
pub struct TokenLength<T: TokenProvider> {
    provider: T,
}

impl<T: TokenProvider> TokenLength<T> {
    pub fn new(provider: T) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &T {
        &self.provider
    }
}

impl<T: TokenProvider> LengthFunction for TokenLength<T> {
    fn length(&self, text: &str) -> usize {
        match self.provider.estimate_token_count(text) {
            Ok(count) => count,
            Err(e) => {
                warn!("token provider failed, estimating from characters: {:?}", e);
                text.chars().count().div_ceil(4)
            }
        }
    }

    fn name(&self) -> &str {
        "tokens"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mock token provider for testing
    struct MockTokenProvider;

    impl TokenProvider for MockTokenProvider {
        type Error = std::io::Error;

        fn tokenize(&self, text: &str) -> Result<Vec<u32>, Self::Error> {
            // Simple mock: 1 token per whitespace-separated word
            Ok((1..=text.split_whitespace().count() as u32).collect())
        }
    }

    struct FailingTokenProvider;

    impl TokenProvider for FailingTokenProvider {
        type Error = std::io::Error;

        fn tokenize(&self, _text: &str) -> Result<Vec<u32>, Self::Error> {
            Err(std::io::Error::other("tokenizer unavailable"))
        }
    }

    #[test]
    fn test_char_count_counts_scalars() {
        assert_eq!(CharCount.length("hello"), 5);
        assert_eq!(CharCount.length("これはテスト"), 6);
        assert_eq!(CharCount.length(""), 0);
    }

    #[test]
    fn test_byte_count() {
        assert_eq!(ByteCount.length("hello"), 5);
        assert_eq!(ByteCount.length("これ"), 6);
    }

    #[test]
    fn test_closure_as_length_function() {
        let words = |text: &str| text.split_whitespace().count();
        assert_eq!(words.length("one two three"), 3);
        assert_eq!(words.name(), "custom");
    }

    #[test]
    fn test_token_length() {
        let metric = TokenLength::new(MockTokenProvider);
        assert_eq!(metric.length("hello world test"), 3);
        assert_eq!(metric.name(), "tokens");
    }

    #[test]
    fn test_token_length_falls_back_on_error() {
        let metric = TokenLength::new(FailingTokenProvider);
        // 16 chars / 4 = 4 tokens
        assert_eq!(metric.length("hello world test"), 4);
        assert_eq!(metric.length("abcde"), 2);
    }
}
