//! Fixed-size overlapping word-window chunking.

use crate::config::ChunkingConfig;
use crate::error::{RagError, Result};

/// Splits text into overlapping windows of whole words.
///
/// Windows are `max_tokens` words wide and advance by
/// `max_tokens - overlap` words, so consecutive windows share `overlap`
/// words. Construction rejects parameter combinations that could not make
/// forward progress.
///
/// # Example
///
/// ```rust,ignore
/// use ragbench::WordChunker;
///
/// let chunker = WordChunker::new(150, 20)?;
/// let windows = chunker.split("some long cleaned text ...");
/// ```
#[derive(Debug, Clone)]
pub struct WordChunker {
    max_tokens: usize,
    overlap: usize,
}

impl WordChunker {
    /// Create a new `WordChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `max_tokens == 0` or
    /// `overlap >= max_tokens`. A step of zero or less would stall the
    /// window loop, so it is rejected here rather than at split time.
    pub fn new(max_tokens: usize, overlap: usize) -> Result<Self> {
        if max_tokens == 0 {
            return Err(RagError::Config("max_tokens must be greater than zero".to_string()));
        }
        if overlap >= max_tokens {
            return Err(RagError::Config(format!(
                "overlap ({overlap}) must be less than max_tokens ({max_tokens})"
            )));
        }
        Ok(Self { max_tokens, overlap })
    }

    /// Create a chunker from a validated [`ChunkingConfig`].
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.max_tokens, config.overlap)
    }

    /// Split text into overlapping word windows, each joined with single spaces.
    ///
    /// Text with no words returns a single chunk equal to the original input;
    /// an empty document is never discarded. Windows cover all words in
    /// order, and a text of `max_tokens` words or fewer comes back as exactly
    /// one word-rejoined chunk.
    pub fn split(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return vec![text.to_string()];
        }

        let step = self.max_tokens - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + self.max_tokens).min(words.len());
            chunks.push(words[start..end].join(" "));
            start += step;
        }
        chunks
    }
}
