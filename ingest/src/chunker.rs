//! Overlapping window chunking with sentence-boundary snapping.

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

/// How far back from the nominal window boundary to look for a sentence end.
const SENTENCE_SEARCH_WINDOW: usize = 200;

/// Configuration for the chunker.
///
/// Constructing a config validates that the overlap is strictly smaller
/// than the window, so a [`Chunker`] can never loop on its input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkerConfig {
    max_chars: usize,
    overlap: usize,
}

impl ChunkerConfig {
    /// Create a validated configuration.
    pub fn new(max_chars: usize, overlap: usize) -> Result<Self> {
        if max_chars == 0 || overlap >= max_chars {
            return Err(IngestError::InvalidChunking { max_chars, overlap });
        }
        Ok(Self { max_chars, overlap })
    }

    /// Maximum chunk size in bytes.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Target overlap between adjacent chunks in bytes.
    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chars: 1500,
            overlap: 150,
        }
    }
}

/// Splits one section's text into overlapping fixed-size windows.
///
/// Boundaries prefer the rightmost `". "` within the last
/// [`SENTENCE_SEARCH_WINDOW`] bytes of the nominal window, so chunks tend to
/// end on whole sentences. The overlap is therefore a target, not an exact
/// count: a sentence snap shifts the boundary, and the following chunk
/// starts `overlap` bytes before wherever the boundary landed.
///
/// Chunking is deterministic: the same text and configuration always
/// produce the same chunk list.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a chunker with the given configuration.
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split text into overlapping chunks.
    ///
    /// Text that fits in one window is returned as a single chunk with no
    /// overlap applied.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let max_chars = self.config.max_chars;
        let overlap = self.config.overlap;

        if text.len() <= max_chars {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < text.len() {
            let nominal = start.saturating_add(max_chars);
            let mut end = if nominal < text.len() {
                floor_char_boundary(text, nominal)
            } else {
                text.len()
            };

            if end < text.len() {
                // Snap back to the rightmost sentence end inside the window
                let search_start =
                    floor_char_boundary(text, end.saturating_sub(SENTENCE_SEARCH_WINDOW).max(start));
                if let Some(pos) = text[search_start..end].rfind(". ") {
                    let last_period = search_start + pos;
                    if last_period > start {
                        end = last_period + 1;
                    }
                }
            }

            let chunk = text[start..end].trim();
            if !chunk.is_empty() {
                chunks.push(chunk.to_string());
            }

            start = if end < text.len() {
                let next = floor_char_boundary(text, end.saturating_sub(overlap));
                // Overlap never moves the window backwards
                if next > start { next } else { end }
            } else {
                end
            };
        }

        chunks
    }
}

/// Largest index `<= index` that lies on a char boundary.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut index = index;
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
