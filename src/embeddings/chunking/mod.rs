#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::document::Page;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size}) and size must be positive")]
    InvalidChunkConfig { size: usize, overlap: usize },
}

/// A contiguous slice of one page's text, sized for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    /// The passage text, an exact substring of the page text
    pub text: String,
    /// Page the passage was cut from
    pub page_number: u32,
    /// Start of the passage within the page text, in characters
    pub offset: usize,
    /// Position of this passage within the whole document
    pub chunk_index: usize,
}

impl Passage {
    /// Length of the passage in characters
    #[inline]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Character offset one past the end of the passage within its page
    #[inline]
    pub fn end_offset(&self) -> usize {
        self.offset + self.char_len()
    }
}

/// Configuration for passage chunking. Sizes are measured in characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum passage length
    pub chunk_size: usize,
    /// Characters shared by consecutive passages of the same page
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

impl ChunkingConfig {
    #[inline]
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkError> {
        let config = Self {
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(ChunkError::InvalidChunkConfig {
                size: self.chunk_size,
                overlap: self.chunk_overlap,
            });
        }
        Ok(())
    }

    /// Shortest passage a natural boundary may produce. Keeping passages longer
    /// than the overlap guarantees every window advances.
    fn min_split_len(&self) -> usize {
        self.chunk_overlap.max(self.chunk_size / 2) + 1
    }
}

/// Split every page into passages, numbering them across the whole document
#[inline]
pub fn chunk_pages(pages: &[Page], config: &ChunkingConfig) -> Result<Vec<Passage>, ChunkError> {
    config.validate()?;

    let mut passages = Vec::new();
    for page in pages {
        passages.extend(split_page(page, config));
    }

    for (i, passage) in passages.iter_mut().enumerate() {
        passage.chunk_index = i;
    }

    debug!(
        "Chunked {} pages into {} passages (avg {} chars)",
        pages.len(),
        passages.len(),
        passages.iter().map(Passage::char_len).sum::<usize>() / passages.len().max(1)
    );

    Ok(passages)
}

/// Split a single page into passages. Blank pages yield nothing.
#[inline]
pub fn chunk_page(page: &Page, config: &ChunkingConfig) -> Result<Vec<Passage>, ChunkError> {
    config.validate()?;
    Ok(split_page(page, config))
}

fn split_page(page: &Page, config: &ChunkingConfig) -> Vec<Passage> {
    if page.is_blank() {
        return Vec::new();
    }

    let chars: Vec<char> = page.text.chars().collect();
    split_windows(&chars, config)
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| Passage {
            text: chars[start..end].iter().collect(),
            page_number: page.number,
            offset: start,
            chunk_index: i,
        })
        .collect()
}

/// Greedy sliding split over a page's characters.
///
/// Each window is at most `chunk_size` long. When the rest of the page does not
/// fit, the window ends at the last natural boundary it contains, or is cut
/// hard at `chunk_size`. The next window starts `chunk_overlap` characters
/// before the previous end.
fn split_windows(chars: &[char], config: &ChunkingConfig) -> Vec<(usize, usize)> {
    let len = chars.len();
    let mut windows = Vec::new();
    if len == 0 {
        return windows;
    }

    let mut start = 0;
    loop {
        if len - start <= config.chunk_size {
            windows.push((start, len));
            break;
        }

        let hard_end = start + config.chunk_size;
        let min_end = start + config.min_split_len();
        let end = find_split_point(chars, min_end, hard_end).unwrap_or(hard_end);

        windows.push((start, end));
        start = end - config.chunk_overlap;
    }

    windows
}

/// Find the latest position in `min_end..=max_end` to end a passage at,
/// preferring paragraph breaks, then sentence ends, then any whitespace.
fn find_split_point(chars: &[char], min_end: usize, max_end: usize) -> Option<usize> {
    let is_paragraph_break = |p: usize| p >= 2 && chars[p - 1] == '\n' && chars[p - 2] == '\n';
    let is_sentence_end = |p: usize| {
        p >= 2 && chars[p - 1].is_whitespace() && matches!(chars[p - 2], '.' | '!' | '?')
    };
    let is_word_break = |p: usize| p >= 1 && chars[p - 1].is_whitespace();

    let candidates = || (min_end..=max_end).rev();

    candidates()
        .find(|&p| is_paragraph_break(p))
        .or_else(|| candidates().find(|&p| is_sentence_end(p)))
        .or_else(|| candidates().find(|&p| is_word_break(p)))
}
