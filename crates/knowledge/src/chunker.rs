//! Text chunking with configurable size and overlap.
//!
//! Operates in character units. Output is fully deterministic for identical
//! input and configuration, which is what makes re-ingestion idempotent.

use crate::types::CharSpan;

/// One chunk candidate produced by [`chunk`], before embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    /// 0-based position, dense and contiguous
    pub index: u32,

    /// Chunk text, an exact slice of the input
    pub text: String,

    /// Character range within the input
    pub span: CharSpan,

    /// True when no sentence boundary existed in the window and the chunk
    /// was cut at the size limit instead
    pub hard_split: bool,
}

/// Sentence-ending characters considered split boundaries, CJK included.
const BOUNDARY_CHARS: [char; 7] = ['.', '!', '?', '\n', '。', '！', '？'];

/// Split text into overlapping chunks of at most `max_size` characters.
///
/// `overlap` trailing characters of each chunk are repeated at the start of
/// the next one, preserving local context across boundaries: for adjacent
/// spans, `span[i].end - span[i+1].start == overlap`. Chunks end at a
/// sentence boundary when one exists in the back half of the window;
/// otherwise they are hard-split at the limit and flagged.
///
/// `overlap` is capped at `max_size / 2`: boundary snapping never cuts a
/// chunk shorter than half a window, so within that cap the overlap
/// arithmetic holds exactly for every adjacent pair. `max_size` must be
/// positive.
pub fn chunk(text: &str, max_size: usize, overlap: usize) -> Vec<ChunkSpan> {
    let overlap = overlap.min(max_size / 2);
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    if total == 0 {
        return vec![];
    }

    if total <= max_size {
        return vec![ChunkSpan {
            index: 0,
            text: text.to_string(),
            span: CharSpan {
                start: 0,
                end: total,
            },
            hard_split: false,
        }];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0u32;

    loop {
        let limit = (start + max_size).min(total);
        let mut end = limit;
        let mut hard_split = false;

        if limit < total {
            // Look for a sentence boundary in the back half of the window.
            let floor = start + max_size / 2;
            match find_boundary(&chars, floor, limit) {
                Some(pos) => end = pos + 1,
                None => hard_split = true,
            }
        }

        chunks.push(ChunkSpan {
            index,
            text: chars[start..end].iter().collect(),
            span: CharSpan { start, end },
            hard_split,
        });
        index += 1;

        if end >= total {
            break;
        }

        // Guarantee forward progress even when overlap is large relative to
        // the boundary-shortened chunk.
        start = end.saturating_sub(overlap).max(start + 1);
    }

    tracing::debug!(
        chunks = chunks.len(),
        max_size,
        overlap,
        hard_splits = chunks.iter().filter(|c| c.hard_split).count(),
        "Chunked text"
    );

    chunks
}

/// Find the last boundary character in `chars[floor..limit]`.
fn find_boundary(chars: &[char], floor: usize, limit: usize) -> Option<usize> {
    (floor..limit)
        .rev()
        .find(|&i| BOUNDARY_CHARS.contains(&chars[i]))
}
