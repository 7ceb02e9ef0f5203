//! Boundary-aware splitting of long documents into overlapping chunks.
//!
//! Chunks are sized for the extraction client's input limit. When a chunk
//! has to end before the document does, the chunker searches backward from
//! the size limit for the most structural break it can find, so sections
//! are rarely cut in half. Consecutive chunks overlap, which lets a section
//! straddling a boundary be extracted whole from at least one chunk; the
//! merger removes the resulting duplicates.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::{ChunkingConfig, BREAK_SEARCH_FRACTION, MAX_BREAK_SEARCH_WINDOW};
use crate::error::{CoreError, Result};
use crate::types::{RawDocument, TextChunk};

/// Where a break lands relative to a pattern match.
#[derive(Debug, Clone, Copy)]
enum BreakAt {
    /// After the leading newline of the match (the matched line starts the next chunk).
    LineStart,
    /// After the whole match.
    MatchEnd,
}

/// A break-point pattern, in priority order.
struct BreakPattern {
    name: &'static str,
    regex: Regex,
    at: BreakAt,
}

#[allow(clippy::expect_used)] // Static regexes that are guaranteed to be valid
static BREAK_PATTERNS: LazyLock<Vec<BreakPattern>> = LazyLock::new(|| {
    vec![
        // Structural header: "Section 12", "PART IV", "Chapter 3". Roman
        // numerals must be upper case so "part did" is not a header.
        BreakPattern {
            name: "header",
            regex: Regex::new(r"\n[ \t]*(?i:section|part|chapter)[ \t]+(?:\d+|[IVXLCDM]+\b)")
                .expect("valid regex"),
            at: BreakAt::LineStart,
        },
        // Enumerated sub-item: "(1)", "(a)", "(iv)", "3. "
        BreakPattern {
            name: "sub-item",
            regex: Regex::new(r"\n[ \t]*(?:\(\d+[a-z]?\)|\([a-z]{1,4}\)|\d+\.[ \t])")
                .expect("valid regex"),
            at: BreakAt::LineStart,
        },
        BreakPattern {
            name: "paragraph",
            regex: Regex::new(r"\n[ \t]*\n").expect("valid regex"),
            at: BreakAt::MatchEnd,
        },
        BreakPattern {
            name: "sentence",
            regex: Regex::new(r"[.!?]\s+").expect("valid regex"),
            at: BreakAt::MatchEnd,
        },
    ]
});

/// Split text into overlapping, boundary-aware chunks.
///
/// Sizes and offsets are byte counts; every offset lands on a `char`
/// boundary so each chunk is a valid substring of `text`.
///
/// # Errors
/// Returns [`CoreError::InvalidChunkSize`] when `max_chunk_size` is zero.
///
/// # Examples
/// ```
/// use lawtext_core::chunker::chunk_text;
///
/// let chunks = chunk_text("Section 1. Short title.", 1_000, 100).unwrap();
/// assert_eq!(chunks.len(), 1);
/// assert!(!chunks[0].has_overlap_into_next);
/// ```
pub fn chunk_text(text: &str, max_chunk_size: usize, overlap_size: usize) -> Result<Vec<TextChunk>> {
    if max_chunk_size == 0 {
        return Err(CoreError::InvalidChunkSize(max_chunk_size));
    }

    if text.len() <= max_chunk_size {
        return Ok(vec![TextChunk {
            index: 0,
            text: text.to_string(),
            start_char: 0,
            end_char: text.len(),
            has_overlap_from_previous: false,
            has_overlap_into_next: false,
        }]);
    }

    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut current = 0;

    while current < text.len() {
        let mut target = floor_char_boundary(text, current.saturating_add(max_chunk_size));
        if target <= current {
            // A single multi-byte char wider than the chunk size
            target = ceil_char_boundary(text, current + 1);
        }

        let end = if target < text.len() {
            find_break_point(text, current, target, max_chunk_size)
        } else {
            target
        };

        spans.push((current, end));
        if end >= text.len() {
            break;
        }

        let mut next = floor_char_boundary(text, end.saturating_sub(overlap_size));
        if next <= current {
            next = end;
        }
        current = next;
    }

    let last = spans.len().saturating_sub(1);
    let chunks: Vec<TextChunk> = spans
        .into_iter()
        .enumerate()
        .map(|(index, (start, end))| TextChunk {
            index,
            text: text[start..end].to_string(),
            start_char: start,
            end_char: end,
            has_overlap_from_previous: index > 0,
            has_overlap_into_next: index < last,
        })
        .collect();

    tracing::debug!(
        chunks = chunks.len(),
        total_bytes = text.len(),
        max_chunk_size,
        overlap_size,
        "Chunked document"
    );

    Ok(chunks)
}

/// Chunk a raw document using a chunking configuration.
pub fn chunk_document(document: &RawDocument, config: &ChunkingConfig) -> Result<Vec<TextChunk>> {
    chunk_text(&document.text, config.max_chunk_size, config.overlap_size)
}

/// Find the best break point at or before `target`.
///
/// Searches at most `min(5000, 10% of max_chunk_size)` bytes backward.
/// The first pattern (in priority order) with any match wins, using its
/// rightmost match. Falls back to `target` itself.
fn find_break_point(text: &str, current: usize, target: usize, max_chunk_size: usize) -> usize {
    let window = MAX_BREAK_SEARCH_WINDOW.min((max_chunk_size as f64 * BREAK_SEARCH_FRACTION) as usize);
    let search_start = ceil_char_boundary(text, target.saturating_sub(window).max(current));
    if search_start >= target {
        return target;
    }
    let region = &text[search_start..target];

    for pattern in BREAK_PATTERNS.iter() {
        let candidate = pattern
            .regex
            .find_iter(region)
            .map(|m| {
                let offset = match pattern.at {
                    BreakAt::LineStart => m.start() + 1,
                    BreakAt::MatchEnd => m.end(),
                };
                search_start + offset
            })
            .filter(|&bp| bp > current)
            .last();

        if let Some(bp) = candidate {
            tracing::trace!(kind = pattern.name, break_point = bp, target, "Found break point");
            return bp;
        }
    }

    tracing::trace!(target, "No break point in search window, splitting at size limit");
    target
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rebuild the original text from overlapping chunks.
    fn reconstruct(chunks: &[TextChunk]) -> String {
        let mut out = String::new();
        let mut covered = 0;
        for chunk in chunks {
            assert!(chunk.start_char <= covered, "gap before chunk {}", chunk.index);
            out.push_str(&chunk.text[covered - chunk.start_char..]);
            covered = chunk.end_char;
        }
        out
    }

    fn filler_sentence(i: usize) -> String {
        format!("This is filler sentence number {i} describing a provision. ")
    }

    #[test]
    fn test_short_text_single_chunk() {
        let text = "Section 1. This Act may be cited as the Police Act.";
        let chunks = chunk_text(text, 1_000, 100).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].start_char, 0);
        assert_eq!(chunks[0].end_char, text.len());
        assert!(!chunks[0].has_overlap_from_previous);
        assert!(!chunks[0].has_overlap_into_next);
    }

    #[test]
    fn test_exact_size_single_chunk() {
        let text = "a".repeat(500);
        let chunks = chunk_text(&text, 500, 50).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_zero_chunk_size_fails_fast() {
        let err = chunk_text("anything", 0, 0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidChunkSize(0)));
    }

    #[test]
    fn test_long_text_reconstructs_exactly() {
        let text: String = (0..200).map(filler_sentence).collect();
        let chunks = chunk_text(&text, 1_000, 150).unwrap();
        assert!(chunks.len() > 1);
        assert_eq!(reconstruct(&chunks), text);
        for chunk in &chunks {
            assert!(chunk.text.len() <= 1_000);
            assert_eq!(chunk.text, &text[chunk.start_char..chunk.end_char]);
        }
    }

    #[test]
    fn test_overlap_flags() {
        let text: String = (0..100).map(filler_sentence).collect();
        let chunks = chunk_text(&text, 800, 100).unwrap();
        assert!(chunks.len() >= 3);
        let last = chunks.len() - 1;
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.has_overlap_from_previous, i > 0);
            assert_eq!(chunk.has_overlap_into_next, i < last);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text: String = (0..100).map(filler_sentence).collect();
        let chunks = chunk_text(&text, 800, 100).unwrap();
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start_char, pair[0].end_char - 100);
        }
    }

    #[test]
    fn test_break_lands_before_section_header() {
        let mut text = String::new();
        while text.len() < 950 {
            text.push_str("The Commission shall keep proper accounts. ");
        }
        let header_pos = text.len() + 1;
        text.push_str("\nSection 12. Appointment of officers\n");
        while text.len() < 3_000 {
            text.push_str("More provisions follow in this part. ");
        }

        let chunks = chunk_text(&text, 1_000, 50).unwrap();
        assert_eq!(chunks[0].end_char, header_pos);
        assert!(text[chunks[0].end_char..].starts_with("Section 12."));
    }

    #[test]
    fn test_header_preferred_over_later_sentence_break() {
        let mut text = "x. ".repeat(300);
        text.push_str("\nPART IV - Offences\n");
        let header_pos = text.len() - "PART IV - Offences\n".len();
        // Sentence breaks after the header, still inside the search window
        text.push_str(&"Another sentence here. ".repeat(3));
        let limit = text.len() + 10;
        text.push_str(&"Tail text without end ".repeat(20));

        let chunks = chunk_text(&text, limit, 0).unwrap();
        assert_eq!(chunks[0].end_char, header_pos);
    }

    #[test]
    fn test_sub_item_break() {
        let mut text = "word ".repeat(190);
        text.push_str("\n(2) The second subsection follows here");
        let item_pos = text.len() - "(2) The second subsection follows here".len();
        text.push_str(&" more".repeat(200));

        let chunks = chunk_text(&text, 1_000, 0).unwrap();
        assert_eq!(chunks[0].end_char, item_pos);
    }

    #[test]
    fn test_roman_letter_words_are_not_headers() {
        let mut text = "word ".repeat(182);
        text.push_str("\n(2) The second subsection follows");
        let item_pos = text.find("(2)").unwrap();
        text.push_str("\npart did not apply to them");
        text.push_str(&" more".repeat(200));

        let chunks = chunk_text(&text, 1_000, 0).unwrap();
        assert_eq!(chunks[0].end_char, item_pos);
    }

    #[test]
    fn test_paragraph_break_before_sentence_break() {
        let mut text = "word ".repeat(185);
        text.push_str("end of paragraph\n\nNext paragraph starts. And continues. ");
        let para_end = text.find("\n\n").unwrap() + 2;
        text.push_str(&"tail ".repeat(300));

        let chunks = chunk_text(&text, 1_000, 0).unwrap();
        assert_eq!(chunks[0].end_char, para_end);
    }

    #[test]
    fn test_falls_back_to_raw_position_without_breaks() {
        let text = "a".repeat(2_500);
        let chunks = chunk_text(&text, 1_000, 100).unwrap();
        assert_eq!(chunks[0].end_char, 1_000);
        assert_eq!(chunks[1].start_char, 900);
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_overlap_larger_than_chunk_still_progresses() {
        let text = "b".repeat(1_000);
        let chunks = chunk_text(&text, 100, 500).unwrap();
        assert_eq!(chunks.len(), 10);
        assert_eq!(reconstruct(&chunks), text);
        for pair in chunks.windows(2) {
            assert!(pair[1].start_char > pair[0].start_char);
        }
    }

    #[test]
    fn test_multibyte_text_stays_on_char_boundaries() {
        let text = "₦500 fine — imprisonment. ".repeat(120);
        let chunks = chunk_text(&text, 333, 40).unwrap();
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_chunk_document_uses_config() {
        let doc = RawDocument::new("Section 1. Citation.", 1);
        let chunks = chunk_document(&doc, &ChunkingConfig::default()).unwrap();
        assert_eq!(chunks.len(), 1);
    }
}
