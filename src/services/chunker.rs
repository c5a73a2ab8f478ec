//! Paragraph chunking for ingestion.

/// Chunks shorter than this many characters are discarded.
pub const MIN_CHUNK_CHARS: usize = 50;

const PARAGRAPH_BREAK: &str = "\n\n";

/// Splits raw text on blank-line boundaries and drops fragments too short to
/// carry meaning (page numbers, headers, stray captions).
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    min_chars: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            min_chars: MIN_CHUNK_CHARS,
        }
    }
}

impl TextChunker {
    /// Number of candidate spans before filtering.
    pub fn candidates(&self, text: &str) -> usize {
        if text.is_empty() {
            0
        } else {
            text.split(PARAGRAPH_BREAK).count()
        }
    }

    pub fn chunk<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.is_empty() {
            return Vec::new();
        }

        text.split(PARAGRAPH_BREAK)
            .filter(|span| span.chars().count() >= self.min_chars)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_spans_are_dropped() {
        let chunker = TextChunker::default();
        let text = "Too short.\n\nAlso short.";
        assert!(chunker.chunk(text).is_empty());
        assert_eq!(chunker.candidates(text), 2);
    }

    #[test]
    fn test_paragraphs_kept_verbatim() {
        let chunker = TextChunker::default();
        let long_a = "Mitochondria are the membrane-bound organelles that produce ATP.";
        let long_b = "Chloroplasts capture light energy and convert it to chemical energy.";
        let text = format!("{}\n\nPage 2\n\n{}", long_a, long_b);

        assert_eq!(chunker.chunk(&text), vec![long_a, long_b]);
        assert_eq!(chunker.candidates(&text), 3);
    }

    #[test]
    fn test_boundary_length() {
        let chunker = TextChunker::default();
        let exactly = "a".repeat(MIN_CHUNK_CHARS);
        let under = "b".repeat(MIN_CHUNK_CHARS - 1);
        let text = format!("{}\n\n{}", exactly, under);
        assert_eq!(chunker.chunk(&text), vec![exactly.as_str()]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let chunker = TextChunker::default();
        // 49 two-byte characters
        let text = "é".repeat(MIN_CHUNK_CHARS - 1);
        assert!(chunker.chunk(&text).is_empty());
    }

    #[test]
    fn test_empty_text() {
        let chunker = TextChunker::default();
        assert!(chunker.chunk("").is_empty());
        assert_eq!(chunker.candidates(""), 0);
    }
}
