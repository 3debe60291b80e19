//! Recursive boundary-aware text splitting.

use std::collections::VecDeque;

/// Separators tried in order, coarsest first. Text that none of them break
/// up gets a hard character cut.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Splits text into overlapping chunks, preferring paragraph boundaries,
/// then line boundaries, then word boundaries, then hard character cuts.
///
/// The overlap carries trailing context from one chunk into the next so
/// semantic context is not severed at chunk edges. Splitting is
/// deterministic; non-empty input always yields at least one chunk.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Creates a splitter with the given target chunk size and overlap, both
    /// in characters. The overlap is clamped below the chunk size.
    #[must_use]
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    /// Splits text into chunks. Whitespace-only input yields no chunks.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        self.split_with(trimmed, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let Some((sep, rest)) = separators.split_first() else {
            return self.hard_cut(text);
        };

        if !text.contains(sep) {
            return self.split_with(text, rest);
        }

        let mut pieces = Vec::new();
        for part in text.split(sep) {
            if part.is_empty() {
                continue;
            }
            if char_len(part) > self.chunk_size {
                pieces.extend(self.split_with(part, rest));
            } else {
                pieces.push(part.to_string());
            }
        }

        self.merge(pieces, sep)
    }

    /// Merges bounded pieces back into chunks up to the target size, keeping
    /// a tail of pieces within the overlap budget as the seed of the next
    /// chunk.
    fn merge(&self, pieces: Vec<String>, sep: &str) -> Vec<String> {
        let sep_len = char_len(sep);
        let mut chunks = Vec::new();
        let mut window: VecDeque<String> = VecDeque::new();

        let window_len = |w: &VecDeque<String>| -> usize {
            let content: usize = w.iter().map(|p| char_len(p)).sum();
            content + sep_len * w.len().saturating_sub(1)
        };

        for piece in pieces {
            let piece_len = char_len(&piece);
            if !window.is_empty() && window_len(&window) + sep_len + piece_len > self.chunk_size {
                chunks.push(join(&window, sep));
                // Trim the tail to the overlap budget, and further still
                // until the incoming piece fits within the chunk target.
                while !window.is_empty()
                    && (window_len(&window) > self.chunk_overlap
                        || window_len(&window) + sep_len + piece_len > self.chunk_size)
                {
                    window.pop_front();
                }
            }
            window.push_back(piece);
        }

        if !window.is_empty() {
            let last = join(&window, sep);
            // The overlap tail alone may duplicate the previous chunk's end.
            if chunks.last().map_or(true, |prev| !prev.ends_with(&last)) {
                chunks.push(last);
            }
        }

        chunks
    }

    fn hard_cut(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = (self.chunk_size - self.chunk_overlap).max(1);
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join(window: &VecDeque<String>, sep: &str) -> String {
    window.iter().cloned().collect::<Vec<_>>().join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_text_is_one_chunk() {
        let splitter = TextSplitter::new(100, 20);
        assert_eq!(splitter.split("small"), vec!["small".to_string()]);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let splitter = TextSplitter::default();
        assert!(splitter.split("   \n\n  ").is_empty());
    }

    #[test]
    fn test_paragraph_boundaries_preferred() {
        let splitter = TextSplitter::new(20, 0);
        let text = "first paragraph\n\nsecond paragraph\n\nthird one";
        let chunks = splitter.split(text);

        assert!(chunks.contains(&"first paragraph".to_string()));
        assert!(chunks.iter().all(|c| c.chars().count() <= 20));
    }

    #[test]
    fn test_overlap_carries_context() {
        let splitter = TextSplitter::new(20, 10);
        let text = "aaa bbb ccc ddd eee fff ggg hhh";
        let chunks = splitter.split(text);

        assert!(chunks.len() >= 2);
        // Each chunk after the first starts with words seen at the end of
        // the previous chunk.
        for pair in chunks.windows(2) {
            let first_word = pair[1].split_whitespace().next().unwrap();
            assert!(pair[0].contains(first_word));
        }
    }

    #[test]
    fn test_chunks_stay_within_size_when_overlap_is_carried() {
        // A large piece arriving after a retained overlap tail must not
        // stretch the emitted chunk past the target size.
        let splitter = TextSplitter::new(20, 10);
        let chunks = splitter.split("ccccc ddddd eeeeeeeeeeeeeee fff");

        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20, "oversized chunk: {chunk:?}");
        }
    }

    #[test]
    fn test_hard_cut_for_unbroken_text() {
        let splitter = TextSplitter::new(10, 2);
        let text = "x".repeat(35);
        let chunks = splitter.split(&text);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        let total: usize = chunks.iter().map(String::len).sum();
        assert!(total >= 35);
    }

    #[test]
    fn test_deterministic() {
        let splitter = TextSplitter::new(50, 10);
        let text = "one two three\nfour five six\n\nseven eight nine ten eleven twelve";
        assert_eq!(splitter.split(text), splitter.split(text));
    }

    #[test]
    fn test_overlap_clamped_below_chunk_size() {
        // Would loop forever if overlap >= chunk size were allowed.
        let splitter = TextSplitter::new(5, 50);
        let chunks = splitter.split(&"y".repeat(30));
        assert!(chunks.len() > 1);
    }

    #[test]
    fn test_long_word_falls_through_to_hard_cut() {
        let splitter = TextSplitter::new(10, 0);
        let text = format!("short {}", "z".repeat(40));
        let chunks = splitter.split(&text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }
}
