//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`]: plain character windows with a fixed overlap
//! - [`RecursiveChunker`]: windows that prefer to end at paragraph, sentence,
//!   or word boundaries
//!
//! Both measure sizes in `char`s and share the same contract: chunks cover the
//! whole document in order and adjacent chunks share exactly `chunk_overlap`
//! characters, so dropping each chunk's leading overlap and concatenating
//! reproduces the original text.

use crate::document::{CHUNK_INDEX_KEY, Chunk, Document};

/// Boundaries tried by [`RecursiveChunker`], coarsest first.
const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

/// Splits a [`Document`] into unembedded [`Chunk`]s.
pub trait Chunker: Send + Sync {
    /// Empty text yields no chunks. Embeddings are left empty for the
    /// pipeline to fill.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Cuts every `chunk_size` characters regardless of content.
///
/// Chunk `i` of document `d` gets the ID `d_i` and a copy of the document's
/// metadata with `chunk_index = i` added.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(500, 50);
/// let chunks = chunker.chunk(&Document::text("d", "notes.txt", text));
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// `chunk_overlap` is clamped below `chunk_size` so every window advances.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = CharText::new(&document.text);
        let spans = split_windows(&text, self.chunk_size, self.chunk_overlap, |_, _, hard_end| {
            hard_end
        });
        build_chunks(document, &text, spans)
    }
}

/// Splits text into windows that end at the coarsest natural boundary available.
///
/// Within each window the chunker looks for the last paragraph break, then line
/// break, then sentence end (`. `, `! `, `? `), then space, and cuts just after
/// it. A boundary is only accepted if it leaves the next window room to start
/// past the overlap; otherwise the window is cut at `chunk_size` characters.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 150);
/// let chunks = chunker.chunk(&Document::text("d", "notes.txt", text));
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// `chunk_overlap` is clamped below `chunk_size` so every window advances.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = CharText::new(&document.text);
        let overlap = self.chunk_overlap;
        let spans = split_windows(&text, self.chunk_size, overlap, |text, start, hard_end| {
            // The cut must land strictly after `start + overlap` so the next
            // window starts past this one.
            let earliest = start + overlap + 1;
            if earliest >= hard_end {
                return hard_end;
            }
            let window = text.slice(earliest, hard_end);
            for separator in SEPARATORS {
                if let Some(pos) = window.rfind(separator) {
                    let cut_byte = text.byte_offset(earliest) + pos + separator.len();
                    if let Some(cut) = text.char_index(cut_byte) {
                        return cut;
                    }
                }
            }
            hard_end
        });
        build_chunks(document, &text, spans)
    }
}

/// Text with precomputed `char` boundaries for O(1) char-indexed slicing.
struct CharText<'a> {
    text: &'a str,
    /// Byte offset of every char, followed by `text.len()`.
    offsets: Vec<usize>,
}

impl<'a> CharText<'a> {
    fn new(text: &'a str) -> Self {
        let offsets =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        Self { text, offsets }
    }

    fn char_len(&self) -> usize {
        self.offsets.len() - 1
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.offsets[char_index]
    }

    fn char_index(&self, byte_offset: usize) -> Option<usize> {
        self.offsets.binary_search(&byte_offset).ok()
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.offsets[start]..self.offsets[end]]
    }
}

/// Produce `(start, end)` char spans. `choose_end` receives the window start and
/// the hard limit `start + chunk_size` (clamped to the text) and returns the cut
/// point, which must lie in `(start + overlap, hard_end]`.
fn split_windows<F>(
    text: &CharText<'_>,
    chunk_size: usize,
    chunk_overlap: usize,
    choose_end: F,
) -> Vec<(usize, usize)>
where
    F: Fn(&CharText<'_>, usize, usize) -> usize,
{
    let len = text.char_len();
    let mut spans = Vec::new();
    if len == 0 {
        return spans;
    }

    let mut start = 0;
    loop {
        let hard_end = (start + chunk_size).min(len);
        let end = if hard_end == len { len } else { choose_end(text, start, hard_end) };
        spans.push((start, end));
        if end == len {
            break;
        }
        start = end - chunk_overlap;
    }
    spans
}

fn build_chunks(document: &Document, text: &CharText<'_>, spans: Vec<(usize, usize)>) -> Vec<Chunk> {
    spans
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| {
            let mut metadata = document.metadata.clone();
            metadata.insert(CHUNK_INDEX_KEY.to_string(), i.to_string());
            Chunk {
                id: format!("{}_{i}", document.id),
                text: text.slice(start, end).to_string(),
                start,
                embedding: Vec::new(),
                metadata,
                document_id: document.id.clone(),
            }
        })
        .collect()
}

/// Rebuild the document text from its chunks by dropping each chunk's overlap
/// with its predecessor.
pub fn reassemble(chunks: &[Chunk]) -> String {
    let mut text = String::new();
    let mut covered = 0usize;
    for chunk in chunks {
        let skip = covered.saturating_sub(chunk.start);
        text.extend(chunk.text.chars().skip(skip));
        covered = chunk.start + chunk.char_len();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::text("doc", "doc.txt", text)
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        assert!(FixedSizeChunker::new(10, 2).chunk(&doc("")).is_empty());
        assert!(RecursiveChunker::new(10, 2).chunk(&doc("")).is_empty());
    }

    #[test]
    fn short_document_yields_one_chunk() {
        let chunks = RecursiveChunker::new(100, 20).chunk(&doc("The sky is blue."));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "The sky is blue.");
        assert_eq!(chunks[0].id, "doc_0");
        assert_eq!(chunks[0].metadata.get(CHUNK_INDEX_KEY).map(String::as_str), Some("0"));
        assert_eq!(chunks[0].metadata.get("source").map(String::as_str), Some("doc.txt"));
    }

    #[test]
    fn fixed_windows_overlap_exactly() {
        let chunks = FixedSizeChunker::new(4, 1).chunk(&doc("abcdefghij"));
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["abcd", "defg", "ghij"]);
        assert_eq!(chunks.iter().map(|c| c.start).collect::<Vec<_>>(), [0, 3, 6]);
    }

    #[test]
    fn multibyte_text_is_never_split_inside_a_char() {
        let chunks = FixedSizeChunker::new(3, 1).chunk(&doc("héllo wörld ✓"));
        assert!(chunks.iter().all(|c| c.char_len() <= 3));
        assert_eq!(reassemble(&chunks), "héllo wörld ✓");
    }

    #[test]
    fn recursive_prefers_sentence_boundaries() {
        let text = "The sky is blue. Grass is green. Snow is white.";
        let chunks = RecursiveChunker::new(20, 0).chunk(&doc(text));
        assert_eq!(chunks[0].text, "The sky is blue. ");
        assert_eq!(reassemble(&chunks), text);
    }

    #[test]
    fn recursive_falls_back_to_hard_cut_without_separators() {
        let text = "a".repeat(25);
        let chunks = RecursiveChunker::new(10, 3).chunk(&doc(&text));
        assert_eq!(chunks[0].char_len(), 10);
        assert_eq!(chunks[1].start, 7);
        assert_eq!(reassemble(&chunks), text);
    }

    #[test]
    fn overlap_is_clamped_below_chunk_size() {
        let chunks = FixedSizeChunker::new(3, 10).chunk(&doc("abcdefg"));
        assert_eq!(reassemble(&chunks), "abcdefg");
    }
}
