//! Deterministic document chunking.
//!
//! Text is split into sentence-like units on terminal punctuation and line
//! breaks, then units accumulate into chunks of at most `max_len` bytes.
//! When a chunk closes, the trailing units covering at most `overlap` bytes
//! seed the next chunk so retrieval never loses context at a boundary.
//!
//! Units contiguously cover the source text, so concatenating chunk spans
//! (skipping the overlapped prefix of each chunk) reconstructs the document
//! byte for byte. The same input with the same configuration always
//! produces identical chunks, which makes re-indexing idempotent.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

use recall_core::error::{EngineError, Result};
use recall_core::types::Chunk;

/// A sentence-like unit with its byte span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Unit {
    start: usize,
    end: usize,
    /// Section heading in effect when this unit starts, if any.
    section: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Chunker {
    max_len: usize,
    overlap: usize,
}

impl Chunker {
    /// Rejects `max_len == 0` and `overlap >= max_len` up front: an overlap
    /// as large as the chunk would make the accumulator re-emit the same
    /// window forever.
    pub fn new(max_len: usize, overlap: usize) -> Result<Self> {
        if max_len == 0 {
            return Err(EngineError::InvalidInput("chunker max_len must be positive".to_string()));
        }
        if overlap >= max_len {
            return Err(EngineError::InvalidInput(format!(
                "chunker overlap ({}) must be smaller than max_len ({})",
                overlap, max_len
            )));
        }
        Ok(Self { max_len, overlap })
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Lazily chunk `text`. The iterator is finite and restartable:
    /// calling `chunk` again over the same input yields identical output.
    pub fn chunk<'a>(&self, document_id: &str, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            units: split_units(text),
            pos: 0,
            document_id: document_id.to_string(),
            chunk_index: 0,
            max_len: self.max_len,
            overlap: self.overlap,
        }
    }

    /// Eager convenience wrapper around [`Chunker::chunk`].
    pub fn chunk_vec(&self, document_id: &str, text: &str) -> Vec<Chunk> {
        self.chunk(document_id, text).collect()
    }
}

/// Iterator producing chunks from a pre-split unit list.
pub struct Chunks<'a> {
    text: &'a str,
    units: Vec<Unit>,
    pos: usize,
    document_id: String,
    chunk_index: usize,
    max_len: usize,
    overlap: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.pos >= self.units.len() {
            return None;
        }

        let first = self.pos;
        let mut last = first;
        let start = self.units[first].start;

        // Accumulate units while the span stays within max_len. A single
        // unit longer than max_len becomes its own oversized chunk: text is
        // never dropped or hard-truncated, callers see the full span.
        while last + 1 < self.units.len() {
            let candidate_end = self.units[last + 1].end;
            if candidate_end - start > self.max_len {
                break;
            }
            last += 1;
        }

        let end = self.units[last].end;
        let chunk = Chunk {
            id: Chunk::id_for(&self.document_id, self.chunk_index),
            document_id: self.document_id.clone(),
            chunk_index: self.chunk_index,
            text: self.text[start..end].to_string(),
            start_offset: start,
            end_offset: end,
            section_hint: self.units[first].section.clone(),
        };
        self.chunk_index += 1;

        // Seed the next chunk with the trailing units covering at most
        // `overlap` bytes of the chunk we just closed. The seed never
        // reaches back to `first`, so every step makes progress.
        let mut next = last + 1;
        if next < self.units.len() && self.overlap > 0 {
            let mut seed = last + 1;
            let mut candidate = last;
            while candidate > first && end - self.units[candidate].start <= self.overlap {
                seed = candidate;
                candidate -= 1;
            }
            if seed <= last {
                next = seed;
            }
        }
        self.pos = next;

        Some(chunk)
    }
}

/// Split text into sentence-like units, tracking byte offsets and the
/// markdown-style heading in effect for each unit.
///
/// A unit ends after terminal punctuation (`.`, `!`, `?`) once the
/// following whitespace run finishes, or after a line break. Whitespace-only
/// spans merge into the preceding unit, so units contiguously cover the
/// whole input. Heading lines (leading `#`) set the section hint for
/// themselves and for what follows.
fn split_units(text: &str) -> Vec<Unit> {
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut start = 0_usize;
    let mut terminal_seen = false;
    let mut in_break = false;

    for (i, ch) in text.char_indices() {
        if in_break && !ch.is_whitespace() {
            spans.push((start, i));
            start = i;
            in_break = false;
            terminal_seen = false;
        }
        if ch == '\n' {
            in_break = true;
        } else if ch.is_whitespace() {
            if terminal_seen {
                in_break = true;
            }
        } else {
            terminal_seen = matches!(ch, '.' | '!' | '?');
        }
    }
    if start < text.len() {
        spans.push((start, text.len()));
    }

    // Merge whitespace-only spans into their predecessor to keep coverage
    // contiguous.
    let mut merged: Vec<(usize, usize)> = Vec::new();
    for (s, e) in spans {
        if text[s..e].trim().is_empty() {
            if let Some(prev) = merged.last_mut() {
                prev.1 = e;
                continue;
            }
        }
        merged.push((s, e));
    }

    let mut units = Vec::with_capacity(merged.len());
    let mut section: Option<String> = None;
    for (s, e) in merged {
        let trimmed = text[s..e].trim();
        if let Some(heading) = trimmed.strip_prefix('#') {
            section = Some(heading.trim_start_matches('#').trim().to_string());
        }
        units.push(Unit { start: s, end: e, section: section.clone() });
    }
    units
}
