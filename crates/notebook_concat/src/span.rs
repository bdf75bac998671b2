//! The span model. Pure data: a `Span` is a contiguous substring of the
//! concat document owned by a single cell, and a `SpanList` is the ordered
//! sequence of them the mutation engine maintains.

use crate::cell::CellId;

/// A contiguous substring of the concat document, tagged real or synthetic,
/// with both concat and real offset ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub cell_id: CellId,
    pub fragment: i64,
    pub is_real: bool,
    pub concat_start: usize,
    pub concat_end: usize,
    pub real_start: usize,
    pub real_end: usize,
    pub text: String,
    pub real_text: String,
}

impl Span {
    pub fn concat_len(&self) -> usize {
        self.concat_end - self.concat_start
    }

    pub fn real_len(&self) -> usize {
        self.real_end - self.real_start
    }

    pub fn contains_concat_offset(&self, offset: usize) -> bool {
        self.concat_start <= offset && offset < self.concat_end
    }

    /// Synthetic spans and empty trailing real spans have a zero-length
    /// concat range only at end-of-document; this is the inclusive variant
    /// used when resolving an offset that sits exactly at the document end.
    pub fn contains_concat_offset_inclusive(&self, offset: usize) -> bool {
        self.concat_start <= offset && offset <= self.concat_end
    }

    pub fn contains_real_offset(&self, offset: usize) -> bool {
        self.is_real && self.real_start <= offset && offset < self.real_end
    }
}

/// The ordered span list. Contiguity, ordering, and per-cell run invariants
/// hold after every mutation completes; `SpanList` itself never validates
/// them (the mutation engine is responsible for upholding them), it only
/// exposes iteration and lookup.
#[derive(Debug, Clone, Default)]
pub struct SpanList {
    spans: Vec<Span>,
}

impl SpanList {
    pub fn new() -> Self {
        Self { spans: Vec::new() }
    }

    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }

    pub fn as_mut_slice(&mut self) -> &mut [Span] {
        &mut self.spans
    }

    pub fn iter(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn insert_many(&mut self, index: usize, new_spans: Vec<Span>) {
        self.spans.splice(index..index, new_spans);
    }

    pub fn splice_range(&mut self, range: std::ops::Range<usize>, new_spans: Vec<Span>) {
        self.spans.splice(range, new_spans);
    }

    pub fn remove_range(&mut self, range: std::ops::Range<usize>) -> Vec<Span> {
        self.spans.splice(range, std::iter::empty()).collect()
    }

    /// First index whose span's `fragment` is strictly greater than `fragment`,
    /// restricted to non-interactive-input runs. Returns `None` when
    /// `fragment` should be appended (including when there's no run with a
    /// larger fragment).
    pub fn insertion_index_for_fragment(&self, fragment: i64) -> Option<usize> {
        self.spans
            .iter()
            .position(|span| span.fragment > fragment && span.fragment != -1)
    }

    /// Index one past the last span belonging to a non-interactive cell,
    /// i.e. the index that excludes any trailing interactive-input run.
    pub fn end_excluding_interactive_run(&self) -> usize {
        self.spans
            .iter()
            .position(|span| span.fragment == -1)
            .unwrap_or(self.spans.len())
    }

    pub fn find_index_first(&self, cell_id: &CellId) -> Option<usize> {
        self.spans.iter().position(|s| &s.cell_id == cell_id)
    }

    pub fn find_index_last(&self, cell_id: &CellId) -> Option<usize> {
        self.spans.iter().rposition(|s| &s.cell_id == cell_id)
    }

    /// The half-open index range `[first, last)` of spans owned by `cell_id`.
    /// All spans owned by the same cell occupy a single contiguous run of
    /// indexes.
    pub fn cell_run(&self, cell_id: &CellId) -> Option<std::ops::Range<usize>> {
        let first = self.find_index_first(cell_id)?;
        let last = self.find_index_last(cell_id)?;
        Some(first..last + 1)
    }

    pub fn spans_for_cell(&self, cell_id: &CellId) -> &[Span] {
        match self.cell_run(cell_id) {
            Some(range) => &self.spans[range],
            None => &[],
        }
    }

    pub fn has_cell(&self, cell_id: &CellId) -> bool {
        self.spans.iter().any(|s| &s.cell_id == cell_id)
    }

    /// Cell ids in encounter order, each listed once.
    pub fn cells_in_order(&self) -> Vec<CellId> {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut out = Vec::new();
        for span in &self.spans {
            if seen.insert(span.cell_id.clone()) {
                out.push(span.cell_id.clone());
            }
        }
        out
    }

    pub fn full_concat_text(&self) -> String {
        let mut out = String::with_capacity(self.spans.iter().map(|s| s.text.len()).sum());
        for span in &self.spans {
            out.push_str(&span.text);
        }
        out
    }

    pub fn full_real_text(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            out.push_str(&span.real_text);
        }
        out
    }

    /// Shift every span's concat offsets (from `from_index` onward) by `delta`.
    pub fn shift_concat_from(&mut self, from_index: usize, delta: isize) {
        for span in &mut self.spans[from_index..] {
            span.concat_start = apply_delta(span.concat_start, delta);
            span.concat_end = apply_delta(span.concat_end, delta);
        }
    }

    /// Shift every span's real offsets (from `from_index` onward) by `delta`.
    pub fn shift_real_from(&mut self, from_index: usize, delta: isize) {
        for span in &mut self.spans[from_index..] {
            span.real_start = apply_delta(span.real_start, delta);
            span.real_end = apply_delta(span.real_end, delta);
        }
    }
}

fn apply_delta(value: usize, delta: isize) -> usize {
    if delta >= 0 {
        value + delta as usize
    } else {
        value - (-delta) as usize
    }
}
