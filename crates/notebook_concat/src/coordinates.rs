//! The coordinate mapper. Bidirectional translation
//! between concat and real/cell-local coordinates, built on top of the span
//! list and the two line indexes. Read-only: borrows the state the
//! mutation engine owns.

use crate::cell::CellId;
use crate::line_index::LineIndex;
use crate::position::Position;
use crate::span::SpanList;

pub struct CoordinateMapper<'a> {
    pub spans: &'a SpanList,
    pub concat_lines: &'a LineIndex,
    pub real_lines: &'a LineIndex,
}

impl<'a> CoordinateMapper<'a> {
    pub fn new(spans: &'a SpanList, concat_lines: &'a LineIndex, real_lines: &'a LineIndex) -> Self {
        Self {
            spans,
            concat_lines,
            real_lines,
        }
    }

    /// `real_to_concat`: locates the real span containing `real_offset`.
    /// Falls back to the identity mapping if no real span contains it.
    pub fn real_to_concat(&self, real_offset: usize) -> usize {
        for span in self.spans.iter() {
            if span.contains_real_offset(real_offset) {
                return real_offset - span.real_start + span.concat_start;
            }
        }
        real_offset
    }

    /// `concat_to_closest_real`: locates the span (real or synthetic)
    /// containing `concat_offset`. A synthetic span collapses to its
    /// `real_start` anchor. Falls back to the identity mapping if no span
    /// contains it.
    pub fn concat_to_closest_real(&self, concat_offset: usize) -> usize {
        for span in self.spans.iter() {
            if span.contains_concat_offset(concat_offset) {
                return if span.is_real {
                    concat_offset - span.concat_start + span.real_start
                } else {
                    span.real_start
                };
            }
        }
        // End-of-document: fall back to the last span, inclusive of its end.
        if let Some(last) = self.spans.iter().last() {
            if last.contains_concat_offset_inclusive(concat_offset) {
                return if last.is_real {
                    concat_offset - last.concat_start + last.real_start
                } else {
                    last.real_start
                };
            }
        }
        concat_offset
    }

    /// `concat_position`: resolves the cell's first real line, indexes into
    /// `real_lines`, computes the absolute real offset, maps to concat, and
    /// looks up the concat line containing it. Returns `(0,0)` if the cell
    /// has no real content.
    pub fn concat_position(&self, cell_id: &CellId, cell_position: Position) -> Position {
        let Some(concat_offset) = self.concat_offset_checked(cell_id, cell_position) else {
            return Position::default();
        };
        let Some(concat_line) = self.concat_lines.line_at_offset(concat_offset) else {
            return Position::default();
        };
        Position::new(
            concat_line.line_number as u32,
            (concat_offset - concat_line.offset) as u32,
        )
    }

    /// `concat_offset`: as [`Self::concat_position`] without the final line
    /// lookup.
    pub fn concat_offset(&self, cell_id: &CellId, cell_position: Position) -> usize {
        self.concat_offset_checked(cell_id, cell_position).unwrap_or(0)
    }

    fn concat_offset_checked(&self, cell_id: &CellId, cell_position: Position) -> Option<usize> {
        let first_real_line = self.real_lines.first_line_of_cell(cell_id)?;
        let real_line_number = first_real_line.line_number + cell_position.line as usize;
        let real_line = self.real_lines.line_at_number(real_line_number)?;
        let real_offset = real_line.offset + cell_position.character as usize;
        Some(self.real_to_concat(real_offset))
    }

    /// `notebook_offset`: the cell-local real offset corresponding to a
    /// concat offset.
    pub fn notebook_offset(&self, cell_id: &CellId, concat_offset: usize) -> usize {
        let Some(first_span) = self.spans.spans_for_cell(cell_id).first() else {
            return 0;
        };
        self.concat_to_closest_real(concat_offset)
            .saturating_sub(first_span.real_start)
    }

    /// The `notebook_position` projection: concat position -> cell-local
    /// real position, used internally by [`Self::notebook_location`].
    pub fn notebook_position(&self, concat_position: Position) -> Option<(CellId, Position)> {
        let concat_line = self.concat_lines.line_at_number(concat_position.line as usize)?;
        let concat_offset = concat_line.offset + concat_position.character as usize;
        let real_offset = self.concat_to_closest_real(concat_offset);
        let real_line = self.real_lines.line_at_offset(real_offset)?;
        let first_real_line = self.real_lines.first_line_of_cell(&real_line.cell_id)?;
        let character = real_offset.saturating_sub(real_line.offset) as u32;
        let line = (real_line.line_number - first_real_line.line_number) as u32;
        Some((real_line.cell_id.clone(), Position::new(line, character)))
    }

    /// `notebook_location`: maps a concat range back to a cell id and a
    /// cell-local range. Snaps the start offset up to the first overlapping
    /// real span's start. Returns `(None, range)` unchanged if no real span
    /// overlaps (the range sits entirely in synthetic territory).
    pub fn notebook_location(
        &self,
        concat_range: crate::position::Range,
    ) -> (Option<CellId>, crate::position::Range) {
        let Some(start_line) = self.concat_lines.line_at_number(concat_range.start.line as usize) else {
            return (None, concat_range);
        };
        let range_start_offset = start_line.offset + concat_range.start.character as usize;
        let range_end_offset = self
            .concat_lines
            .line_at_number(concat_range.end.line as usize)
            .map_or(range_start_offset, |end_line| {
                end_line.offset + concat_range.end.character as usize
            });

        let query_end = range_end_offset.max(range_start_offset + 1);
        let overlap = self
            .spans
            .iter()
            .find(|span| span.is_real && span.concat_start < query_end && span.concat_end > range_start_offset);

        let Some(overlap) = overlap else {
            return (None, concat_range);
        };

        let snapped_start = range_start_offset.max(overlap.concat_start);
        let Some(start_line_idx) = self.concat_lines.line_at_offset(snapped_start) else {
            return (None, concat_range);
        };
        let start_position = Position::new(
            start_line_idx.line_number as u32,
            (snapped_start - start_line_idx.offset) as u32,
        );

        let Some((cell_id, start)) = self.notebook_position(start_position) else {
            return (None, concat_range);
        };
        let Some((_, end)) = self.notebook_position(concat_range.end) else {
            return (None, concat_range);
        };

        (Some(cell_id), crate::position::Range::new(start, end))
    }
}
