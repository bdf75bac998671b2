//! The line index. Two parallel instances exist per document: one built
//! over concat text, one built over real text.

use crate::cell::CellId;

/// One line inside one cell, in whichever coordinate system the owning
/// [`LineIndex`] represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub cell_id: CellId,
    /// 0-based, increasing across the whole index.
    pub line_number: usize,
    /// Offset of this line's first character.
    pub offset: usize,
    /// Raw line text, terminator stripped.
    pub text: String,
    /// Offset one past this line's terminator (or, for the final piece of a
    /// cell, the same as `end_offset()` since there is no terminator to
    /// include). This is what the next line's `offset` is derived from.
    pub line_break_inclusive_end: usize,
}

impl Line {
    pub fn end_offset(&self) -> usize {
        self.offset + self.text.len()
    }

    pub fn contains_offset(&self, offset: usize) -> bool {
        self.offset <= offset && offset < self.line_break_inclusive_end
    }
}

/// A flat, globally-numbered array of [`Line`]s built from an ordered
/// sequence of cells.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    lines: Vec<Line>,
}

impl LineIndex {
    /// Builds a line index by splitting each cell's string on `\n` in turn.
    /// `cells` gives the cell order and the string to index for each
    /// (concat text or real text, depending on which index is being built).
    pub fn build<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = (&'a CellId, &'a str)>,
    {
        let mut lines = Vec::new();
        let mut offset = 0usize;
        let mut line_number = 0usize;

        for (cell_id, text) in cells {
            let pieces: Vec<&str> = text.split('\n').collect();
            let piece_count = pieces.len();
            for (i, piece) in pieces.into_iter().enumerate() {
                let has_terminator = i + 1 < piece_count;
                let end_offset = offset + piece.len();
                let line_break_inclusive_end = if has_terminator { end_offset + 1 } else { end_offset };
                lines.push(Line {
                    cell_id: cell_id.clone(),
                    line_number,
                    offset,
                    text: piece.to_owned(),
                    line_break_inclusive_end,
                });
                offset = line_break_inclusive_end;
                line_number += 1;
            }
        }

        Self { lines }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_at_number(&self, line_number: usize) -> Option<&Line> {
        self.lines.get(line_number)
    }

    /// Binary search for the line containing `offset`. Offsets at or past
    /// end-of-document resolve to the last line: the final (possibly empty)
    /// piece of each cell is retained precisely so that end-of-document
    /// cursor positions resolve.
    pub fn line_at_offset(&self, offset: usize) -> Option<&Line> {
        if self.lines.is_empty() {
            return None;
        }
        match self
            .lines
            .binary_search_by(|line| {
                if offset < line.offset {
                    std::cmp::Ordering::Greater
                } else if offset >= line.line_break_inclusive_end {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            }) {
            Ok(index) => Some(&self.lines[index]),
            Err(_) => self.lines.last(),
        }
    }

    pub fn first_line_of_cell(&self, cell_id: &CellId) -> Option<&Line> {
        self.lines.iter().find(|l| &l.cell_id == cell_id)
    }

    pub fn last_line_of_cell(&self, cell_id: &CellId) -> Option<&Line> {
        self.lines.iter().rev().find(|l| &l.cell_id == cell_id)
    }
}
