//! The mutation engine and document facade, combined into one `Document`
//! type the way `red_knot_server`'s `NotebookDocument` owns both the cell
//! list and its query surface.

use regex::Regex;

use crate::builder::{self, normalize_text, strip_cr};
use crate::cell::CellId;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::events::{ContentChange, OutboundContentChange, OutboundEvent, RefreshCell};
use crate::identity;
use crate::line_index::{Line, LineIndex};
use crate::position::{Position, Range};
use crate::span::{Span, SpanList};

fn position_for_offset(lines: &LineIndex, offset: usize) -> Position {
    match lines.line_at_offset(offset) {
        Some(line) => Position::new(line.line_number as u32, (offset - line.offset) as u32),
        None => Position::default(),
    }
}

/// The engine's full state: the span list, both line indexes, the version
/// counter, the closed flag, and the sticky identity.
pub struct Document {
    config: EngineConfig,
    spans: SpanList,
    concat_lines: LineIndex,
    real_lines: LineIndex,
    version: i64,
    closed: bool,
    concat_uri: Option<url::Url>,
    notebook_uri: Option<url::Url>,
}

impl Document {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            spans: SpanList::new(),
            concat_lines: LineIndex::default(),
            real_lines: LineIndex::default(),
            version: 0,
            closed: false,
            concat_uri: None,
            notebook_uri: None,
        }
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn concat_uri(&self) -> Option<&url::Url> {
        self.concat_uri.as_ref()
    }

    pub fn notebook_uri(&self) -> Option<&url::Url> {
        self.notebook_uri.as_ref()
    }

    fn rebuild_line_indexes(&mut self) {
        let cells = self.spans.cells_in_order();
        let concat_texts: Vec<(CellId, String)> = cells
            .iter()
            .map(|c| {
                let text = self
                    .spans
                    .spans_for_cell(c)
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect();
                (c.clone(), text)
            })
            .collect();
        let real_texts: Vec<(CellId, String)> = cells
            .iter()
            .map(|c| {
                let text = self
                    .spans
                    .spans_for_cell(c)
                    .iter()
                    .map(|s| s.real_text.as_str())
                    .collect();
                (c.clone(), text)
            })
            .collect();

        self.concat_lines = LineIndex::build(concat_texts.iter().map(|(c, t)| (c, t.as_str())));
        self.real_lines = LineIndex::build(real_texts.iter().map(|(c, t)| (c, t.as_str())));
    }

    fn ensure_identity(&mut self, first_cell: &CellId) {
        if self.concat_uri.is_none() {
            self.concat_uri = Some(identity::derive_concat_uri(first_cell));
            self.notebook_uri = Some(identity::derive_notebook_uri(
                first_cell,
                &self.config.interactive_scheme,
            ));
        }
    }

    /// Inserts one cell's spans at the position dictated by `force_append`
    /// and the cell's fragment, shifting subsequent spans, and rebuilding
    /// the line indexes. Returns the pre-insertion concat/real offsets and
    /// the spans that were inserted, so the caller can build an outbound
    /// event (or, during a Refresh, suppress it).
    fn insert_cell(
        &mut self,
        cell_id: &CellId,
        text: &str,
        force_append: bool,
        per_cell_header: Option<&str>,
    ) -> (usize, Vec<Span>) {
        let fragment = cell_id.fragment(&self.config.interactive_scheme);
        let text = normalize_text(text);

        let insertion_index = if force_append || fragment == -1 {
            self.spans.len()
        } else {
            self.spans
                .insertion_index_for_fragment(fragment)
                .unwrap_or_else(|| self.spans.end_excluding_interactive_run())
        };

        let (concat_offset, real_offset) = if insertion_index < self.spans.len() {
            let successor = &self.spans.as_slice()[insertion_index];
            (successor.concat_start, successor.real_start)
        } else {
            let last = self.spans.as_slice().last();
            (
                last.map_or(0, |s| s.concat_end),
                last.map_or(0, |s| s.real_end),
            )
        };

        let prepend_header = concat_offset == 0 && fragment != -1;
        let new_spans = builder::build_cell_spans(
            cell_id,
            fragment,
            &text,
            concat_offset,
            real_offset,
            prepend_header,
            per_cell_header,
            self.config.suppress_type_errors,
        );

        let new_concat_len: usize = new_spans.iter().map(Span::concat_len).sum();
        let new_real_len: usize = new_spans.iter().map(Span::real_len).sum();

        self.spans.shift_concat_from(insertion_index, new_concat_len as isize);
        self.spans.shift_real_from(insertion_index, new_real_len as isize);
        self.spans.insert_many(insertion_index, new_spans.clone());

        self.rebuild_line_indexes();

        (concat_offset, new_spans)
    }

    /// Opens a new cell, inserting its spans at the position its fragment
    /// dictates and emitting an insertion event.
    pub fn open(
        &mut self,
        cell_id: CellId,
        version: i64,
        text: &str,
        force_append: bool,
        per_cell_header: Option<&str>,
    ) -> Option<OutboundEvent> {
        if self.spans.has_cell(&cell_id) {
            tracing::debug!(%cell_id, "ignoring open of an already-open cell");
            return None;
        }

        self.version = (self.version + 1).max(version);
        self.closed = false;
        self.ensure_identity(&cell_id);

        let (concat_offset, new_spans) = self.insert_cell(&cell_id, text, force_append, per_cell_header);

        let position = position_for_offset(&self.concat_lines, concat_offset);
        let joined_text: String = new_spans.iter().map(|s| s.text.as_str()).collect();

        Some(OutboundEvent {
            uri: self.concat_uri.clone().expect("identity initialized above"),
            version: self.version,
            content_changes: vec![OutboundContentChange {
                range: Range::new(position, position),
                range_offset: concat_offset as u32,
                range_length: 0,
                text: joined_text,
            }],
        })
    }

    /// Closes a cell, removing its spans and shifting everything after it.
    pub fn close(&mut self, cell_id: &CellId) -> Option<OutboundEvent> {
        let Some(cell_run) = self.spans.cell_run(cell_id) else {
            tracing::debug!(%cell_id, "ignoring close of an unknown cell");
            return None;
        };

        let is_interactive_input = cell_id.scheme() == self.config.interactive_scheme;

        if self.config.interactive && !is_interactive_input {
            // Interactive mode: cells persist logically; only closing the
            // interactive input cell itself clears state.
            return None;
        }

        if self.config.interactive && is_interactive_input {
            return self.reset_and_emit_clear();
        }

        self.version += 1;

        let removed = &self.spans.as_slice()[cell_run.clone()];
        let concat_start = removed.first().map_or(0, |s| s.concat_start);
        let concat_end = removed.last().map_or(0, |s| s.concat_end);
        let removed_len = concat_end - concat_start;

        let start_pos = position_for_offset(&self.concat_lines, concat_start);
        let end_pos = position_for_offset(&self.concat_lines, concat_end);

        self.spans.remove_range(cell_run.clone());
        // Only the concat offsets of subsequent spans are shifted down here;
        // their real offsets are left untouched. This asymmetry is
        // intentional, not an oversight.
        self.spans.shift_concat_from(cell_run.start, -(removed_len as isize));

        self.rebuild_line_indexes();

        if self.spans.is_empty() {
            self.closed = true;
        }

        Some(OutboundEvent {
            uri: self.concat_uri.clone().expect("identity initialized by prior open"),
            version: self.version,
            content_changes: vec![OutboundContentChange {
                range: Range::new(start_pos, end_pos),
                range_offset: concat_start as u32,
                range_length: removed_len as u32,
                text: String::new(),
            }],
        })
    }

    fn reset_and_emit_clear(&mut self) -> Option<OutboundEvent> {
        let old_concat_len = self.spans.as_slice().last().map_or(0, |s| s.concat_end);
        let old_end = self
            .concat_lines
            .lines()
            .last()
            .map_or(Position::default(), |l| {
                Position::new(l.line_number as u32, (l.line_break_inclusive_end - l.offset) as u32)
            });

        let uri = self.concat_uri.clone();
        self.version += 1;
        self.spans = SpanList::new();
        self.concat_lines = LineIndex::default();
        self.real_lines = LineIndex::default();
        self.concat_uri = None;
        self.notebook_uri = None;
        self.closed = true;

        uri.map(|uri| OutboundEvent {
            uri,
            version: self.version,
            content_changes: vec![OutboundContentChange {
                range: Range::new(Position::default(), old_end),
                range_offset: 0,
                range_length: old_concat_len as u32,
                text: String::new(),
            }],
        })
    }

    /// Applies a batch of content changes to one already-open cell.
    pub fn edit(&mut self, cell_id: &CellId, content_changes: Vec<ContentChange>) -> Option<OutboundEvent> {
        if !self.spans.has_cell(cell_id) {
            tracing::debug!(%cell_id, "ignoring edit of an unknown cell");
            return None;
        }

        self.version += 1;
        let mut outbound = Vec::new();

        for change in content_changes {
            match self.apply_one_edit(cell_id, &change) {
                Ok(outbound_change) => outbound.push(outbound_change),
                Err(reason) => {
                    tracing::warn!(%cell_id, reason, "failed to apply a content change; skipping it");
                }
            }
        }

        if outbound.is_empty() {
            None
        } else {
            Some(OutboundEvent {
                uri: self.concat_uri.clone().expect("identity initialized by prior open"),
                version: self.version,
                content_changes: outbound,
            })
        }
    }

    fn apply_one_edit(
        &mut self,
        cell_id: &CellId,
        change: &ContentChange,
    ) -> std::result::Result<OutboundContentChange, &'static str> {
        let cell_run = self.spans.cell_run(cell_id).ok_or("unknown cell")?;
        let old_spans: Vec<Span> = self.spans.as_slice()[cell_run.clone()].to_vec();
        let old_real_text: String = old_spans.iter().map(|s| s.real_text.as_str()).collect();
        let old_concat_len: usize = old_spans.iter().map(Span::concat_len).sum();
        let old_real_len: usize = old_spans.iter().map(Span::real_len).sum();

        let range = change.effective_range();
        let local_real_lines = LineIndex::build(std::iter::once((cell_id, old_real_text.as_str())));
        let start_offset = local_real_lines
            .line_at_number(range.start.line as usize)
            .map(|l| l.offset + range.start.character as usize)
            .ok_or("edit range start is out of bounds")?;
        let end_offset = local_real_lines
            .line_at_number(range.end.line as usize)
            .map(|l| l.offset + range.end.character as usize)
            .ok_or("edit range end is out of bounds")?;

        if start_offset > end_offset || end_offset > old_real_text.len() {
            return Err("edit range is outside the cell's real text");
        }

        let replacement = strip_cr(&change.text);
        let mut spliced = String::with_capacity(old_real_text.len() + replacement.len());
        spliced.push_str(&old_real_text[..start_offset]);
        spliced.push_str(&replacement);
        spliced.push_str(&old_real_text[end_offset..]);
        let new_real_text = normalize_text(&spliced);

        let fragment = old_spans.first().map_or(0, |s| s.fragment);
        let concat_anchor = old_spans.first().map_or(0, |s| s.concat_start);
        let real_anchor = old_spans.first().map_or(0, |s| s.real_start);
        let prepend_header = concat_anchor == 0 && fragment != -1;

        let new_spans = builder::build_cell_spans(
            cell_id,
            fragment,
            &new_real_text,
            concat_anchor,
            real_anchor,
            prepend_header,
            None,
            self.config.suppress_type_errors,
        );
        let new_concat_len: usize = new_spans.iter().map(Span::concat_len).sum();
        let new_real_len: usize = new_spans.iter().map(Span::real_len).sum();

        let partial_eligible = old_spans.len() == new_spans.len()
            && old_spans
                .iter()
                .zip(new_spans.iter())
                .all(|(o, n)| o.is_real == n.is_real && (o.is_real || o.text == n.text));

        let outbound_change = if partial_eligible {
            let old_start_concat = local_real_to_concat(&old_spans, start_offset);
            let old_end_concat = local_real_to_concat(&old_spans, end_offset);
            let start_pos = position_for_offset(&self.concat_lines, old_start_concat);
            let end_pos = position_for_offset(&self.concat_lines, old_end_concat);

            OutboundContentChange {
                range: Range::new(start_pos, end_pos),
                range_offset: old_start_concat as u32,
                range_length: (old_end_concat - old_start_concat) as u32,
                text: replacement,
            }
        } else {
            let old_concat_start = old_spans.first().map_or(0, |s| s.concat_start);
            let old_concat_end = old_spans.last().map_or(0, |s| s.concat_end);
            let start_pos = position_for_offset(&self.concat_lines, old_concat_start);
            let end_pos = position_for_offset(&self.concat_lines, old_concat_end);
            let new_concat_text: String = new_spans.iter().map(|s| s.text.as_str()).collect();

            OutboundContentChange {
                range: Range::new(start_pos, end_pos),
                range_offset: old_concat_start as u32,
                range_length: (old_concat_end - old_concat_start) as u32,
                text: new_concat_text,
            }
        };

        self.spans
            .shift_concat_from(cell_run.end, new_concat_len as isize - old_concat_len as isize);
        self.spans
            .shift_real_from(cell_run.end, new_real_len as isize - old_real_len as isize);
        self.spans.splice_range(cell_run, new_spans);
        self.rebuild_line_indexes();

        Ok(outbound_change)
    }

    /// Re-seeds the whole document from an authoritative list of cells,
    /// suppressing any intermediate events and emitting a single
    /// replace-all event when the real text actually changed.
    pub fn refresh(&mut self, cells: Vec<RefreshCell>) -> Option<OutboundEvent> {
        if self.config.interactive {
            return None;
        }

        let new_real_contents = cells
            .iter()
            .map(|c| strip_cr(&c.text))
            .collect::<Vec<_>>()
            .join("\n")
            + "\n";

        if new_real_contents == self.spans.full_real_text() {
            return None;
        }

        let old_concat_len = self.spans.as_slice().last().map_or(0, |s| s.concat_end);
        let old_end = self
            .concat_lines
            .lines()
            .last()
            .map_or(Position::default(), |l| {
                Position::new(l.line_number as u32, (l.line_break_inclusive_end - l.offset) as u32)
            });

        self.version += 1;
        self.spans = SpanList::new();
        self.concat_lines = LineIndex::default();
        self.real_lines = LineIndex::default();
        self.concat_uri = None;
        self.notebook_uri = None;
        self.closed = false;

        for cell in cells {
            self.ensure_identity(&cell.cell_id);
            self.insert_cell(&cell.cell_id, &cell.text, true, None);
        }

        let new_concat_text = self.spans.full_concat_text();

        self.concat_uri.clone().map(|uri| OutboundEvent {
            uri,
            version: self.version,
            content_changes: vec![OutboundContentChange {
                range: Range::new(Position::default(), old_end),
                range_offset: 0,
                range_length: old_concat_len as u32,
                text: new_concat_text,
            }],
        })
    }

    // ---- Read-only query surface ----

    pub fn line_at(&self, line_number: usize) -> Option<&Line> {
        self.concat_lines.line_at_number(line_number)
    }

    pub fn line_count(&self) -> usize {
        self.concat_lines.len()
    }

    pub fn full_text(&self) -> String {
        self.spans.full_concat_text()
    }

    pub fn get_real_text(&self) -> String {
        self.spans.full_real_text()
    }

    /// Deliberately reproduces an odd piece of offset arithmetic: the
    /// substring length (`end_offset - start_offset`) is used as the slice's
    /// end index instead of `end_offset` itself, which only gives the
    /// correct substring when `start_offset == 0`. Guarded against an
    /// out-of-bounds slice, which the literal arithmetic can otherwise
    /// produce for ranges that don't start at offset 0.
    pub fn get_text(&self, range: Option<Range>) -> String {
        let Some(range) = range else {
            return self.full_text();
        };

        let text = self.full_text();
        let start_offset = self.concat_lines.line_at_number(range.start.line as usize).map_or(0, |l| {
            l.offset + range.start.character as usize
        });
        let end_offset = self.concat_lines.line_at_number(range.end.line as usize).map_or(0, |l| {
            l.offset + range.end.character as usize
        });
        let length = end_offset.saturating_sub(start_offset);

        if start_offset <= length && length <= text.len() {
            text[start_offset..length].to_owned()
        } else {
            String::new()
        }
    }

    pub fn concat_range_of(&self, cell_id: &CellId) -> Option<Range> {
        let run = self.spans.cell_run(cell_id)?;
        let spans = &self.spans.as_slice()[run];
        let start = spans.first()?.concat_start;
        let end = spans.last()?.concat_end;
        let start_line = self.concat_lines.line_at_offset(start)?;
        let end_line = self.concat_lines.line_at_offset(end)?;
        Some(Range::new(
            Position::new(start_line.line_number as u32, (start - start_line.offset) as u32),
            Position::new(
                end_line.line_number as u32,
                (end_line.line_break_inclusive_end - end_line.offset) as u32,
            ),
        ))
    }

    pub fn real_range_of(&self, cell_id: &CellId) -> Option<Range> {
        let spans: Vec<&Span> = self.spans.spans_for_cell(cell_id).iter().filter(|s| s.is_real).collect();
        let start = spans.first()?.concat_start;
        let end = spans.last()?.concat_end;
        let start_line = self.concat_lines.line_at_offset(start)?;
        let end_line = self.concat_lines.line_at_offset(end)?;
        Some(Range::new(
            Position::new(start_line.line_number as u32, (start - start_line.offset) as u32),
            Position::new(end_line.line_number as u32, (end - end_line.offset) as u32),
        ))
    }

    pub fn cells(&self) -> Vec<CellId> {
        self.spans.cells_in_order()
    }

    /// Delegates to an external word scanner, consumed as a pure function.
    /// Substitutes the configured default pattern if `pattern` is absent or
    /// can match the empty string, logging a warning in the latter case.
    pub fn word_range_at_position(
        &self,
        position: Position,
        pattern: Option<&Regex>,
        scan: impl Fn(&str, usize, &Regex) -> Option<(usize, usize)>,
    ) -> Range {
        let default_pattern =
            Regex::new(&self.config.default_word_pattern).expect("default word pattern is valid");

        let effective_pattern = match pattern {
            Some(p) if !p.is_match("") => p.clone(),
            Some(_) => {
                tracing::warn!("word-boundary pattern matches the empty string; substituting the default");
                default_pattern
            }
            None => default_pattern,
        };

        let Some(line) = self.concat_lines.line_at_number(position.line as usize) else {
            return Range::zero();
        };

        match scan(&line.text, position.character as usize, &effective_pattern) {
            Some((start_one_based, end_one_based)) => Range::new(
                Position::new(position.line, start_one_based.saturating_sub(1) as u32),
                Position::new(position.line, end_one_based.saturating_sub(1) as u32),
            ),
            None => Range::zero(),
        }
    }

    /// These generic APIs are never correct on the concat document, since
    /// its real coordinates are discontiguous. Fail loudly rather than
    /// silently returning a misleading offset/position.
    pub fn offset_at(&self, _position: Position) -> Result<usize> {
        Err(EngineError::ConcatFacadeMisuse)
    }

    pub fn position_at(&self, _offset: usize) -> Result<Position> {
        Err(EngineError::ConcatFacadeMisuse)
    }

    pub fn save(&self) -> bool {
        false
    }

    pub fn is_dirty(&self) -> bool {
        true
    }

    pub fn is_untitled(&self) -> bool {
        true
    }

    pub fn language(&self) -> &'static str {
        "python"
    }

    pub fn eol(&self) -> &'static str {
        "\n"
    }

    pub fn spans(&self) -> &SpanList {
        &self.spans
    }

    pub fn concat_lines(&self) -> &LineIndex {
        &self.concat_lines
    }

    pub fn real_lines(&self) -> &LineIndex {
        &self.real_lines
    }
}

fn local_real_to_concat(local_spans: &[Span], real_offset: usize) -> usize {
    for span in local_spans {
        if span.is_real && span.real_start <= real_offset && real_offset <= span.real_end {
            return real_offset - span.real_start + span.concat_start;
        }
    }
    local_spans.last().map_or(real_offset, |s| s.concat_end)
}
