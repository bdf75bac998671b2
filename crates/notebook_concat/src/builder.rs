//! The span builder. A pure function: given a cell's
//! source text and the offsets it starts at, produces the span sequence
//! for that cell — an optional header prelude, real spans, and synthetic
//! type-suppression spans on trigger lines.

use crate::cell::CellId;
use crate::span::Span;

/// The fixed header prelude text.
pub const HEADER_PRELUDE: &str = "import IPython\nIPython.get_ipython()\n";

/// The fixed type-suppression inline suffix text.
pub const TYPE_SUPPRESSION_SUFFIX: &str = " # type: ignore";

/// Whether `line` (terminator already stripped) triggers a type-suppression
/// split. Leading whitespace is permitted before the trigger.
pub fn is_trigger_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('%') || trimmed.starts_with('!') || trimmed.starts_with("await ")
}

/// Strips carriage returns from inbound cell text. Used on its own where a
/// trailing `\n` must not be forced (mid-edit splices).
pub fn strip_cr(text: &str) -> String {
    text.chars().filter(|&c| c != '\r').collect()
}

/// Normalizes cell text: strip carriage returns, ensure exactly one
/// trailing `\n`.
pub fn normalize_text(text: &str) -> String {
    let mut normalized = strip_cr(text);
    if !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

/// Builds the span sequence for one cell.
///
/// `text` must already be normalized (see [`normalize_text`]). `concat_offset`
/// and `real_offset` are the starting offsets for the new run. `prepend_header`
/// should be true only when `concat_offset == 0` and the cell is not the
/// interactive input cell (the caller, component E, makes that decision since
/// it alone knows the document's current state).
#[allow(clippy::too_many_arguments)]
pub fn build_cell_spans(
    cell_id: &CellId,
    fragment: i64,
    text: &str,
    concat_offset: usize,
    real_offset: usize,
    prepend_header: bool,
    per_cell_header: Option<&str>,
    suppress_enabled: bool,
) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut concat_cursor = concat_offset;
    let mut real_cursor = real_offset;

    if prepend_header {
        let mut header_text = HEADER_PRELUDE.to_owned();
        if let Some(extra) = per_cell_header {
            header_text.push_str(extra);
            if !extra.ends_with('\n') {
                header_text.push('\n');
            }
        }
        let len = header_text.len();
        spans.push(Span {
            cell_id: cell_id.clone(),
            fragment,
            is_real: false,
            concat_start: concat_cursor,
            concat_end: concat_cursor + len,
            real_start: real_cursor,
            real_end: real_cursor,
            text: header_text,
            real_text: String::new(),
        });
        concat_cursor += len;
    }

    let mut real_buf = String::new();

    fn flush_real(
        cell_id: &CellId,
        fragment: i64,
        spans: &mut Vec<Span>,
        buf: &mut String,
        concat_cursor: &mut usize,
        real_cursor: &mut usize,
    ) {
        if buf.is_empty() {
            return;
        }
        let len = buf.len();
        spans.push(Span {
            cell_id: cell_id.clone(),
            fragment,
            is_real: true,
            concat_start: *concat_cursor,
            concat_end: *concat_cursor + len,
            real_start: *real_cursor,
            real_end: *real_cursor + len,
            text: buf.clone(),
            real_text: std::mem::take(buf),
        });
        *concat_cursor += len;
        *real_cursor += len;
    }

    for piece in text.split_inclusive('\n') {
        let line_content = piece.strip_suffix('\n').unwrap_or(piece);

        if suppress_enabled && is_trigger_line(line_content) {
            real_buf.push_str(line_content);
            flush_real(cell_id, fragment, &mut spans, &mut real_buf, &mut concat_cursor, &mut real_cursor);

            let suffix_len = TYPE_SUPPRESSION_SUFFIX.len();
            spans.push(Span {
                cell_id: cell_id.clone(),
                fragment,
                is_real: false,
                concat_start: concat_cursor,
                concat_end: concat_cursor + suffix_len,
                real_start: real_cursor,
                real_end: real_cursor,
                text: TYPE_SUPPRESSION_SUFFIX.to_owned(),
                real_text: String::new(),
            });
            concat_cursor += suffix_len;

            // The next real span begins at the newline that followed the trigger line.
            real_buf.push('\n');
        } else {
            real_buf.push_str(piece);
        }
    }

    flush_real(cell_id, fragment, &mut spans, &mut real_buf, &mut concat_cursor, &mut real_cursor);

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(fragment: &str) -> CellId {
        CellId::parse(&format!("vscode-notebook-cell:/nb.ipynb#{fragment}")).unwrap()
    }

    #[test]
    fn plain_cell_no_trigger() {
        let spans = build_cell_spans(&cell("W0"), 0, "print(1)\n", 0, 0, false, None, true);
        assert_eq!(spans.len(), 1);
        assert!(spans[0].is_real);
        assert_eq!(spans[0].text, "print(1)\n");
        assert_eq!(spans[0].real_text, "print(1)\n");
    }

    #[test]
    fn header_prelude_once() {
        let spans = build_cell_spans(&cell("W0"), 0, "print(1)\n", 0, 0, true, None, true);
        assert_eq!(spans.len(), 2);
        assert!(!spans[0].is_real);
        assert_eq!(spans[0].text, HEADER_PRELUDE);
        assert_eq!(spans[0].real_start, spans[0].real_end);
        assert_eq!(spans[0].concat_start, 0);
    }

    #[test]
    fn leading_trigger_line_splits() {
        let spans = build_cell_spans(
            &cell("W0"),
            0,
            "!pip install x\nprint(1)\n",
            0,
            0,
            false,
            None,
            true,
        );
        assert_eq!(spans.len(), 3);
        assert!(spans[0].is_real);
        assert_eq!(spans[0].text, "!pip install x");
        assert!(!spans[1].is_real);
        assert_eq!(spans[1].text, TYPE_SUPPRESSION_SUFFIX);
        assert!(spans[2].is_real);
        assert_eq!(spans[2].text, "\nprint(1)\n");

        let real_text: String = spans.iter().map(|s| s.real_text.as_str()).collect();
        assert_eq!(real_text, "!pip install x\nprint(1)\n");
    }

    #[test]
    fn suppression_disabled_skips_split() {
        let spans = build_cell_spans(
            &cell("W0"),
            0,
            "!pip install x\nprint(1)\n",
            0,
            0,
            false,
            None,
            false,
        );
        assert_eq!(spans.len(), 1);
        assert!(spans[0].is_real);
    }

    #[test]
    fn await_and_percent_triggers() {
        for text in ["await foo()\n", "%timeit foo()\n", "  !ls\n"] {
            let spans = build_cell_spans(&cell("W0"), 0, text, 0, 0, false, None, true);
            assert_eq!(spans.len(), 3, "expected a trigger split for {text:?}");
        }
    }
}
