//! Property-based checks of the span-list invariants over randomly
//! generated open/edit/close sequences, the way `red_knot_server` uses
//! `quickcheck` to fuzz its own line-index arithmetic.

use notebook_concat::{CellId, ContentChange, Document, EngineConfig, Position, Range};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

#[derive(Debug, Clone)]
enum Op {
    Open { cell: u8, text_len: u8, trigger: bool },
    Edit { cell: u8, insert_at_line: u8 },
    Close { cell: u8 },
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut Gen) -> Self {
        match u8::arbitrary(g) % 3 {
            0 => Op::Open {
                cell: u8::arbitrary(g) % 4,
                text_len: 1 + u8::arbitrary(g) % 4,
                trigger: bool::arbitrary(g),
            },
            1 => Op::Edit {
                cell: u8::arbitrary(g) % 4,
                insert_at_line: u8::arbitrary(g) % 4,
            },
            _ => Op::Close { cell: u8::arbitrary(g) % 4 },
        }
    }
}

fn cell_id(n: u8) -> CellId {
    CellId::parse(&format!("vscode-notebook-cell:/nb.ipynb#W{n}")).unwrap()
}

fn cell_text(text_len: u8, trigger: bool) -> String {
    let mut text = String::new();
    if trigger {
        text.push_str("!pip install x\n");
    }
    for i in 0..text_len {
        text.push_str(&format!("x{i} = {i}\n"));
    }
    if text.is_empty() {
        text.push('\n');
    }
    text
}

/// Every concat offset from 0 covers exactly one span with no gap or
/// overlap, and the spans are ordered by `concat_start`.
fn assert_spans_contiguous_and_ordered(document: &Document) {
    let mut expected_next = 0usize;
    for span in document.spans().iter() {
        assert_eq!(span.concat_start, expected_next, "gap or overlap in concat offsets");
        assert!(span.concat_end >= span.concat_start);
        expected_next = span.concat_end;
    }
}

/// Each cell's spans occupy one contiguous index run, and non-interactive
/// fragments appear in non-decreasing order.
fn assert_cell_runs_contiguous(document: &Document) {
    for cell in document.cells() {
        assert!(document.spans().cell_run(&cell).is_some());
    }

    let mut last_fragment: Option<i64> = None;
    for span in document.spans().iter() {
        if span.fragment == -1 {
            continue;
        }
        if let Some(last) = last_fragment {
            assert!(span.fragment >= last, "fragments out of order");
        }
        last_fragment = Some(span.fragment);
    }
}

/// The concatenation of every span's `text` is exactly the document's full
/// text: the span list does not lose or invent bytes relative to what it
/// reports as the whole document.
fn assert_text_identity(document: &Document) {
    let from_spans: String = document.spans().iter().map(|s| s.text.as_str()).collect();
    assert_eq!(from_spans, document.full_text());
}

/// The line index covers exactly the concat text it was built from: the
/// last line's `line_break_inclusive_end` equals the concat text's length.
fn assert_line_index_consistent(document: &Document) {
    let text = document.full_text();
    match document.concat_lines().lines().last() {
        Some(last) => assert_eq!(last.line_break_inclusive_end, text.len()),
        None => assert!(text.is_empty()),
    }
}

#[quickcheck]
fn invariants_hold_after_any_sequence(ops: Vec<Op>) -> bool {
    let mut document = Document::new(EngineConfig::default());
    let mut last_version = document.version();

    for op in ops.into_iter().take(40) {
        match op {
            Op::Open { cell, text_len, trigger } => {
                document.open(cell_id(cell), 1, &cell_text(text_len, trigger), false, None);
            }
            Op::Edit { cell, insert_at_line } => {
                let id = cell_id(cell);
                if document.cells().contains(&id) {
                    let line = u32::from(insert_at_line) % 3;
                    document.edit(
                        &id,
                        vec![ContentChange {
                            range: Some(Range::new(Position::new(line, 0), Position::new(line, 0))),
                            text: "y = 0\n".to_owned(),
                        }],
                    );
                }
            }
            Op::Close { cell } => {
                document.close(&cell_id(cell));
            }
        }

        assert_spans_contiguous_and_ordered(&document);
        assert_cell_runs_contiguous(&document);
        assert_text_identity(&document);
        assert_line_index_consistent(&document);

        assert!(document.version() >= last_version, "version must never decrease");
        last_version = document.version();
    }

    true
}

#[test]
fn real_to_concat_round_trips_through_real_spans() {
    let mut document = Document::new(EngineConfig::default());
    document.open(cell_id(0), 1, "!pip install x\nprint(1)\n", false, None);

    let mapper = notebook_concat::CoordinateMapper::new(
        document.spans(),
        document.concat_lines(),
        document.real_lines(),
    );

    let real_text = document.get_real_text();
    for real_offset in 0..real_text.len() {
        let concat_offset = mapper.real_to_concat(real_offset);
        let back = mapper.concat_to_closest_real(concat_offset);
        assert_eq!(back, real_offset, "round trip failed at real offset {real_offset}");
    }
}
