//! End-to-end scenarios over the whole engine: open, edit, close, refresh,
//! and the outbound events each produces.

use notebook_concat::{CellId, ContentChange, Document, EngineConfig, Position, Range, RefreshCell};

fn cell(fragment: &str) -> CellId {
    CellId::parse(&format!("vscode-notebook-cell:/nb.ipynb#{fragment}")).unwrap()
}

fn doc() -> Document {
    Document::new(EngineConfig::default())
}

#[test]
fn open_one_cell_gets_a_header_and_an_insert_event() {
    let mut document = doc();
    let event = document
        .open(cell("W0"), 1, "print(1)\n", false, None)
        .expect("first open always emits an event");

    assert_eq!(event.version, document.version());
    assert_eq!(event.content_changes.len(), 1);
    let change = &event.content_changes[0];
    assert_eq!(change.range_offset, 0);
    assert_eq!(change.range_length, 0);
    assert!(change.text.starts_with("import IPython\n"));
    assert!(change.text.ends_with("print(1)\n"));

    assert_eq!(document.cells(), vec![cell("W0")]);
    assert_eq!(document.full_text(), change.text);
}

#[test]
fn trigger_line_is_suppressed_with_a_synthetic_span() {
    let mut document = doc();
    document.open(cell("W0"), 1, "!pip install x\nprint(1)\n", false, None);

    let full_text = document.full_text();
    assert!(full_text.contains("!pip install x # type: ignore"));
    assert!(document.get_real_text().contains("!pip install x\nprint(1)\n"));
    assert!(!document.get_real_text().contains("type: ignore"));
}

#[test]
fn partial_edit_preserves_span_structure() {
    let mut document = doc();
    document.open(cell("W0"), 1, "!pip install x\nprint(1)\n", false, None);
    let before_cells = document.cells();

    // Replace "1" with "2" inside the trailing real span; same line count,
    // same span skeleton, so this should take the partial-edit path.
    let event = document
        .edit(
            &cell("W0"),
            vec![ContentChange {
                range: Some(Range::new(Position::new(1, 6), Position::new(1, 7))),
                text: "2".to_owned(),
            }],
        )
        .expect("edit of an open cell always emits an event when it applies");

    assert_eq!(event.content_changes.len(), 1);
    let change = &event.content_changes[0];
    assert_eq!(change.text, "2");
    assert!(change.range_length <= 1);
    assert_eq!(document.cells(), before_cells);
    assert!(document.get_real_text().contains("print(2)"));
}

#[test]
fn structural_edit_forces_a_whole_cell_replacement() {
    let mut document = doc();
    document.open(cell("W0"), 1, "!pip install x\nprint(1)\n", false, None);

    // Replace the whole cell's real text with something that has no trigger
    // line at all: the span skeleton shrinks from 3 spans to 1.
    let full_old_real_len = document.get_real_text().len() as u32;
    let event = document
        .edit(
            &cell("W0"),
            vec![ContentChange {
                range: Some(Range::new(Position::new(0, 0), Position::new(1, 8))),
                text: "print(2)".to_owned(),
            }],
        )
        .expect("structural edit still emits an event");

    let change = &event.content_changes[0];
    assert!(change.text.contains("print(2)"));
    assert!(!change.text.contains("type: ignore"));
    assert!(change.range_length > 0 && change.range_length <= full_old_real_len + 64);
    assert_eq!(document.get_real_text(), "print(2)\n");
}

#[test]
fn closing_the_only_cell_empties_the_document() {
    let mut document = doc();
    document.open(cell("W0"), 1, "print(1)\n", false, None);
    assert!(!document.is_closed());

    let event = document.close(&cell("W0")).expect("close of an open cell emits an event");
    assert_eq!(event.content_changes[0].text, "");
    assert!(document.is_closed());
    assert!(document.cells().is_empty());
    assert_eq!(document.full_text(), "");
}

#[test]
fn refresh_reorders_cells_in_one_replace_all_event() {
    let mut document = doc();
    document.open(cell("W0"), 1, "a = 1\n", false, None);
    document.open(cell("W1"), 1, "b = 2\n", false, None);

    let event = document
        .refresh(vec![
            RefreshCell {
                cell_id: cell("W1"),
                version: 1,
                text: "b = 2\n".to_owned(),
            },
            RefreshCell {
                cell_id: cell("W0"),
                version: 1,
                text: "a = 1\n".to_owned(),
            },
        ])
        .expect("refresh with changed cell order emits a replace-all event");

    assert_eq!(event.content_changes.len(), 1);
    assert_eq!(document.cells(), vec![cell("W1"), cell("W0")]);
}

#[test]
fn refresh_with_unchanged_real_text_is_a_no_op() {
    let mut document = doc();
    document.open(cell("W0"), 1, "a = 1\n", false, None);

    let event = document.refresh(vec![RefreshCell {
        cell_id: cell("W0"),
        version: 1,
        text: "a = 1\n".to_owned(),
    }]);

    assert!(event.is_none());
}

#[test]
fn offset_at_and_position_at_fail_loudly() {
    let mut document = doc();
    document.open(cell("W0"), 1, "print(1)\n", false, None);

    assert!(document.offset_at(Position::new(0, 0)).is_err());
    assert!(document.position_at(0).is_err());
}

#[test]
fn double_open_of_the_same_cell_is_ignored() {
    let mut document = doc();
    document.open(cell("W0"), 1, "a = 1\n", false, None);
    let version_before = document.version();

    let event = document.open(cell("W0"), 2, "a = 2\n", false, None);
    assert!(event.is_none());
    assert_eq!(document.version(), version_before);
}
