//! Inbound/outbound event shapes. Modeled as tagged variants with explicit
//! fields rather than duck-typed JSON payloads: "the change event with or
//! without range" case is one variant with an optional range, defaulting to
//! the zero range on absence.

use serde::Serialize;
use url::Url;

use crate::cell::CellId;
use crate::position::Range;

/// One content change within a `Change` event. `range` is `None` when the
/// inbound message omits it, which means "insert at the beginning".
#[derive(Debug, Clone)]
pub struct ContentChange {
    pub range: Option<Range>,
    pub text: String,
}

impl ContentChange {
    pub fn effective_range(&self) -> Range {
        self.range.unwrap_or_else(Range::zero)
    }
}

/// One cell's text document, as carried by a `Refresh` event.
#[derive(Debug, Clone)]
pub struct RefreshCell {
    pub cell_id: CellId,
    pub version: i64,
    pub text: String,
}

/// The inbound document-lifecycle events this engine accepts.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Open {
        cell_id: CellId,
        version: i64,
        text: String,
        force_append: bool,
    },
    Close {
        cell_id: CellId,
    },
    Change {
        cell_id: CellId,
        content_changes: Vec<ContentChange>,
    },
    Refresh {
        cells: Vec<RefreshCell>,
    },
}

/// One change within the outbound event's `content_changes` array.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundContentChange {
    pub range: Range,
    #[serde(rename = "rangeOffset")]
    pub range_offset: u32,
    #[serde(rename = "rangeLength")]
    pub range_length: u32,
    pub text: String,
}

/// The outbound change event: one per accepted inbound event, carrying one
/// or more content changes in submission order. `range` is stripped to only
/// `{start, end}` so the payload is serialization-clean.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEvent {
    #[serde(serialize_with = "serialize_url")]
    pub uri: Url,
    pub version: i64,
    pub content_changes: Vec<OutboundContentChange>,
}

fn serialize_url<S: serde::Serializer>(url: &Url, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(url.as_str())
}
