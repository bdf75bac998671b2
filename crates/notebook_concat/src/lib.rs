//! A span engine that maintains a synthetic concatenated document merging a
//! notebook's cell source text, with bidirectional position/offset mapping
//! between the concat document and cell-local real coordinates.
//!
//! The document lifecycle (open/close/edit/refresh a cell) is driven through
//! [`Document`]; read queries go through the same type plus
//! [`CoordinateMapper`] for the bidirectional translation.

pub mod builder;
pub mod cell;
pub mod config;
pub mod coordinates;
pub mod document;
pub mod error;
pub mod events;
pub mod identity;
pub mod line_index;
pub mod position;
pub mod span;

pub use cell::CellId;
pub use config::EngineConfig;
pub use coordinates::CoordinateMapper;
pub use document::Document;
pub use error::{EngineError, Result};
pub use events::{ContentChange, InboundEvent, OutboundContentChange, OutboundEvent, RefreshCell};
pub use line_index::{Line, LineIndex};
pub use position::{Position, Range};
pub use span::{Span, SpanList};
