//! Plain position/range types used at both the internal coordinate-mapper
//! boundary and the outbound event boundary. Characters are 0-based
//! everywhere in this crate's API; translating a scanner's 1-based columns
//! happens at the one call site that needs it
//! ([`crate::document::Document::word_range_at_position`]).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// The zero range `(0,0)..(0,0)`, used as the default for a content
    /// change whose `range` is absent (insert-at-beginning).
    pub fn zero() -> Self {
        Self::default()
    }
}
