//! Text-level primitives: encoding (C2), the line arena (C1), grapheme
//! segmentation, visual width, and word-class tables.
//!
//! This crate has no notion of a buffer, a cursor, or an action; those
//! live in `core-state` and `core-actions`. It only knows how to store
//! bytes as lines and how to reason about the codepoints inside them.

pub mod charclass;
pub mod encoding;
pub mod linestore;
pub mod segment;
pub mod width;

pub use encoding::{Encoding, Promotion, char_index, detect_encoding, get_char, next_pos, prev_pos, promotion_for_insert, utf8len};
pub use linestore::{Line, LineId, LineStore};
pub use width::{advance_column, codepoint_width};

/// Opaque per-line syntax highlighter state. The core never
/// inspects the value; it only threads it from one line's outgoing state
/// to the next line's incoming state. `0` is the canonical "start of
/// file" state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HighlightState(pub u64);

/// A logical position within a buffer: a line id plus a byte offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: LineId,
    pub pos: usize,
}

impl Position {
    pub fn new(line: LineId, pos: usize) -> Self {
        Position { line, pos }
    }
}

/// Staleness tracking for the current line's byte-wise highlight
/// attributes; a typed replacement for an `attr_len < 0` sentinel.
#[derive(Clone, Debug, Default)]
pub enum AttrCache {
    #[default]
    Stale,
    Valid(Vec<u8>),
}

impl AttrCache {
    pub fn is_stale(&self) -> bool {
        matches!(self, AttrCache::Stale)
    }

    pub fn invalidate(&mut self) {
        *self = AttrCache::Stale;
    }
}
