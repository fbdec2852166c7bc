//! Clip storage (C7): an indexed array of clip buffers plus the
//! rectangle arithmetic used by the vertical (block) paste/copy path.
//!
//! Applying a clip to a buffer's `LineStore` (and emitting the matching
//! `UndoRecord`s) is the dispatcher's job (`core-actions`); this module
//! only owns the clip *contents* and the pure geometry helpers.

use std::collections::HashMap;
use tracing::trace;

/// Reserved clip index for the `THROUGH` filter's scratch clip.
pub const THROUGH_CLIP: usize = usize::MAX;

/// One clip's content: a sequence of lines (each a raw byte row), plus
/// whether it was captured as a rectangular (vertical) block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Clip {
    pub lines: Vec<Vec<u8>>,
    pub vertical: bool,
}

/// The indexed clip array.
#[derive(Default)]
pub struct Clipboards {
    clips: HashMap<usize, Clip>,
}

impl Clipboards {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, idx: usize, clip: Clip) {
        trace!(target: "clipboard", idx, lines = clip.lines.len(), vertical = clip.vertical, "set_clip");
        self.clips.insert(idx, clip);
    }

    pub fn get(&self, idx: usize) -> Option<&Clip> {
        self.clips.get(&idx)
    }

    pub fn clear(&mut self, idx: usize) {
        self.clips.remove(&idx);
    }
}

/// Extracts the rectangular region `[start_col, end_col)` from each of
/// `rows`, padding short rows with spaces so every extracted row has the
/// same width: vertical mode preserves a rectangular region.
pub fn extract_rectangle(rows: &[Vec<u8>], start_col: usize, end_col: usize) -> Vec<Vec<u8>> {
    let (lo, hi) = (start_col.min(end_col), start_col.max(end_col));
    rows.iter()
        .map(|row| {
            let mut out = Vec::with_capacity(hi - lo);
            for col in lo..hi {
                out.push(*row.get(col).unwrap_or(&b' '));
            }
            out
        })
        .collect()
}

/// Removes the rectangular region `[start_col, end_col)` from each of
/// `rows` in place (used by `erase_vert_block`/vertical cut).
pub fn erase_rectangle(rows: &mut [Vec<u8>], start_col: usize, end_col: usize) {
    let (lo, hi) = (start_col.min(end_col), start_col.max(end_col));
    for row in rows.iter_mut() {
        let hi = hi.min(row.len());
        if lo < hi {
            row.splice(lo..hi, std::iter::empty());
        }
    }
}

/// Splices `rect` into `rows` at column `col`, starting at row `start_row`.
/// `rows` is extended with empty rows (then returns how many new trailing
/// rows were appended) if `rect` has more rows than fit, padding the
/// buffer rather than rejecting or truncating the paste.
pub fn splice_rectangle(rows: &mut Vec<Vec<u8>>, start_row: usize, col: usize, rect: &[Vec<u8>]) -> usize {
    let mut appended = 0;
    while rows.len() < start_row + rect.len() {
        rows.push(Vec::new());
        appended += 1;
    }
    for (i, rect_row) in rect.iter().enumerate() {
        let row = &mut rows[start_row + i];
        while row.len() < col {
            row.push(b' ');
        }
        row.splice(col..col, rect_row.iter().copied());
    }
    appended
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_and_erase_roundtrip_rectangle() {
        let rows = vec![b"abcd".to_vec(), b"efgh".to_vec(), b"ijkl".to_vec()];
        let rect = extract_rectangle(&rows, 1, 4);
        assert_eq!(rect, vec![b"bcd".to_vec(), b"fgh".to_vec(), b"jkl".to_vec()]);
    }

    #[test]
    fn splice_pads_short_buffer_with_new_rows() {
        let mut rows = vec![b"a".to_vec()];
        let rect = vec![b"x".to_vec(), b"y".to_vec(), b"z".to_vec()];
        let appended = splice_rectangle(&mut rows, 0, 0, &rect);
        assert_eq!(appended, 2);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], b"xa".to_vec());
        assert_eq!(rows[2], b"z".to_vec());
    }

    #[test]
    fn through_clip_index_is_reserved() {
        let mut clips = Clipboards::new();
        clips.set(THROUGH_CLIP, Clip { lines: vec![b"x".to_vec()], vertical: false });
        assert!(clips.get(THROUGH_CLIP).is_some());
    }
}
