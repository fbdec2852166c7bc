//! Grapheme-cluster helpers built on `unicode-segmentation`.
//!
//! Movement and width calculations generally want to step one *visible*
//! character at a time rather than one codepoint, so combining marks
//! ride along with their base character.

use unicode_segmentation::UnicodeSegmentation;

/// Byte offsets of grapheme cluster boundaries in `s`, including `0` and
/// `s.len()`.
pub fn grapheme_boundaries(s: &str) -> Vec<usize> {
    let mut bounds: Vec<usize> = s.grapheme_indices(true).map(|(i, _)| i).collect();
    bounds.push(s.len());
    bounds
}

/// The byte offset of the grapheme cluster boundary at or after `pos`.
pub fn next_grapheme_boundary(s: &str, pos: usize) -> usize {
    grapheme_boundaries(s)
        .into_iter()
        .find(|&b| b > pos)
        .unwrap_or(s.len())
}

/// The byte offset of the grapheme cluster boundary strictly before `pos`.
pub fn prev_grapheme_boundary(s: &str, pos: usize) -> usize {
    grapheme_boundaries(s)
        .into_iter()
        .rev()
        .find(|&b| b < pos)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_boundaries_are_per_byte() {
        assert_eq!(grapheme_boundaries("abc"), vec![0, 1, 2, 3]);
    }

    #[test]
    fn combining_mark_stays_with_base() {
        // "e" + combining acute accent is one grapheme cluster.
        let s = "e\u{0301}bc";
        let bounds = grapheme_boundaries(s);
        assert_eq!(bounds[0], 0);
        assert_eq!(bounds[1], 3); // 'e' (1 byte) + combining accent (2 bytes)
    }

    #[test]
    fn next_and_prev_are_inverse_at_boundaries() {
        let s = "abc";
        assert_eq!(next_grapheme_boundary(s, 0), 1);
        assert_eq!(prev_grapheme_boundary(s, 1), 0);
    }
}
