//! Visual column width of codepoints, including tab expansion.

use unicode_width::UnicodeWidthChar;

/// Visual width of `cp` in columns: 1 for typical codepoints, >1 for wide
/// (CJK, emoji) codepoints, 0 for combining marks and other zero-width
/// codepoints. Control characters other than tab report width 0 here; the
/// caller decides how to render them.
pub fn codepoint_width(cp: u32) -> usize {
    match char::from_u32(cp) {
        Some(c) => c.width().unwrap_or(0),
        None => 0,
    }
}

/// Advances a visual column counter past `cp`, expanding tab to the next
/// multiple of `tab_size`.
pub fn advance_column(col: usize, cp: u32, tab_size: usize) -> usize {
    if cp == b'\t' as u32 {
        let tab_size = tab_size.max(1);
        col + (tab_size - col % tab_size)
    } else {
        col + codepoint_width(cp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_width_one() {
        assert_eq!(codepoint_width('a' as u32), 1);
    }

    #[test]
    fn wide_cjk_is_width_two() {
        assert_eq!(codepoint_width('漢' as u32), 2);
    }

    #[test]
    fn combining_mark_is_width_zero() {
        // U+0301 COMBINING ACUTE ACCENT
        assert_eq!(codepoint_width(0x0301), 0);
    }

    #[test]
    fn tab_advances_to_next_stop() {
        assert_eq!(advance_column(0, b'\t' as u32, 8), 8);
        assert_eq!(advance_column(3, b'\t' as u32, 8), 8);
        assert_eq!(advance_column(8, b'\t' as u32, 8), 16);
    }
}
