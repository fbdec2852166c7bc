//! Byte classification and codepoint primitives (C2 in the core design).
//!
//! Three encodings are recognized: `Ascii` (every byte ≤ 0x7F), `EightBit`
//! (an arbitrary single-byte locale encoding, decoded one byte per
//! codepoint), and `Utf8`. The core never needs to know *which* 8-bit
//! locale is in play; it only needs to tell one byte apart from the next.

use tracing::trace;

/// The three encodings a buffer can be in. Transitions are monotone except
/// via an explicit user command (see `Buffer::set_encoding`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    Ascii,
    EightBit,
    Utf8,
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Ascii
    }
}

/// Length in bytes of the UTF-8 sequence starting with `lead`, or `0` if
/// `lead` is a continuation byte (0b10xxxxxx) and thus not a valid lead.
pub fn utf8len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Classifies a byte slice as ASCII, UTF-8, or 8-bit.
///
/// ASCII if every byte is ≤ 0x7F. Otherwise UTF-8 if every multi-byte
/// sequence is well-formed (correct lead/continuation structure and at
/// least one non-ASCII byte present); otherwise 8-bit.
pub fn detect_encoding(bytes: &[u8]) -> Encoding {
    let mut saw_non_ascii = false;
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if b <= 0x7F {
            i += 1;
            continue;
        }
        saw_non_ascii = true;
        let len = utf8len(b);
        if len < 2 {
            return Encoding::EightBit;
        }
        if i + len > bytes.len() {
            return Encoding::EightBit;
        }
        for cont in &bytes[i + 1..i + len] {
            if cont & 0xC0 != 0x80 {
                return Encoding::EightBit;
            }
        }
        if std::str::from_utf8(&bytes[i..i + len]).is_err() {
            return Encoding::EightBit;
        }
        i += len;
    }
    if saw_non_ascii { Encoding::Utf8 } else { Encoding::Ascii }
}

/// Decodes the codepoint starting at byte offset `pos` under `enc`.
/// Returns `None` if `pos` is at or past the end of `bytes`.
pub fn get_char(bytes: &[u8], pos: usize, enc: Encoding) -> Option<u32> {
    let b = *bytes.get(pos)?;
    match enc {
        Encoding::Ascii | Encoding::EightBit => Some(b as u32),
        Encoding::Utf8 => {
            let len = utf8len(b);
            if len <= 1 {
                return Some(b as u32);
            }
            let end = (pos + len).min(bytes.len());
            std::str::from_utf8(&bytes[pos..end])
                .ok()
                .and_then(|s| s.chars().next())
                .map(|c| c as u32)
                .or(Some(b as u32))
        }
    }
}

/// Advances one codepoint from byte offset `pos`. Never goes past
/// `bytes.len()`.
pub fn next_pos(bytes: &[u8], pos: usize, enc: Encoding) -> usize {
    if pos >= bytes.len() {
        return bytes.len();
    }
    let step = match enc {
        Encoding::Ascii | Encoding::EightBit => 1,
        Encoding::Utf8 => utf8len(bytes[pos]).max(1),
    };
    (pos + step).min(bytes.len())
}

/// Retreats one codepoint ending at byte offset `pos`.
pub fn prev_pos(bytes: &[u8], pos: usize, enc: Encoding) -> usize {
    if pos == 0 {
        return 0;
    }
    match enc {
        Encoding::Ascii | Encoding::EightBit => pos - 1,
        Encoding::Utf8 => {
            let mut i = pos - 1;
            while i > 0 && bytes[i] & 0xC0 == 0x80 {
                i -= 1;
            }
            i
        }
    }
}

/// Number of codepoints in `bytes[0..upto]` under `enc` (the `cur_char`
/// invariant: visual codepoint index of a byte offset).
pub fn char_index(bytes: &[u8], upto: usize, enc: Encoding) -> usize {
    let upto = upto.min(bytes.len());
    match enc {
        Encoding::Ascii | Encoding::EightBit => upto,
        Encoding::Utf8 => {
            let mut pos = 0;
            let mut count = 0;
            while pos < upto {
                pos = next_pos(bytes, pos, enc);
                count += 1;
            }
            count
        }
    }
}

/// Outcome of attempting to insert a codepoint into a buffer currently at
/// `current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// No promotion needed; `current` already accommodates the codepoint.
    Stay,
    /// Promote the buffer to this encoding before inserting.
    To(Encoding),
    /// The codepoint cannot be represented; the insert must fail.
    Reject,
}

/// Implements the encoding-promotion rule for inserting `cp` into a
/// buffer whose current encoding is `current`, with `utf8auto` controlling
/// whether a >0x7F, <=0xFF codepoint promotes straight to UTF-8 or to
/// 8-bit first.
pub fn promotion_for_insert(current: Encoding, cp: u32, utf8auto: bool) -> Promotion {
    match current {
        Encoding::Utf8 => Promotion::Stay,
        Encoding::EightBit => {
            if cp > 0xFF { Promotion::Reject } else { Promotion::Stay }
        }
        Encoding::Ascii => {
            if cp <= 0x7F {
                Promotion::Stay
            } else if utf8auto || cp > 0xFF {
                trace!(target: "encoding", cp, utf8auto, "promote_to_utf8");
                Promotion::To(Encoding::Utf8)
            } else {
                trace!(target: "encoding", cp, "promote_to_8bit");
                Promotion::To(Encoding::EightBit)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_ascii() {
        assert_eq!(detect_encoding(b"hello world"), Encoding::Ascii);
    }

    #[test]
    fn detects_utf8() {
        assert_eq!(detect_encoding("héllo".as_bytes()), Encoding::Utf8);
    }

    #[test]
    fn detects_8bit_on_malformed_utf8() {
        let bytes = [0xE9u8, b'a', b'b'];
        assert_eq!(detect_encoding(&bytes), Encoding::EightBit);
    }

    #[test]
    fn next_pos_steps_by_codepoint() {
        let s = "héllo";
        let bytes = s.as_bytes();
        let p0 = 0;
        let p1 = next_pos(bytes, p0, Encoding::Utf8);
        assert_eq!(p1, 1);
        let p2 = next_pos(bytes, p1, Encoding::Utf8);
        assert_eq!(p2, 3); // 'é' is 2 bytes
    }

    #[test]
    fn char_index_counts_codepoints_not_bytes() {
        let s = "héllo";
        assert_eq!(char_index(s.as_bytes(), s.len(), Encoding::Utf8), 5);
    }

    #[test]
    fn promotion_rule_ascii_to_utf8_when_auto() {
        assert_eq!(
            promotion_for_insert(Encoding::Ascii, 0x2603, true),
            Promotion::To(Encoding::Utf8)
        );
    }

    #[test]
    fn promotion_rule_ascii_to_8bit_when_not_auto_and_in_range() {
        assert_eq!(
            promotion_for_insert(Encoding::Ascii, 0xE9, false),
            Promotion::To(Encoding::EightBit)
        );
    }

    #[test]
    fn promotion_rejects_wide_codepoint_into_8bit() {
        assert_eq!(
            promotion_for_insert(Encoding::EightBit, 0x2603, false),
            Promotion::Reject
        );
    }
}
