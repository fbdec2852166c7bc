//! Character classification for word-boundary detection (`NEXTWORD`,
//! `PREVWORD`, `MOVEEOW`). A *word* is a maximal run of codepoints of the
//! same class other than whitespace.

/// The class of a codepoint, used to decide where one word ends and the
/// next begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    Letter,
    Digit,
    Punctuation,
    Whitespace,
    Other,
}

/// Classifies a codepoint for word-boundary purposes.
pub fn classify(cp: u32) -> CharClass {
    match char::from_u32(cp) {
        Some(c) if c.is_whitespace() => CharClass::Whitespace,
        Some(c) if c.is_alphabetic() || c == '_' => CharClass::Letter,
        Some(c) if c.is_ascii_digit() || c.is_numeric() => CharClass::Digit,
        Some(c) if c.is_ascii_punctuation() => CharClass::Punctuation,
        Some(_) => CharClass::Other,
        None => CharClass::Other,
    }
}

/// Whether two adjacent codepoints belong to the same "word" for the
/// purposes of word-motion: whitespace never joins with anything, and a
/// boundary exists whenever the class changes.
pub fn same_word(a: u32, b: u32) -> bool {
    let ca = classify(a);
    let cb = classify(b);
    ca == cb && ca != CharClass::Whitespace
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_digits_differ() {
        assert_eq!(classify('a' as u32), CharClass::Letter);
        assert_eq!(classify('5' as u32), CharClass::Digit);
    }

    #[test]
    fn whitespace_never_joins() {
        assert!(!same_word(' ' as u32, ' ' as u32));
    }

    #[test]
    fn same_class_joins() {
        assert!(same_word('a' as u32, 'b' as u32));
        assert!(!same_word('a' as u32, '5' as u32));
    }
}
