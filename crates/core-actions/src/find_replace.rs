//! Find/replace state machine.
//!
//! The core never implements pattern matching itself; every search goes
//! through the [`Matchers`] collaborator. This module owns the
//! encoding-compatibility guards, the non-interactive search/replace
//! operations, and the interactive replace loop's prompt/response
//! handling.

use core_collab::{Matchers, PromptOutcome, Prompter};
use core_state::{Buffer, ErrorKind, UndoRecord};
use core_text::encoding::{self, Encoding};

/// The interactive replace loop's state. `Idle`/`Searching` are
/// bookkeeping for callers that want to display a status line; the
/// core's own search/replace functions only ever pass through
/// `Replacing`/`Paused` while a loop is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Searching,
    Replacing,
    Paused,
}

fn validate_search_encoding(pattern: &str, buf_encoding: Encoding) -> Result<(), ErrorKind> {
    let search_enc = encoding::detect_encoding(pattern.as_bytes());
    if search_enc != Encoding::Ascii && buf_encoding != Encoding::Ascii && search_enc != buf_encoding {
        Err(ErrorKind::IncompatibleSearchStringEncoding)
    } else {
        Ok(())
    }
}

fn validate_replace_encoding(pattern: &str, replacement: &str, buf_encoding: Encoding) -> Result<(), ErrorKind> {
    validate_search_encoding(pattern, buf_encoding)?;
    let search_enc = encoding::detect_encoding(pattern.as_bytes());
    let replace_enc = encoding::detect_encoding(replacement.as_bytes());
    let clashes_with_buf = replace_enc != Encoding::Ascii && buf_encoding != Encoding::Ascii && replace_enc != buf_encoding;
    let clashes_with_search = replace_enc != Encoding::Ascii && search_enc != Encoding::Ascii && replace_enc != search_enc;
    if clashes_with_buf || clashes_with_search {
        Err(ErrorKind::IncompatibleReplaceStringEncoding)
    } else {
        Ok(())
    }
}

/// Searches from the cursor in `buf.opt.search_back`'s direction,
/// non-wrapping. Moves the cursor to the match start on success. Empty
/// matches advance one codepoint past themselves so a repeated `Find`
/// cannot loop forever on the same spot.
pub fn find(buf: &mut Buffer, matchers: &dyn Matchers, pattern: &str, is_regexp: bool) -> Result<bool, ErrorKind> {
    validate_search_encoding(pattern, buf.encoding)?;
    if pattern.is_empty() {
        return Err(ErrorKind::NoSearchString);
    }
    buf.find_string_changed = buf.find_string.as_deref() != Some(pattern);
    buf.find_string = Some(pattern.to_string());
    buf.last_was_regexp = is_regexp;
    buf.last_was_replace = false;

    let backward = buf.opt.search_back;
    let case_sensitive = buf.opt.case_search;

    let mut line = Some(buf.cur_line);
    let mut search_from = buf.cur_pos;
    let mut first = true;
    while let Some(id) = line {
        let bytes = buf.lines.line(id).unwrap().bytes.clone();
        let from = if first {
            search_from
        } else if backward {
            bytes.len()
        } else {
            0
        };
        first = false;
        let found = matchers
            .find(&bytes, pattern, is_regexp, case_sensitive, backward, from)
            .map_err(|_| ErrorKind::Error)?;
        if let Some(span) = found {
            buf.cur_line = id;
            if span.start == span.end {
                buf.cur_pos = if backward {
                    encoding::prev_pos(&bytes, span.start, buf.encoding)
                } else {
                    encoding::next_pos(&bytes, span.end, buf.encoding)
                };
            } else {
                buf.cur_pos = span.start;
            }
            return Ok(true);
        }
        line = if backward { buf.lines.prev_of(id) } else { buf.lines.next_of(id) };
        search_from = 0;
    }
    Ok(false)
}

/// Replaces the text at the cursor's current match (as left by `find`)
/// with `replacement`, leaving the cursor immediately after the
/// inserted text. Private: callers go through `replace_once`/
/// `replace_all`/`interactive_replace`, which locate the match first.
fn apply_replacement(buf: &mut Buffer, match_end: usize, replacement: &str) {
    let removed = buf.lines.delete_bytes(buf.cur_line, buf.cur_pos, match_end - buf.cur_pos);
    buf.lines.insert_bytes(buf.cur_line, buf.cur_pos, replacement.as_bytes());
    buf.undo.push(UndoRecord::Bytes {
        line: buf.cur_line,
        pos: buf.cur_pos,
        removed,
        inserted: replacement.as_bytes().to_vec(),
    });
    buf.cur_pos += replacement.len();
    buf.attrs.invalidate();
}

fn match_end_at_cursor(buf: &Buffer, matchers: &dyn Matchers, pattern: &str, is_regexp: bool) -> Result<Option<usize>, ErrorKind> {
    let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
    let span = matchers
        .find(&bytes, pattern, is_regexp, buf.opt.case_search, false, buf.cur_pos)
        .map_err(|_| ErrorKind::Error)?;
    Ok(span.filter(|s| s.start == buf.cur_pos).map(|s| s.end))
}

/// **ReplaceOnce**: finds the next match and replaces it.
pub fn replace_once(buf: &mut Buffer, matchers: &dyn Matchers, pattern: &str, replacement: &str, is_regexp: bool) -> Result<bool, ErrorKind> {
    validate_replace_encoding(pattern, replacement, buf.encoding)?;
    buf.replace_string = Some(replacement.to_string());
    buf.last_was_replace = true;
    if !find(buf, matchers, pattern, is_regexp)? {
        return Ok(false);
    }
    let end = match_end_at_cursor(buf, matchers, pattern, is_regexp)?.unwrap_or(buf.cur_pos);
    apply_replacement(buf, end, replacement);
    Ok(true)
}

/// **ReplaceAll**: replaces every match in the buffer, from its start,
/// inside one undo chain.
pub fn replace_all(buf: &mut Buffer, matchers: &dyn Matchers, pattern: &str, replacement: &str, is_regexp: bool) -> Result<usize, ErrorKind> {
    validate_replace_encoding(pattern, replacement, buf.encoding)?;
    buf.replace_string = Some(replacement.to_string());
    buf.last_was_replace = true;

    let saved_backward = buf.opt.search_back;
    buf.opt.search_back = false;
    buf.cur_line = buf.lines.head();
    buf.cur_pos = 0;

    buf.undo.begin_chain();
    let mut count = 0usize;
    loop {
        if !find(buf, matchers, pattern, is_regexp)? {
            break;
        }
        let end = match_end_at_cursor(buf, matchers, pattern, is_regexp)?.unwrap_or(buf.cur_pos);
        apply_replacement(buf, end, replacement);
        count += 1;
    }
    buf.undo.end_chain();
    buf.opt.search_back = saved_backward;
    Ok(count)
}

/// **RepeatLast**: replays the last search or replace under its stored
/// pattern/replacement/direction.
pub fn repeat_last(buf: &mut Buffer, matchers: &dyn Matchers) -> Result<bool, ErrorKind> {
    let pattern = buf.find_string.clone().ok_or(ErrorKind::NoSearchString)?;
    let is_regexp = buf.last_was_regexp;
    if buf.last_was_replace {
        let replacement = buf.replace_string.clone().ok_or(ErrorKind::NoReplaceString)?;
        replace_once(buf, matchers, &pattern, &replacement, is_regexp)
    } else {
        find(buf, matchers, &pattern, is_regexp)
    }
}

/// One step of the interactive replace loop's response handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Stopped,
}

/// Drives the interactive `{Y, N, L, A, Q, F, B}` replace loop for one
/// match already positioned at the cursor (as left by `find`).
/// `F`/`B` toggle `opt.search_back` mid-session.
pub fn interactive_replace_step(
    buf: &mut Buffer,
    matchers: &dyn Matchers,
    prompter: &mut dyn Prompter,
    pattern: &str,
    replacement: &str,
    is_regexp: bool,
) -> Result<StepOutcome, ErrorKind> {
    loop {
        let response = match prompter.request_response("Replace? [Y/N/L/A/Q/F/B]", "YNLAQFB") {
            PromptOutcome::Value(c) => c.to_ascii_uppercase(),
            PromptOutcome::Abort => return Ok(StepOutcome::Stopped),
        };
        match response {
            'Y' => {
                let end = match_end_at_cursor(buf, matchers, pattern, is_regexp)?.unwrap_or(buf.cur_pos);
                apply_replacement(buf, end, replacement);
                return Ok(StepOutcome::Continue);
            }
            'N' => return Ok(StepOutcome::Continue),
            'L' => {
                let end = match_end_at_cursor(buf, matchers, pattern, is_regexp)?.unwrap_or(buf.cur_pos);
                apply_replacement(buf, end, replacement);
                return Ok(StepOutcome::Stopped);
            }
            'A' => return Ok(StepOutcome::Stopped),
            'Q' => return Ok(StepOutcome::Stopped),
            'F' => {
                buf.opt.search_back = false;
                continue;
            }
            'B' => {
                buf.opt.search_back = true;
                continue;
            }
            _ => continue,
        }
    }
}

/// **Replace**: drives the interactive loop end to end, finding each
/// match and asking `prompter` what to do with it, inside one undo
/// chain.
pub fn interactive_replace(
    buf: &mut Buffer,
    matchers: &dyn Matchers,
    prompter: &mut dyn Prompter,
    pattern: &str,
    replacement: &str,
    is_regexp: bool,
) -> Result<(), ErrorKind> {
    validate_replace_encoding(pattern, replacement, buf.encoding)?;
    buf.replace_string = Some(replacement.to_string());
    buf.last_was_replace = true;

    buf.undo.begin_chain();
    let result = (|| -> Result<(), ErrorKind> {
        loop {
            if !find(buf, matchers, pattern, is_regexp)? {
                return Ok(());
            }
            if interactive_replace_step(buf, matchers, prompter, pattern, replacement, is_regexp)? == StepOutcome::Stopped {
                return Ok(());
            }
        }
    })();
    buf.undo.end_chain();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_collab::MatchSpan;

    struct LiteralMatcher;
    impl Matchers for LiteralMatcher {
        fn find(&self, haystack: &[u8], pattern: &str, _is_regexp: bool, _case_sensitive: bool, backward: bool, from: usize) -> anyhow::Result<Option<MatchSpan>> {
            let pat = pattern.as_bytes();
            if pat.is_empty() || pat.len() > haystack.len() {
                return Ok(None);
            }
            if backward {
                let end = from.min(haystack.len());
                for start in (0..=end.saturating_sub(pat.len())).rev() {
                    if haystack[start..start + pat.len()] == *pat {
                        return Ok(Some(MatchSpan { start, end: start + pat.len() }));
                    }
                }
            } else {
                for start in from..=(haystack.len().saturating_sub(pat.len())) {
                    if haystack[start..start + pat.len()] == *pat {
                        return Ok(Some(MatchSpan { start, end: start + pat.len() }));
                    }
                }
            }
            Ok(None)
        }
        fn match_bracket(&self, _haystack: &[u8], _pos: usize) -> Option<usize> {
            None
        }
    }

    fn type_str(buf: &mut Buffer, s: &str) {
        buf.lines.insert_bytes(buf.cur_line, buf.cur_pos, s.as_bytes());
        buf.cur_pos += s.len();
    }

    #[test]
    fn find_locates_forward_match() {
        let mut buf = Buffer::new();
        type_str(&mut buf, "hello world");
        buf.cur_pos = 0;
        let matcher = LiteralMatcher;
        assert!(find(&mut buf, &matcher, "world", false).unwrap());
        assert_eq!(buf.cur_pos, 6);
    }

    #[test]
    fn find_empty_pattern_errors() {
        let mut buf = Buffer::new();
        let matcher = LiteralMatcher;
        assert_eq!(find(&mut buf, &matcher, "", false), Err(ErrorKind::NoSearchString));
    }

    #[test]
    fn replace_once_swaps_match() {
        let mut buf = Buffer::new();
        type_str(&mut buf, "foo bar");
        buf.cur_pos = 0;
        let matcher = LiteralMatcher;
        assert!(replace_once(&mut buf, &matcher, "bar", "baz", false).unwrap());
        assert_eq!(buf.lines.line(buf.cur_line).unwrap().bytes, b"foo baz");
    }

    #[test]
    fn replace_all_replaces_every_match() {
        let mut buf = Buffer::new();
        type_str(&mut buf, "a a a");
        let matcher = LiteralMatcher;
        let count = replace_all(&mut buf, &matcher, "a", "b", false).unwrap();
        assert_eq!(count, 3);
        assert_eq!(buf.lines.line(buf.cur_line).unwrap().bytes, b"b b b");
    }

    #[test]
    fn incompatible_encoding_rejects_and_leaves_buffer_unchanged() {
        let mut buf = Buffer::new();
        buf.encoding = Encoding::EightBit;
        type_str(&mut buf, "abc");
        let matcher = LiteralMatcher;
        let before = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
        let err = replace_once(&mut buf, &matcher, "é", "e", false).unwrap_err();
        assert_eq!(err, ErrorKind::IncompatibleSearchStringEncoding);
        assert_eq!(buf.lines.line(buf.cur_line).unwrap().bytes, before);
    }

    struct ScriptedPrompter {
        responses: Vec<char>,
    }
    impl Prompter for ScriptedPrompter {
        fn request_number(&mut self, _prompt: &str) -> PromptOutcome<i64> {
            PromptOutcome::Abort
        }
        fn request_string(&mut self, _prompt: &str) -> PromptOutcome<String> {
            PromptOutcome::Abort
        }
        fn request_file(&mut self, _prompt: &str) -> PromptOutcome<String> {
            PromptOutcome::Abort
        }
        fn request_response(&mut self, _prompt: &str, _choices: &str) -> PromptOutcome<char> {
            if self.responses.is_empty() {
                PromptOutcome::Value('Q')
            } else {
                PromptOutcome::Value(self.responses.remove(0))
            }
        }
        fn request_char(&mut self, _prompt: &str) -> PromptOutcome<char> {
            PromptOutcome::Abort
        }
        fn request_document(&mut self, _prompt: &str) -> PromptOutcome<String> {
            PromptOutcome::Abort
        }
        fn get_key_code(&mut self) -> PromptOutcome<u32> {
            PromptOutcome::Abort
        }
    }

    #[test]
    fn interactive_replace_skips_then_replaces() {
        let mut buf = Buffer::new();
        type_str(&mut buf, "a a a");
        buf.cur_pos = 0;
        let matcher = LiteralMatcher;
        let mut prompter = ScriptedPrompter { responses: vec!['N', 'Y', 'Y'] };
        interactive_replace(&mut buf, &matcher, &mut prompter, "a", "b", false).unwrap();
        assert_eq!(buf.lines.line(buf.cur_line).unwrap().bytes, b"a b b");
    }

    #[test]
    fn interactive_replace_quit_stops_immediately() {
        let mut buf = Buffer::new();
        type_str(&mut buf, "a a a");
        buf.cur_pos = 0;
        let matcher = LiteralMatcher;
        let mut prompter = ScriptedPrompter { responses: vec!['Q'] };
        interactive_replace(&mut buf, &matcher, &mut prompter, "a", "b", false).unwrap();
        assert_eq!(buf.lines.line(buf.cur_line).unwrap().bytes, b"a a a");
    }

    #[test]
    fn repeat_last_replays_stored_find() {
        let mut buf = Buffer::new();
        type_str(&mut buf, "xx needle xx");
        buf.cur_pos = 0;
        let matcher = LiteralMatcher;
        find(&mut buf, &matcher, "needle", false).unwrap();
        buf.cur_pos = 0;
        assert!(repeat_last(&mut buf, &matcher).unwrap());
    }
}
