//! Primitive mutations (C5): insert/delete one char, insert/delete line,
//! word-wrap, auto-indent, and case/center/paragraph reshaping. Every
//! function here emits the matching [`UndoRecord`]s and leaves the
//! current line's attribute cache invalidated so `SyntaxBridge` refreezes
//! it on next use.

use core_config::Options;
use core_state::{Buffer, ErrorKind, UndoLog, UndoRecord};
use core_text::charclass::{classify, same_word, CharClass};
use core_text::encoding::{self, Encoding, Promotion};
use core_text::{HighlightState, LineId};
use tracing::trace;

use crate::clipboard_ops;

type OpResult = Result<(), ErrorKind>;

/// Populates a freshly-constructed buffer with a file's raw bytes
/// (`Open`, and a binary's own startup load): splits on `\n`, stripping
/// a paired `\r` when any `\r\n` is found anywhere in the file, and
/// records the original convention in `is_crlf`. The load itself is not
/// undoable: it seeds document state rather than editing it, so the
/// undo log is reset and the buffer is marked saved afterward.
pub fn load_bytes(buf: &mut Buffer, bytes: &[u8]) {
    if bytes.is_empty() {
        return;
    }
    let has_crlf = bytes.windows(2).any(|w| w == b"\r\n");
    let mut rows: Vec<Vec<u8>> = Vec::new();
    let mut cur = Vec::new();
    for &b in bytes {
        if b == b'\n' {
            if has_crlf && cur.last() == Some(&b'\r') {
                cur.pop();
            }
            rows.push(std::mem::take(&mut cur));
        } else {
            cur.push(b);
        }
    }
    rows.push(cur);

    buf.is_crlf = has_crlf;
    clipboard_ops::insert_rows_at_cursor(buf, &rows);
    buf.cur_line = buf.lines.head();
    buf.cur_pos = 0;
    buf.undo = UndoLog::new();
    buf.mark_saved();
}

fn read_only_guard(opt: &Options) -> OpResult {
    if opt.read_only { Err(ErrorKind::FileIsReadOnly) } else { Ok(()) }
}

/// Encodes a codepoint the way the buffer's encoding requires.
fn encode_cp(cp: u32, enc: Encoding) -> Vec<u8> {
    match enc {
        Encoding::Ascii | Encoding::EightBit => vec![cp as u8],
        Encoding::Utf8 => char::from_u32(cp)
            .map(|c| c.to_string().into_bytes())
            .unwrap_or_else(|| vec![cp as u8]),
    }
}

/// **InsertChar(c)**. `cp = 0` is rejected outright; promotion,
/// overwrite-delete, and FreeForm padding are all applied before the
/// byte-level insert.
pub fn insert_char(buf: &mut Buffer, cp: u32) -> OpResult {
    read_only_guard(&buf.opt)?;
    if cp == 0 {
        return Err(ErrorKind::CantInsert0);
    }

    match encoding::promotion_for_insert(buf.encoding, cp, buf.opt.utf8auto) {
        Promotion::Reject => return Err(ErrorKind::InvalidCharacter),
        Promotion::To(enc) => {
            buf.encoding = enc;
            trace!(target: "editops", ?enc, "encoding_promoted");
        }
        Promotion::Stay => {}
    }

    buf.undo.begin_chain();

    let line_len = buf.cur_line_len();
    if buf.cur_pos > line_len {
        // FreeForm: pad with spaces up to cur_pos before inserting.
        let pad = buf.cur_pos - line_len;
        let padding = vec![b' '; pad];
        buf.lines.insert_bytes(buf.cur_line, line_len, &padding);
        buf.undo.push(UndoRecord::Bytes { line: buf.cur_line, pos: line_len, removed: Vec::new(), inserted: padding });
    } else if !buf.opt.insert && buf.cur_pos < line_len {
        // Overwrite mode: delete the codepoint under the cursor first.
        let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
        let next = encoding::next_pos(&bytes, buf.cur_pos, buf.encoding);
        let removed = buf.lines.delete_bytes(buf.cur_line, buf.cur_pos, next - buf.cur_pos);
        buf.undo.push(UndoRecord::Bytes { line: buf.cur_line, pos: buf.cur_pos, removed, inserted: Vec::new() });
    }

    let encoded = encode_cp(cp, buf.encoding);
    buf.lines.insert_bytes(buf.cur_line, buf.cur_pos, &encoded);
    buf.undo.push(UndoRecord::Bytes { line: buf.cur_line, pos: buf.cur_pos, removed: Vec::new(), inserted: encoded.clone() });
    buf.undo.end_chain();

    buf.cur_pos += encoded.len();
    buf.cur_char += 1;
    buf.attrs.invalidate();
    Ok(())
}

/// Decides whether word-wrap should trigger after an insertion:
/// `word_wrap` is on and the visual column has gone past the margin.
/// Wrap is only evaluated against the buffer's *real* post-pad length,
/// never while `cur_pos` still exceeds it (FreeForm can leave it past
/// end of line).
pub fn should_word_wrap(buf: &Buffer, visual_col: usize, terminal_cols: usize) -> bool {
    if !buf.opt.word_wrap || buf.cur_pos > buf.cur_line_len() {
        return false;
    }
    let margin = if buf.opt.right_margin == 0 {
        terminal_cols.saturating_sub(1)
    } else {
        buf.opt.right_margin as usize
    };
    visual_col > margin
}

/// **WordWrap**: splits the current line at the last word break before
/// `break_pos`, carrying leading whitespace to the new line when
/// `auto_indent` is on.
pub fn word_wrap(buf: &mut Buffer, break_pos: usize) -> OpResult {
    let line_bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
    let split_at = line_bytes[..break_pos.min(line_bytes.len())]
        .iter()
        .rposition(|&b| b == b' ' || b == b'\t')
        .map(|p| p + 1)
        .unwrap_or(break_pos);

    let indent: Vec<u8> = if buf.opt.auto_indent {
        line_bytes.iter().take_while(|&&b| b == b' ' || b == b'\t').copied().collect()
    } else {
        Vec::new()
    };

    let new_line = buf.lines.split(buf.cur_line, split_at).ok_or(ErrorKind::Error)?;
    buf.undo.push(UndoRecord::Split { line: buf.cur_line, pos: split_at, new_line });

    if !indent.is_empty() {
        buf.lines.insert_bytes(new_line, 0, &indent);
        buf.undo.push(UndoRecord::Bytes { line: new_line, pos: 0, removed: Vec::new(), inserted: indent.clone() });
    }

    let preserved_col = buf.cur_pos.saturating_sub(split_at);
    buf.cur_line = new_line;
    buf.cur_pos = indent.len() + preserved_col;
    buf.attrs.invalidate();
    Ok(())
}

/// **Backspace** (one repetition): joins with the previous line at
/// column 0, otherwise deletes one codepoint to the left. Tab-aware
/// space collapse removes a whole run of spaces back to the previous
/// tab stop as one logical unit when `!opt.tabs`.
pub fn backspace(buf: &mut Buffer) -> OpResult {
    read_only_guard(&buf.opt)?;
    if buf.cur_pos == 0 {
        let Some(prev) = buf.lines.prev_of(buf.cur_line) else {
            return Err(ErrorKind::Error);
        };
        let prev_len = buf.lines.line(prev).map(|l| l.len()).unwrap_or(0);
        let removed = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
        let removed_state = buf.lines.line(buf.cur_line).unwrap().incoming_state;
        buf.lines.join_with_next(prev);
        buf.undo.push(UndoRecord::Join { line: prev, pos: prev_len, removed, removed_state });
        buf.cur_line = prev;
        buf.cur_pos = prev_len;
        buf.attrs.invalidate();
        return Ok(());
    }

    let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
    if !buf.opt.tabs {
        let tab_size = buf.opt.tab_size.max(1) as usize;
        if buf.cur_pos % tab_size == 0 {
            let mut start = buf.cur_pos;
            while start > 0 && bytes[start - 1] == b' ' && (buf.cur_pos - start) < tab_size {
                start -= 1;
            }
            if start < buf.cur_pos && start % tab_size == 0 {
                let removed = buf.lines.delete_bytes(buf.cur_line, start, buf.cur_pos - start);
                buf.undo.push(UndoRecord::Bytes { line: buf.cur_line, pos: start, removed, inserted: Vec::new() });
                buf.cur_pos = start;
                buf.attrs.invalidate();
                return Ok(());
            }
        }
    }

    let prev_pos = encoding::prev_pos(&bytes, buf.cur_pos, buf.encoding);
    let removed = buf.lines.delete_bytes(buf.cur_line, prev_pos, buf.cur_pos - prev_pos);
    buf.undo.push(UndoRecord::Bytes { line: buf.cur_line, pos: prev_pos, removed, inserted: Vec::new() });
    buf.cur_pos = prev_pos;
    buf.cur_char = buf.cur_char.saturating_sub(1);
    buf.attrs.invalidate();
    Ok(())
}

/// **DeleteChar** (one repetition): deletes the codepoint under the
/// cursor, joining with the next line at end-of-line. A no-op (not an
/// error) at true end-of-buffer.
pub fn delete_char(buf: &mut Buffer) -> OpResult {
    read_only_guard(&buf.opt)?;
    let line_len = buf.cur_line_len();
    if buf.cur_pos >= line_len {
        if buf.lines.next_of(buf.cur_line).is_none() {
            return Ok(()); // end of buffer: no-op
        }
        let was_empty = line_len == 0;
        let next_state = buf.lines.next_of(buf.cur_line).and_then(|n| buf.lines.line(n)).map(|l| l.incoming_state);
        let next_bytes = buf.lines.next_of(buf.cur_line).and_then(|n| buf.lines.line(n)).map(|l| l.bytes.clone()).unwrap_or_default();
        buf.lines.join_with_next(buf.cur_line);
        buf.undo.push(UndoRecord::Join {
            line: buf.cur_line,
            pos: line_len,
            removed: next_bytes,
            removed_state: next_state.unwrap_or_default(),
        });
        if was_empty {
            // preserve the (now-current) line's incoming state across the join
        }
        buf.attrs.invalidate();
        return Ok(());
    }
    let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
    let next = encoding::next_pos(&bytes, buf.cur_pos, buf.encoding);
    let removed = buf.lines.delete_bytes(buf.cur_line, buf.cur_pos, next - buf.cur_pos);
    buf.undo.push(UndoRecord::Bytes { line: buf.cur_line, pos: buf.cur_pos, removed, inserted: Vec::new() });
    buf.attrs.invalidate();
    Ok(())
}

/// **InsertLine**: splits at `min(cur_pos, line_len)`; auto-indent
/// inherits leading whitespace from the original line, capped at its
/// own length.
pub fn insert_line(buf: &mut Buffer) -> OpResult {
    read_only_guard(&buf.opt)?;
    let line_len = buf.cur_line_len();
    let split_at = buf.cur_pos.min(line_len);
    let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();

    let new_line = buf.lines.split(buf.cur_line, split_at).ok_or(ErrorKind::Error)?;
    buf.undo.begin_chain();
    buf.undo.push(UndoRecord::Split { line: buf.cur_line, pos: split_at, new_line });

    if buf.opt.auto_indent {
        let indent: Vec<u8> = bytes.iter().take_while(|&&b| b == b' ' || b == b'\t').copied().collect();
        if !indent.is_empty() {
            buf.lines.insert_bytes(new_line, 0, &indent);
            buf.undo.push(UndoRecord::Bytes { line: new_line, pos: 0, removed: Vec::new(), inserted: indent.clone() });
            buf.cur_pos = indent.len();
        } else {
            buf.cur_pos = 0;
        }
    } else {
        buf.cur_pos = 0;
    }
    buf.undo.end_chain();

    buf.cur_line = new_line;
    buf.cur_char = 0;
    buf.attrs.invalidate();
    Ok(())
}

/// **DeleteLine**: removes the current line entirely, advancing the
/// cursor to its successor (or predecessor at end-of-buffer) before the
/// arena retires the old id. Pushes the removed content onto
/// `buf.deleted_lines` for `UndelLine`.
pub fn delete_line(buf: &mut Buffer) -> OpResult {
    read_only_guard(&buf.opt)?;
    let after = buf.lines.prev_of(buf.cur_line).unwrap_or(buf.cur_line);
    let Some((bytes, state, successor)) = buf.lines.delete_line(buf.cur_line) else {
        return Ok(()); // last line in the buffer: refuse silently
    };
    buf.undo.push(UndoRecord::DeleteLine { after, line: buf.cur_line, bytes: bytes.clone(), state });
    buf.deleted_lines.push((bytes, state));
    buf.cur_line = successor.unwrap_or(buf.cur_line);
    buf.cur_pos = 0;
    buf.cur_char = 0;
    buf.attrs.invalidate();
    Ok(())
}

/// **UndelLine**: reinserts the most recently deleted line above the
/// current one.
pub fn undel_line(buf: &mut Buffer) -> OpResult {
    read_only_guard(&buf.opt)?;
    let Some((bytes, state)) = buf.deleted_lines.pop() else {
        return Err(ErrorKind::Error);
    };
    let after = buf.lines.prev_of(buf.cur_line);
    let new_line = buf.lines.undelete_line_above(buf.cur_line, bytes.clone(), state);
    if let Some(after) = after {
        buf.undo.push(UndoRecord::InsertLine { after, new_line, bytes, state });
    }
    buf.cur_line = new_line;
    buf.cur_pos = 0;
    Ok(())
}

/// **DeleteEol**: deletes from the cursor to end of line (no newline
/// join).
pub fn delete_eol(buf: &mut Buffer) -> OpResult {
    read_only_guard(&buf.opt)?;
    let len = buf.cur_line_len();
    if buf.cur_pos >= len {
        return Ok(());
    }
    let removed = buf.lines.delete_bytes(buf.cur_line, buf.cur_pos, len - buf.cur_pos);
    buf.undo.push(UndoRecord::Bytes { line: buf.cur_line, pos: buf.cur_pos, removed, inserted: Vec::new() });
    buf.attrs.invalidate();
    Ok(())
}

/// **NextWord**: steps past the rest of the current word, if any, then
/// past any whitespace (crossing line breaks), landing on the first
/// codepoint of the following word. A no-op at end-of-buffer.
pub fn next_word(buf: &mut Buffer) {
    loop {
        let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
        if buf.cur_pos >= bytes.len() {
            break;
        }
        let cp = encoding::get_char(&bytes, buf.cur_pos, buf.encoding).unwrap();
        if classify(cp) == CharClass::Whitespace {
            break;
        }
        buf.cur_pos = encoding::next_pos(&bytes, buf.cur_pos, buf.encoding);
    }
    loop {
        let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
        if buf.cur_pos < bytes.len() {
            let cp = encoding::get_char(&bytes, buf.cur_pos, buf.encoding).unwrap();
            if classify(cp) != CharClass::Whitespace {
                return;
            }
            buf.cur_pos = encoding::next_pos(&bytes, buf.cur_pos, buf.encoding);
        } else {
            match buf.lines.next_of(buf.cur_line) {
                Some(next) => {
                    buf.cur_line = next;
                    buf.cur_pos = 0;
                }
                None => return,
            }
        }
    }
}

/// **PrevWord**: steps back across any whitespace (crossing line
/// breaks), then back through the run of codepoints in the same class,
/// landing on the first codepoint of that word. A no-op at
/// start-of-buffer.
pub fn prev_word(buf: &mut Buffer) {
    loop {
        if buf.cur_pos == 0 {
            match buf.lines.prev_of(buf.cur_line) {
                Some(prev) => {
                    buf.cur_line = prev;
                    buf.cur_pos = buf.cur_line_len();
                    continue;
                }
                None => return,
            }
        }
        let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
        let left_pos = encoding::prev_pos(&bytes, buf.cur_pos, buf.encoding);
        let left_cp = encoding::get_char(&bytes, left_pos, buf.encoding).unwrap();
        if classify(left_cp) != CharClass::Whitespace {
            break;
        }
        buf.cur_pos = left_pos;
    }
    if buf.cur_pos == 0 {
        return;
    }
    loop {
        let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
        let left_pos = encoding::prev_pos(&bytes, buf.cur_pos, buf.encoding);
        if left_pos == 0 {
            buf.cur_pos = left_pos;
            return;
        }
        let left_cp = encoding::get_char(&bytes, left_pos, buf.encoding).unwrap();
        let further_pos = encoding::prev_pos(&bytes, left_pos, buf.encoding);
        let further_cp = encoding::get_char(&bytes, further_pos, buf.encoding).unwrap();
        if !same_word(further_cp, left_cp) {
            buf.cur_pos = left_pos;
            return;
        }
        buf.cur_pos = left_pos;
    }
}

/// **MoveEow**: skips any whitespace the cursor is sitting on, then
/// rides the run of same-class codepoints to its end, leaving `cur_pos`
/// one codepoint past the word's last character.
pub fn word_end(buf: &mut Buffer) {
    loop {
        let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
        if buf.cur_pos < bytes.len() {
            let cp = encoding::get_char(&bytes, buf.cur_pos, buf.encoding).unwrap();
            if classify(cp) != CharClass::Whitespace {
                break;
            }
            buf.cur_pos = encoding::next_pos(&bytes, buf.cur_pos, buf.encoding);
        } else {
            match buf.lines.next_of(buf.cur_line) {
                Some(next) => {
                    buf.cur_line = next;
                    buf.cur_pos = 0;
                }
                None => return,
            }
        }
    }
    let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
    buf.cur_pos = encoding::next_pos(&bytes, buf.cur_pos, buf.encoding);
    loop {
        let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
        if buf.cur_pos >= bytes.len() {
            return;
        }
        let cp = encoding::get_char(&bytes, buf.cur_pos, buf.encoding).unwrap();
        let prev_pos = encoding::prev_pos(&bytes, buf.cur_pos, buf.encoding);
        let prev_cp = encoding::get_char(&bytes, prev_pos, buf.encoding).unwrap();
        if !same_word(prev_cp, cp) {
            return;
        }
        buf.cur_pos = encoding::next_pos(&bytes, buf.cur_pos, buf.encoding);
    }
}

/// Counts the codepoints between `(line, pos)` and `(end_line, end_pos)`,
/// the latter assumed to lie at or after the former in document order.
/// Crossing a line break counts as one step, matching `delete_char`'s
/// treatment of a join as a single deletion.
fn codepoints_between(buf: &Buffer, mut line: LineId, mut pos: usize, end_line: LineId, end_pos: usize) -> usize {
    let mut n = 0usize;
    loop {
        if line == end_line && pos == end_pos {
            return n;
        }
        let len = buf.lines.line(line).map(|l| l.bytes.len()).unwrap_or(0);
        if pos >= len {
            match buf.lines.next_of(line) {
                Some(next) => {
                    line = next;
                    pos = 0;
                    n += 1;
                }
                None => return n,
            }
        } else {
            let bytes = buf.lines.line(line).unwrap().bytes.clone();
            pos = encoding::next_pos(&bytes, pos, buf.encoding);
            n += 1;
        }
    }
}

/// **DeletePrevWord**: moves to the start of the current/previous word,
/// then deletes forward to where the cursor started, as one undo chain.
pub fn delete_prev_word(buf: &mut Buffer) -> OpResult {
    read_only_guard(&buf.opt)?;
    let start_line = buf.cur_line;
    let start_pos = buf.cur_pos;
    prev_word(buf);
    let count = codepoints_between(buf, buf.cur_line, buf.cur_pos, start_line, start_pos);
    buf.undo.begin_chain();
    for _ in 0..count {
        delete_char(buf)?;
    }
    buf.undo.end_chain();
    Ok(())
}

/// **DeleteNextWord**: moves to the start of the following word, then
/// deletes back to where the cursor started, as one undo chain.
pub fn delete_next_word(buf: &mut Buffer) -> OpResult {
    read_only_guard(&buf.opt)?;
    let start_line = buf.cur_line;
    let start_pos = buf.cur_pos;
    next_word(buf);
    let count = codepoints_between(buf, start_line, start_pos, buf.cur_line, buf.cur_pos);
    buf.cur_line = start_line;
    buf.cur_pos = start_pos;
    buf.undo.begin_chain();
    for _ in 0..count {
        delete_char(buf)?;
    }
    buf.undo.end_chain();
    Ok(())
}

/// Transforms the current line's bytes in place via `f`, emitting one
/// undo record for the whole line (used by `ToUpper`/`ToLower`/
/// `Capitalize`/`Center`).
fn transform_line(buf: &mut Buffer, f: impl FnOnce(&[u8]) -> Vec<u8>) -> OpResult {
    read_only_guard(&buf.opt)?;
    let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
    let transformed = f(&bytes);
    if transformed == bytes {
        return Ok(());
    }
    let removed = buf.lines.delete_bytes(buf.cur_line, 0, bytes.len());
    buf.lines.insert_bytes(buf.cur_line, 0, &transformed);
    buf.undo.push(UndoRecord::Bytes { line: buf.cur_line, pos: 0, removed, inserted: transformed });
    buf.attrs.invalidate();
    Ok(())
}

pub fn to_upper(buf: &mut Buffer) -> OpResult {
    transform_line(buf, |b| b.iter().map(|c| c.to_ascii_uppercase()).collect())
}

pub fn to_lower(buf: &mut Buffer) -> OpResult {
    transform_line(buf, |b| b.iter().map(|c| c.to_ascii_lowercase()).collect())
}

pub fn capitalize(buf: &mut Buffer) -> OpResult {
    transform_line(buf, |b| {
        let mut out = b.to_vec();
        let mut at_word_start = true;
        for byte in out.iter_mut() {
            if byte.is_ascii_alphanumeric() {
                if at_word_start {
                    *byte = byte.to_ascii_uppercase();
                }
                at_word_start = false;
            } else {
                at_word_start = true;
            }
        }
        out
    })
}

/// **Center**: left-pads the line by `(right_margin - width) / 2`, after
/// trimming trailing whitespace.
pub fn center(buf: &mut Buffer, terminal_cols: usize) -> OpResult {
    let margin = if buf.opt.right_margin == 0 { terminal_cols } else { buf.opt.right_margin as usize };
    transform_line(buf, |b| {
        let trimmed_end = b.iter().rposition(|&c| c != b' ' && c != b'\t').map(|p| p + 1).unwrap_or(0);
        let start = b.iter().position(|&c| c != b' ' && c != b'\t').unwrap_or(trimmed_end);
        let core = &b[start..trimmed_end];
        let width = core.len();
        let pad = margin.saturating_sub(width) / 2;
        let mut out = vec![b' '; pad];
        out.extend_from_slice(core);
        out
    })
}

/// **Shift**: parses `[<|>] [N] [s|t]` and shifts the current line left
/// or right by `N` spaces (`s`) or tabs (`t`), default right by one tab.
pub fn shift(buf: &mut Buffer, spec: &str) -> OpResult {
    let spec = spec.trim();
    let mut chars = spec.chars().peekable();
    let mut left = false;
    if let Some(&c) = chars.peek() {
        if c == '<' {
            left = true;
            chars.next();
        } else if c == '>' {
            chars.next();
        }
    }
    let rest: String = chars.collect();
    let rest = rest.trim();
    let (num_part, unit) = match rest.chars().last() {
        Some('s') => (&rest[..rest.len() - 1], 's'),
        Some('t') => (&rest[..rest.len() - 1], 't'),
        _ => (rest, 't'),
    };
    let n: usize = num_part.trim().parse().unwrap_or(1).max(1);
    let unit_bytes: Vec<u8> = if unit == 's' { vec![b' '; n] } else { vec![b'\t'; n] };

    read_only_guard(&buf.opt)?;
    if left {
        let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
        let strip = unit_bytes.len().min(bytes.iter().take_while(|&&b| b == b' ' || b == b'\t').count());
        if strip > 0 {
            let removed = buf.lines.delete_bytes(buf.cur_line, 0, strip);
            buf.undo.push(UndoRecord::Bytes { line: buf.cur_line, pos: 0, removed, inserted: Vec::new() });
        }
    } else {
        buf.lines.insert_bytes(buf.cur_line, 0, &unit_bytes);
        buf.undo.push(UndoRecord::Bytes { line: buf.cur_line, pos: 0, removed: Vec::new(), inserted: unit_bytes });
    }
    buf.attrs.invalidate();
    Ok(())
}

fn is_blank_line(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == b' ' || b == b'\t')
}

/// **Paragraph**: rewraps the contiguous run of non-blank lines around
/// the cursor to `right_margin` (or `terminal_cols` when unset),
/// preserving the first line's leading indent on every wrapped line. A
/// no-op when the cursor sits on a blank line.
pub fn paragraph(buf: &mut Buffer, terminal_cols: usize) -> OpResult {
    read_only_guard(&buf.opt)?;
    let margin = if buf.opt.right_margin == 0 { terminal_cols } else { buf.opt.right_margin as usize };

    if is_blank_line(&buf.lines.line(buf.cur_line).unwrap().bytes) {
        return Ok(());
    }

    let mut first = buf.cur_line;
    while let Some(prev) = buf.lines.prev_of(first) {
        if is_blank_line(&buf.lines.line(prev).unwrap().bytes) {
            break;
        }
        first = prev;
    }
    let mut last = buf.cur_line;
    while let Some(next) = buf.lines.next_of(last) {
        if is_blank_line(&buf.lines.line(next).unwrap().bytes) {
            break;
        }
        last = next;
    }

    let first_bytes = buf.lines.line(first).unwrap().bytes.clone();
    let indent: Vec<u8> = first_bytes.iter().take_while(|&&b| b == b' ' || b == b'\t').copied().collect();

    let mut words: Vec<Vec<u8>> = Vec::new();
    let mut cur = first;
    loop {
        let bytes = buf.lines.line(cur).unwrap().bytes.clone();
        words.extend(bytes.split(|&b| b == b' ' || b == b'\t').filter(|w| !w.is_empty()).map(|w| w.to_vec()));
        if cur == last {
            break;
        }
        cur = buf.lines.next_of(cur).unwrap();
    }

    let mut rows: Vec<Vec<u8>> = Vec::new();
    let mut row = indent.clone();
    let mut row_has_word = false;
    for word in words {
        let extra = if row_has_word { 1 } else { 0 };
        if row_has_word && row.len() + extra + word.len() > margin {
            rows.push(std::mem::replace(&mut row, indent.clone()));
            row_has_word = false;
        }
        if row_has_word {
            row.push(b' ');
        }
        row.extend_from_slice(&word);
        row_has_word = true;
    }
    rows.push(row);

    buf.undo.begin_chain();

    if first != last {
        let after = first;
        let mut cur = buf.lines.next_of(first).unwrap();
        loop {
            let next = buf.lines.next_of(cur);
            if let Some((bytes, state, _)) = buf.lines.delete_line(cur) {
                buf.undo.push(UndoRecord::DeleteLine { after, line: cur, bytes, state });
            }
            if cur == last {
                break;
            }
            cur = next.unwrap();
        }
    }

    let removed = buf.lines.delete_bytes(first, 0, first_bytes.len());
    buf.lines.insert_bytes(first, 0, &rows[0]);
    buf.undo.push(UndoRecord::Bytes { line: first, pos: 0, removed, inserted: rows[0].clone() });

    let mut after = first;
    for row in &rows[1..] {
        let state = buf.lines.line(after).unwrap().incoming_state;
        let new_line = buf.lines.insert_line_after(after, row.clone(), state);
        buf.undo.push(UndoRecord::InsertLine { after, new_line, bytes: row.clone(), state });
        after = new_line;
    }

    buf.undo.end_chain();

    buf.cur_line = first;
    buf.cur_pos = 0;
    buf.cur_char = 0;
    buf.attrs.invalidate();
    Ok(())
}

/// A trivial helper so callers that only have a `LineId` and not a
/// `Buffer` (e.g. the macro engine replaying structural records) can
/// still express "no highlight state yet".
pub fn fresh_state() -> HighlightState {
    HighlightState::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::Buffer;

    #[test]
    fn insert_then_backspace_is_identity() {
        let mut buf = Buffer::new();
        insert_char(&mut buf, 'a' as u32).unwrap();
        insert_char(&mut buf, 'b' as u32).unwrap();
        let before = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
        backspace(&mut buf).unwrap();
        insert_char(&mut buf, 'b' as u32).unwrap();
        assert_eq!(buf.lines.line(buf.cur_line).unwrap().bytes, before);
    }

    #[test]
    fn insert_char_zero_is_rejected() {
        let mut buf = Buffer::new();
        assert_eq!(insert_char(&mut buf, 0), Err(ErrorKind::CantInsert0));
    }

    #[test]
    fn overwrite_mode_replaces_char_under_cursor() {
        let mut buf = Buffer::new();
        buf.opt.insert = true;
        insert_char(&mut buf, 'a' as u32).unwrap();
        insert_char(&mut buf, 'b' as u32).unwrap();
        buf.cur_pos = 0;
        buf.opt.insert = false;
        insert_char(&mut buf, 'X' as u32).unwrap();
        assert_eq!(buf.lines.line(buf.cur_line).unwrap().bytes, b"Xb");
    }

    #[test]
    fn backspace_at_document_start_errors() {
        let mut buf = Buffer::new();
        assert_eq!(backspace(&mut buf), Err(ErrorKind::Error));
    }

    #[test]
    fn delete_char_at_end_of_buffer_is_noop() {
        let mut buf = Buffer::new();
        assert_eq!(delete_char(&mut buf), Ok(()));
    }

    #[test]
    fn delete_line_then_undel_restores_content() {
        let mut buf = Buffer::new();
        insert_char(&mut buf, 'a' as u32).unwrap();
        insert_line(&mut buf).unwrap();
        insert_char(&mut buf, 'b' as u32).unwrap();
        buf.cur_line = buf.lines.head();
        delete_line(&mut buf).unwrap();
        assert_eq!(buf.lines.len(), 1);
        undel_line(&mut buf).unwrap();
        assert_eq!(buf.lines.len(), 2);
        assert_eq!(buf.lines.line(buf.lines.head()).unwrap().bytes, b"a");
    }

    #[test]
    fn read_only_guard_blocks_mutation() {
        let mut buf = Buffer::new();
        buf.opt.read_only = true;
        assert_eq!(insert_char(&mut buf, 'a' as u32), Err(ErrorKind::FileIsReadOnly));
    }

    #[test]
    fn center_pads_symmetrically() {
        let mut buf = Buffer::new();
        buf.lines.insert_bytes(buf.cur_line, 0, b"hi");
        center(&mut buf, 10).unwrap();
        let bytes = &buf.lines.line(buf.cur_line).unwrap().bytes;
        assert_eq!(bytes.len(), 4 + 2); // (10-2)/2 == 4 spaces of padding
    }

    #[test]
    fn paragraph_rewraps_to_margin_preserving_indent() {
        let mut buf = Buffer::new();
        buf.lines.insert_bytes(buf.cur_line, 0, b"  one two three four five six");
        paragraph(&mut buf, 12).unwrap();
        assert_eq!(buf.cur_line, buf.lines.head());
        assert_eq!(buf.cur_pos, 0);
        let mut cur = buf.lines.head();
        loop {
            let bytes = &buf.lines.line(cur).unwrap().bytes;
            assert!(bytes.len() <= 12);
            assert!(bytes.starts_with(b"  "));
            match buf.lines.next_of(cur) {
                Some(next) => cur = next,
                None => break,
            }
        }
    }

    #[test]
    fn paragraph_on_blank_line_is_noop() {
        let mut buf = Buffer::new();
        paragraph(&mut buf, 20).unwrap();
        assert_eq!(buf.lines.len(), 1);
    }

    #[test]
    fn next_word_and_prev_word_find_boundaries() {
        let mut buf = Buffer::new();
        buf.lines.insert_bytes(buf.cur_line, 0, b"foo bar");
        buf.cur_pos = 0;
        next_word(&mut buf);
        assert_eq!(buf.cur_pos, 4);
        prev_word(&mut buf);
        assert_eq!(buf.cur_pos, 0);
    }

    #[test]
    fn word_end_lands_past_last_letter() {
        let mut buf = Buffer::new();
        buf.lines.insert_bytes(buf.cur_line, 0, b"foo bar");
        buf.cur_pos = 0;
        word_end(&mut buf);
        assert_eq!(buf.cur_pos, 3);
    }

    #[test]
    fn delete_prev_word_removes_the_word_behind_the_cursor() {
        let mut buf = Buffer::new();
        buf.lines.insert_bytes(buf.cur_line, 0, b"foo bar");
        buf.cur_pos = 7;
        delete_prev_word(&mut buf).unwrap();
        assert_eq!(buf.lines.line(buf.cur_line).unwrap().bytes, b"foo ");
    }

    #[test]
    fn delete_next_word_removes_the_word_ahead_of_the_cursor() {
        let mut buf = Buffer::new();
        buf.lines.insert_bytes(buf.cur_line, 0, b"foo bar");
        buf.cur_pos = 0;
        delete_next_word(&mut buf).unwrap();
        assert_eq!(buf.lines.line(buf.cur_line).unwrap().bytes, b"bar");
    }
}
