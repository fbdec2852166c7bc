//! Selection and clipboard mutations (C7): linear and rectangular
//! copy/cut/paste/erase, plus the `THROUGH` external-filter pipeline.
//!
//! Applying a clip to a `LineStore` is this module's job; clip *storage*
//! and the pure rectangle arithmetic live in `core_state::clipboard`.

use core_collab::Subprocess;
use core_state::clipboard::extract_rectangle;
use core_state::{Buffer, Clip, Clipboards, ErrorKind, UndoRecord};
use core_text::{HighlightState, LineId};

/// Normalized selection bounds: `(start_line, start_pos, end_line, end_pos)`
/// in document order, regardless of which endpoint is the mark and which
/// is the cursor.
pub fn selection_bounds(buf: &Buffer) -> Option<(LineId, usize, LineId, usize)> {
    let origin = buf.mark_origin?;
    let (a_line, a_pos) = (origin.line, origin.col);
    let (b_line, b_pos) = (buf.cur_line, buf.cur_pos);
    if a_line == b_line {
        let (lo, hi) = if a_pos <= b_pos { (a_pos, b_pos) } else { (b_pos, a_pos) };
        return Some((a_line, lo, a_line, hi));
    }
    let mut cur = a_line;
    while let Some(next) = buf.lines.next_of(cur) {
        if next == b_line {
            return Some((a_line, a_pos, b_line, b_pos));
        }
        cur = next;
    }
    Some((b_line, b_pos, a_line, a_pos))
}

fn collect_ids(buf: &Buffer, start: LineId, end: LineId) -> Vec<LineId> {
    let mut ids = vec![start];
    let mut cur = start;
    while cur != end {
        cur = buf.lines.next_of(cur).expect("end must be reachable from start");
        ids.push(cur);
    }
    ids
}

/// Reads (without mutating) the text between `start`/`end` as rows: the
/// first/last row is clipped to `start_pos`/`end_pos`, rows in between
/// are taken whole.
pub fn extract_range(buf: &Buffer, start_line: LineId, start_pos: usize, end_line: LineId, end_pos: usize) -> Vec<Vec<u8>> {
    let ids = collect_ids(buf, start_line, end_line);
    ids.iter()
        .enumerate()
        .map(|(i, &id)| {
            let bytes = &buf.lines.line(id).unwrap().bytes;
            if ids.len() == 1 {
                bytes[start_pos.min(bytes.len())..end_pos.min(bytes.len())].to_vec()
            } else if i == 0 {
                bytes[start_pos.min(bytes.len())..].to_vec()
            } else if i == ids.len() - 1 {
                bytes[..end_pos.min(bytes.len())].to_vec()
            } else {
                bytes.clone()
            }
        })
        .collect()
}

/// Deletes the text between `start`/`end`, merging the surviving
/// fragments of the first and last row into one line, and returns what
/// was removed as rows (same shape `extract_range` would have produced).
/// Leaves the cursor at the start of the former selection.
pub fn remove_range(buf: &mut Buffer, start_line: LineId, start_pos: usize, end_line: LineId, end_pos: usize) -> Vec<Vec<u8>> {
    let ids = collect_ids(buf, start_line, end_line);
    let rows = extract_range(buf, start_line, start_pos, end_line, end_pos);

    buf.undo.begin_chain();
    if ids.len() == 1 {
        let removed = buf.lines.delete_bytes(start_line, start_pos, end_pos - start_pos);
        buf.undo.push(UndoRecord::Bytes { line: start_line, pos: start_pos, removed, inserted: Vec::new() });
    } else {
        let last_removed = buf.lines.delete_bytes(end_line, 0, end_pos);
        buf.undo.push(UndoRecord::Bytes { line: end_line, pos: 0, removed: last_removed, inserted: Vec::new() });

        for &id in &ids[1..ids.len() - 1] {
            let after = buf.lines.prev_of(id).unwrap();
            if let Some((bytes, state, _)) = buf.lines.delete_line(id) {
                buf.undo.push(UndoRecord::DeleteLine { after, line: id, bytes, state });
            }
        }

        let start_len = buf.lines.line(start_line).unwrap().len();
        let removed = buf.lines.delete_bytes(start_line, start_pos, start_len - start_pos);
        buf.undo.push(UndoRecord::Bytes { line: start_line, pos: start_pos, removed, inserted: Vec::new() });

        let next_bytes = buf.lines.line(end_line).unwrap().bytes.clone();
        let next_state = buf.lines.line(end_line).unwrap().incoming_state;
        let join_pos = buf.lines.line(start_line).unwrap().len();
        buf.lines.join_with_next(start_line);
        buf.undo.push(UndoRecord::Join { line: start_line, pos: join_pos, removed: next_bytes, removed_state: next_state });
    }
    buf.undo.end_chain();

    buf.cur_line = start_line;
    buf.cur_pos = start_pos;
    buf.attrs.invalidate();
    rows
}

/// Inserts `rows` at the cursor, splitting the current line when more
/// than one row is pasted. Leaves the cursor immediately after the
/// pasted text.
pub fn insert_rows_at_cursor(buf: &mut Buffer, rows: &[Vec<u8>]) {
    if rows.is_empty() {
        return;
    }
    if rows.len() == 1 {
        let data = &rows[0];
        buf.lines.insert_bytes(buf.cur_line, buf.cur_pos, data);
        buf.undo.push(UndoRecord::Bytes { line: buf.cur_line, pos: buf.cur_pos, removed: Vec::new(), inserted: data.clone() });
        buf.cur_pos += data.len();
        buf.attrs.invalidate();
        return;
    }

    buf.undo.begin_chain();
    let split_at = buf.cur_pos;
    let new_line = buf.lines.split(buf.cur_line, split_at).expect("split always succeeds");
    buf.undo.push(UndoRecord::Split { line: buf.cur_line, pos: split_at, new_line });

    let first_len = buf.lines.line(buf.cur_line).unwrap().len();
    buf.lines.insert_bytes(buf.cur_line, first_len, &rows[0]);
    buf.undo.push(UndoRecord::Bytes { line: buf.cur_line, pos: first_len, removed: Vec::new(), inserted: rows[0].clone() });

    let mut after = buf.cur_line;
    for row in &rows[1..rows.len() - 1] {
        let inserted = buf.lines.insert_line_after(after, row.clone(), HighlightState::default());
        buf.undo.push(UndoRecord::InsertLine { after, new_line: inserted, bytes: row.clone(), state: HighlightState::default() });
        after = inserted;
    }

    let last = rows.last().unwrap();
    let last_len = last.len();
    buf.lines.insert_bytes(new_line, 0, last);
    buf.undo.push(UndoRecord::Bytes { line: new_line, pos: 0, removed: Vec::new(), inserted: last.clone() });
    buf.undo.end_chain();

    buf.cur_line = new_line;
    buf.cur_pos = last_len;
    buf.attrs.invalidate();
}

/// **Copy** / **Cut** (linear mode). `cut` additionally removes the
/// selection from the buffer.
pub fn copy_to_clip(buf: &mut Buffer, clips: &mut Clipboards, idx: usize, cut: bool) -> Result<(), ErrorKind> {
    let (sl, sp, el, ep) = selection_bounds(buf).ok_or(ErrorKind::MarkBlockFirst)?;
    let rows = if cut { remove_range(buf, sl, sp, el, ep) } else { extract_range(buf, sl, sp, el, ep) };
    clips.set(idx, Clip { lines: rows, vertical: false });
    buf.clear_marking();
    Ok(())
}

/// **Erase** (linear mode): deletes the selection without touching any
/// clip.
pub fn erase_selection(buf: &mut Buffer) -> Result<(), ErrorKind> {
    let (sl, sp, el, ep) = selection_bounds(buf).ok_or(ErrorKind::MarkBlockFirst)?;
    remove_range(buf, sl, sp, el, ep);
    buf.clear_marking();
    Ok(())
}

/// **Paste** (linear mode).
pub fn paste_from_clip(buf: &mut Buffer, clips: &Clipboards, idx: usize) -> Result<(), ErrorKind> {
    let clip = clips.get(idx).ok_or(ErrorKind::Error)?;
    let rows = clip.lines.clone();
    insert_rows_at_cursor(buf, &rows);
    Ok(())
}

/// **Copy** / **Cut** (vertical/rectangular mode), bounded by
/// `mark_origin.col`/`cur_pos` as the column range.
pub fn copy_vert_to_clip(buf: &mut Buffer, clips: &mut Clipboards, idx: usize, cut: bool) -> Result<(), ErrorKind> {
    let origin = buf.mark_origin.ok_or(ErrorKind::MarkBlockFirst)?;
    let (start_line, end_line) = {
        let a = origin.line;
        let b = buf.cur_line;
        if a == b || is_before(buf, a, b) { (a, b) } else { (b, a) }
    };
    let (col_a, col_b) = (origin.col, buf.cur_pos);
    let (lo, hi) = (col_a.min(col_b), col_a.max(col_b));

    let ids = collect_ids(buf, start_line, end_line);
    let rows: Vec<Vec<u8>> = ids.iter().map(|&id| buf.lines.line(id).unwrap().bytes.clone()).collect();
    let rect = extract_rectangle(&rows, lo, hi);

    if cut {
        buf.undo.begin_chain();
        for &id in &ids {
            let len = buf.lines.line(id).unwrap().len();
            let hi_clamped = hi.min(len);
            if lo < hi_clamped {
                let removed = buf.lines.delete_bytes(id, lo, hi_clamped - lo);
                buf.undo.push(UndoRecord::Bytes { line: id, pos: lo, removed, inserted: Vec::new() });
            }
        }
        buf.undo.end_chain();
        buf.cur_line = start_line;
        buf.cur_pos = lo;
        buf.attrs.invalidate();
    }

    clips.set(idx, Clip { lines: rect, vertical: true });
    buf.clear_marking();
    Ok(())
}

/// Walks forward from `a`; `true` if `b` is reached before running out
/// of lines (i.e. `a` comes no later than `b` in document order).
fn is_before(buf: &Buffer, a: LineId, b: LineId) -> bool {
    let mut cur = a;
    while let Some(next) = buf.lines.next_of(cur) {
        if next == b {
            return true;
        }
        cur = next;
    }
    false
}

fn target_line_ids(buf: &mut Buffer, start: LineId, count: usize) -> Vec<LineId> {
    let mut ids = vec![start];
    let mut last = start;
    while ids.len() < count {
        if let Some(next) = buf.lines.next_of(last) {
            ids.push(next);
            last = next;
        } else {
            let new_line = buf.lines.insert_line_after(last, Vec::new(), HighlightState::default());
            buf.undo.push(UndoRecord::InsertLine { after: last, new_line, bytes: Vec::new(), state: HighlightState::default() });
            ids.push(new_line);
            last = new_line;
        }
    }
    ids
}

/// **Paste** (vertical mode): splices a rectangular clip at the cursor
/// column, extending the buffer with empty lines if the block's bottom
/// row would otherwise land past the last line (pads rather than
/// rejecting or truncating).
pub fn paste_vert_from_clip(buf: &mut Buffer, clips: &Clipboards, idx: usize) -> Result<(), ErrorKind> {
    let clip = clips.get(idx).ok_or(ErrorKind::Error)?;
    let rows = clip.lines.clone();
    if rows.is_empty() {
        return Ok(());
    }
    let col = buf.cur_pos;
    buf.undo.begin_chain();
    let ids = target_line_ids(buf, buf.cur_line, rows.len());
    for (&id, row) in ids.iter().zip(rows.iter()) {
        let line_len = buf.lines.line(id).unwrap().len();
        if line_len < col {
            let pad = vec![b' '; col - line_len];
            buf.lines.insert_bytes(id, line_len, &pad);
            buf.undo.push(UndoRecord::Bytes { line: id, pos: line_len, removed: Vec::new(), inserted: pad });
        }
        buf.lines.insert_bytes(id, col, row);
        buf.undo.push(UndoRecord::Bytes { line: id, pos: col, removed: Vec::new(), inserted: row.clone() });
    }
    buf.undo.end_chain();
    buf.attrs.invalidate();
    Ok(())
}

/// **THROUGH(cmd)**: filters the selection (or nothing, if no mark is
/// active) through an external command. The Subprocess collaborator
/// owns the actual pipe/temp-file mechanics; this function only handles
/// the editing side (extract, filter, erase, paste back) and clip
/// `usize::MAX` bookkeeping.
pub fn through(buf: &mut Buffer, clips: &mut Clipboards, subprocess: &mut dyn Subprocess, cmd: &str) -> Result<(), ErrorKind> {
    let bounds = selection_bounds(buf);
    let input_rows = match bounds {
        Some((sl, sp, el, ep)) => extract_range(buf, sl, sp, el, ep),
        None => Vec::new(),
    };
    let mut stdin = Vec::new();
    for (i, row) in input_rows.iter().enumerate() {
        if i > 0 {
            stdin.push(b'\n');
        }
        stdin.extend_from_slice(row);
    }

    let stdout = subprocess.run_filter(cmd, &stdin).map_err(|_| ErrorKind::ExternalCommandError)?;
    let output_rows: Vec<Vec<u8>> = if stdout.is_empty() {
        Vec::new()
    } else {
        stdout.split(|&b| b == b'\n').map(|r| r.to_vec()).collect()
    };
    clips.set(core_state::THROUGH_CLIP, Clip { lines: output_rows.clone(), vertical: false });

    if let Some((sl, sp, el, ep)) = bounds {
        remove_range(buf, sl, sp, el, ep);
    }
    insert_rows_at_cursor(buf, &output_rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::MarkOrigin;

    fn type_str(buf: &mut Buffer, s: &str) {
        buf.lines.insert_bytes(buf.cur_line, buf.cur_pos, s.as_bytes());
        buf.cur_pos += s.len();
    }

    #[test]
    fn linear_cut_then_paste_round_trips() {
        let mut buf = Buffer::new();
        type_str(&mut buf, "hello world");
        buf.mark_origin = Some(MarkOrigin { line: buf.cur_line, col: 0 });
        buf.cur_pos = 5;
        let mut clips = Clipboards::new();
        copy_to_clip(&mut buf, &mut clips, 1, true).unwrap();
        assert_eq!(buf.lines.line(buf.cur_line).unwrap().bytes, b" world");
        paste_from_clip(&mut buf, &clips, 1).unwrap();
        assert_eq!(buf.lines.line(buf.cur_line).unwrap().bytes, b"hello world");
    }

    #[test]
    fn copy_without_mark_errors() {
        let mut buf = Buffer::new();
        let mut clips = Clipboards::new();
        assert_eq!(copy_to_clip(&mut buf, &mut clips, 0, false), Err(ErrorKind::MarkBlockFirst));
    }

    #[test]
    fn vertical_cut_then_paste_round_trips() {
        let mut buf = Buffer::new();
        let head = buf.cur_line;
        type_str(&mut buf, "abcd");
        let second = buf.lines.insert_line_after(head, b"efgh".to_vec(), HighlightState::default());
        let _third = buf.lines.insert_line_after(second, b"ijkl".to_vec(), HighlightState::default());

        buf.cur_line = head;
        buf.cur_pos = 1;
        buf.mark_origin = Some(MarkOrigin { line: head, col: 1 });
        buf.cur_line = _third;
        buf.cur_pos = 3;

        let mut clips = Clipboards::new();
        copy_vert_to_clip(&mut buf, &mut clips, 2, true).unwrap();
        assert_eq!(buf.lines.line(head).unwrap().bytes, b"ad");
        assert_eq!(buf.lines.line(second).unwrap().bytes, b"eh");
        assert_eq!(buf.lines.line(_third).unwrap().bytes, b"il");

        buf.cur_line = head;
        buf.cur_pos = 1;
        paste_vert_from_clip(&mut buf, &clips, 2).unwrap();
        assert_eq!(buf.lines.line(head).unwrap().bytes, b"abcd");
    }

    struct EchoSubprocess;
    impl Subprocess for EchoSubprocess {
        fn run_filter(&mut self, _cmd: &str, stdin: &[u8]) -> anyhow::Result<Vec<u8>> {
            let mut out = stdin.to_vec();
            out.make_ascii_uppercase();
            Ok(out)
        }
        fn run_interactive(&mut self, _cmd: &str) -> anyhow::Result<i32> {
            Ok(0)
        }
    }

    #[test]
    fn through_filters_selection_and_pastes_result() {
        let mut buf = Buffer::new();
        type_str(&mut buf, "hello");
        buf.mark_origin = Some(MarkOrigin { line: buf.cur_line, col: 0 });
        buf.cur_pos = 5;
        let mut clips = Clipboards::new();
        let mut sub = EchoSubprocess;
        through(&mut buf, &mut clips, &mut sub, "tr a-z A-Z").unwrap();
        assert_eq!(buf.lines.line(buf.cur_line).unwrap().bytes, b"HELLO");
        assert!(clips.get(core_state::THROUGH_CLIP).is_some());
    }
}
