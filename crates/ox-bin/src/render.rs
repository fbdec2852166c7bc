//! Full-screen repaint: no incremental dirty tracking in this build.
//! `Display::update_line`/`scroll_window` are no-ops and every cycle
//! redraws the whole visible window instead.

use std::io::Write;

use core_state::Buffer;
use core_text::LineId;
use crossterm::cursor::MoveTo;
use crossterm::style::Print;
use crossterm::terminal;
use crossterm::QueueableCommand;

/// Counts how many lines precede `target`, walking from `from`. Returns
/// `None` if `target` is not reachable forward from `from`.
fn offset_from(buf: &Buffer, from: LineId, target: LineId) -> Option<usize> {
    let mut id = from;
    let mut n = 0usize;
    loop {
        if id == target {
            return Some(n);
        }
        id = buf.lines.next_of(id)?;
        n += 1;
    }
}

/// The id of the line `rows` forward of `from`, clamped at the tail.
fn advance(buf: &Buffer, from: LineId, rows: usize) -> LineId {
    let mut id = from;
    for _ in 0..rows {
        match buf.lines.next_of(id) {
            Some(next) => id = next,
            None => break,
        }
    }
    id
}

/// Recomputes the visual column of `buf.cur_pos` within the current
/// line, honoring tab stops the way `dispatcher::maybe_word_wrap` does.
fn visual_col(buf: &Buffer) -> usize {
    let Some(line) = buf.lines.line(buf.cur_line) else { return 0 };
    let tab_size = buf.opt.tab_size.max(1) as usize;
    let mut col = 0usize;
    for &b in &line.bytes[..buf.cur_pos.min(line.bytes.len())] {
        col = core_text::advance_column(col, b as u32, tab_size);
    }
    col
}

/// Scrolls `buf.win_y` (a persisted top-of-window row offset) just far
/// enough to keep the cursor's line inside a `text_rows`-tall window.
fn scroll_into_view(buf: &mut Buffer, text_rows: usize) {
    let cur_row = offset_from(buf, buf.lines.head(), buf.cur_line).unwrap_or(0);
    if cur_row < buf.win_y {
        buf.win_y = cur_row;
    } else if text_rows > 0 && cur_row >= buf.win_y + text_rows {
        buf.win_y = cur_row + 1 - text_rows;
    }
}

pub fn draw(buf: &mut Buffer, filename: Option<&str>) -> std::io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let cols = cols as usize;
    let text_rows = (rows as usize).saturating_sub(1);
    scroll_into_view(buf, text_rows);

    let mut out = std::io::stdout();
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let top = advance(buf, buf.lines.head(), buf.win_y);
    let mut id = Some(top);
    for row in 0..text_rows {
        out.queue(MoveTo(0, row as u16))?;
        let Some(line_id) = id else { break };
        if let Some(line) = buf.lines.line(line_id) {
            let text = String::from_utf8_lossy(&line.bytes);
            let clipped: String = text.chars().take(cols).collect();
            out.queue(Print(clipped))?;
        }
        id = buf.lines.next_of(line_id);
    }

    let cursor_row = offset_from(buf, buf.lines.head(), buf.cur_line).unwrap_or(0);
    let col = visual_col(buf);

    out.queue(MoveTo(0, rows.saturating_sub(1)))?;
    let name = filename.unwrap_or("untitled");
    let modified = if buf.is_modified() { "[+]" } else { "" };
    let status = format!("{name} {modified}  L{}:C{}", cursor_row + 1, col + 1);
    let status_line: String = status.chars().take(cols).collect();
    out.queue(Print(status_line))?;

    let screen_row = cursor_row.saturating_sub(buf.win_y).min(text_rows.saturating_sub(1)) as u16;
    let screen_col = col.min(cols.saturating_sub(1)) as u16;
    out.queue(MoveTo(screen_col, screen_row))?;
    out.flush()
}
