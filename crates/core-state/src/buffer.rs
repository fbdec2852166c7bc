//! The `Buffer` aggregate: one open document.

use core_config::Options;
use core_text::{AttrCache, Encoding, HighlightState, LineId, LineStore};

use crate::bookmarks::Bookmarks;
use crate::clipboard::THROUGH_CLIP;
use crate::undo::UndoLog;

/// A single selection/mark: where marking began.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkOrigin {
    pub line: LineId,
    pub col: usize,
}

/// One open document.
pub struct Buffer {
    pub lines: LineStore,
    pub filename: Option<String>,
    pub is_modified_override: bool,
    pub is_crlf: bool,
    pub encoding: Encoding,

    pub cur_line: LineId,
    pub cur_pos: usize,
    pub cur_char: usize,
    pub cur_y: usize,
    pub cur_x: usize,
    pub win_x: usize,
    pub win_y: usize,

    pub opt: Options,
    pub opt_stack: Vec<Options>,

    pub attrs: AttrCache,
    pub next_state: HighlightState,

    pub undo: UndoLog,

    pub find_string: Option<String>,
    pub replace_string: Option<String>,
    pub find_string_changed: bool,
    pub last_was_regexp: bool,
    pub last_was_replace: bool,

    pub bookmarks: Bookmarks,

    pub marking: bool,
    pub mark_is_vertical: bool,
    pub mark_origin: Option<MarkOrigin>,

    pub command_line: Option<String>,

    /// Lines removed by `DeleteLine`, most recent last, so `UndelLine`
    /// can reinsert them.
    pub deleted_lines: Vec<(Vec<u8>, HighlightState)>,
}

impl Buffer {
    pub fn new() -> Self {
        let lines = LineStore::new();
        let cur_line = lines.head();
        Buffer {
            lines,
            filename: None,
            is_modified_override: false,
            is_crlf: false,
            encoding: Encoding::Ascii,
            cur_line,
            cur_pos: 0,
            cur_char: 0,
            cur_y: 0,
            cur_x: 0,
            win_x: 0,
            win_y: 0,
            opt: Options::default(),
            opt_stack: Vec::new(),
            attrs: AttrCache::default(),
            next_state: HighlightState::default(),
            undo: UndoLog::new(),
            find_string: None,
            replace_string: None,
            find_string_changed: false,
            last_was_regexp: false,
            last_was_replace: false,
            bookmarks: Bookmarks::new(),
            marking: false,
            mark_is_vertical: false,
            mark_origin: None,
            command_line: None,
            deleted_lines: Vec::new(),
        }
    }

    /// `is_modified ≡ (undo.cur_step ≠ undo.last_save_step)`.
    /// `is_modified_override` lets `Modified_A` force the flag without
    /// touching the undo log.
    pub fn is_modified(&self) -> bool {
        self.is_modified_override || self.undo.is_modified()
    }

    pub fn mark_saved(&mut self) {
        self.undo.mark_saved();
        self.is_modified_override = false;
    }

    pub fn cur_line_len(&self) -> usize {
        self.lines.line(self.cur_line).map(|l| l.len()).unwrap_or(0)
    }

    /// `cur_pos` is either within the line, or past it only when
    /// FreeForm is enabled.
    pub fn cur_pos_is_valid(&self) -> bool {
        self.cur_pos <= self.cur_line_len() || self.opt.free_form
    }

    /// Pushes the current `Options` onto a stack (`PushPrefs`).
    pub fn push_prefs(&mut self) {
        self.opt_stack.push(self.opt);
    }

    /// Restores the most recently pushed `Options` (`PopPrefs`).
    pub fn pop_prefs(&mut self) -> bool {
        if let Some(opt) = self.opt_stack.pop() {
            self.opt = opt;
            true
        } else {
            false
        }
    }

    pub fn start_marking(&mut self, vertical: bool) {
        self.marking = true;
        self.mark_is_vertical = vertical;
        self.mark_origin = Some(MarkOrigin { line: self.cur_line, col: self.cur_pos });
    }

    pub fn clear_marking(&mut self) {
        self.marking = false;
        self.mark_origin = None;
    }

    /// Scratch clip index reserved for `THROUGH` (re-exported here for
    /// callers that only have a `Buffer` in scope).
    pub const THROUGH_CLIP: usize = THROUGH_CLIP;
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_has_one_empty_line_and_is_unmodified() {
        let buf = Buffer::new();
        assert_eq!(buf.lines.len(), 1);
        assert!(!buf.is_modified());
    }

    #[test]
    fn push_pop_prefs_round_trips() {
        let mut buf = Buffer::new();
        let original_tab = buf.opt.tab_size;
        buf.push_prefs();
        buf.opt.tab_size = 4;
        assert!(buf.pop_prefs());
        assert_eq!(buf.opt.tab_size, original_tab);
    }

    #[test]
    fn pop_prefs_without_push_is_noop() {
        let mut buf = Buffer::new();
        assert!(!buf.pop_prefs());
    }
}
