//! The undo log (C4): an append-only sequence of inverse edit records,
//! grouped into atomic, nestable *steps*.
//!
//! Unlike a whole-buffer-clone undo stack, each [`UndoRecord`] only
//! describes the one primitive mutation it inverts. Structural records
//! (`Split`/`Join`/`InsertLine`/`DeleteLine`) necessarily produce a new
//! [`LineId`] each time they are replayed (the arena never reuses a
//! retired id's value), `undo`/`redo` take `&mut self` and write the
//! freshly produced id back into the record so the next replay in either
//! direction starts from a live id.

use core_text::{HighlightState, LineId, LineStore};
use tracing::trace;

/// Maximum number of committed steps retained; oldest are dropped first,
/// matching the original source's bounded history.
pub const UNDO_HISTORY_MAX: usize = 1000;

/// One primitive, invertible mutation.
#[derive(Debug, Clone)]
pub enum UndoRecord {
    /// A byte-level edit at `pos` on `line`: `removed` bytes were taken
    /// out and `inserted` bytes put in their place. Covers
    /// `InsertChar`, `Backspace`, `DeleteChar`, and overwrite-replace.
    Bytes { line: LineId, pos: usize, removed: Vec<u8>, inserted: Vec<u8> },
    /// `line` was split at `pos`, producing `new_line` as its successor.
    Split { line: LineId, pos: usize, new_line: LineId },
    /// `line` absorbed its successor at byte offset `pos`; `removed`
    /// holds the successor's former content and highlight state so the
    /// split can be recreated by undo.
    Join { line: LineId, pos: usize, removed: Vec<u8>, removed_state: HighlightState },
    /// A brand new line with `bytes`/`state` was inserted after `after`,
    /// currently identified by `new_line`.
    InsertLine { after: LineId, new_line: LineId, bytes: Vec<u8>, state: HighlightState },
    /// `line` (which sat after `after`) was deleted; `bytes`/`state` are
    /// its former content.
    DeleteLine { after: LineId, line: LineId, bytes: Vec<u8>, state: HighlightState },
}

impl UndoRecord {
    /// Reverses this record's effect on `store`, rewriting any
    /// structural `LineId` fields to the ids the reversal produced.
    fn undo(&mut self, store: &mut LineStore) {
        match self {
            UndoRecord::Bytes { line, pos, removed, inserted } => {
                store.delete_bytes(*line, *pos, inserted.len());
                store.insert_bytes(*line, *pos, removed);
            }
            UndoRecord::Split { line, new_line, .. } => {
                store.join_with_next(*line);
                *new_line = *line; // retired; keep pointing at the surviving line
            }
            UndoRecord::Join { line, pos, removed, removed_state } => {
                if let Some(new_line) = store.split(*line, *pos) {
                    if let Some(l) = store.line_mut(new_line) {
                        l.incoming_state = *removed_state;
                    }
                    let _ = removed;
                }
            }
            UndoRecord::InsertLine { new_line, .. } => {
                store.delete_line(*new_line);
            }
            UndoRecord::DeleteLine { after, line, bytes, state } => {
                let new_id = store.insert_line_after(*after, bytes.clone(), *state);
                *line = new_id;
            }
        }
    }

    /// Reapplies this record's effect on `store` after an undo, rewriting
    /// structural `LineId` fields.
    fn redo(&mut self, store: &mut LineStore) {
        match self {
            UndoRecord::Bytes { line, pos, removed, inserted } => {
                store.delete_bytes(*line, *pos, removed.len());
                store.insert_bytes(*line, *pos, inserted);
            }
            UndoRecord::Split { line, pos, new_line } => {
                if let Some(id) = store.split(*line, *pos) {
                    *new_line = id;
                }
            }
            UndoRecord::Join { line, .. } => {
                store.join_with_next(*line);
            }
            UndoRecord::InsertLine { after, new_line, bytes, state } => {
                let id = store.insert_line_after(*after, bytes.clone(), *state);
                *new_line = id;
            }
            UndoRecord::DeleteLine { line, .. } => {
                store.delete_line(*line);
            }
        }
    }
}

/// A committed, atomic group of records.
#[derive(Debug, Clone)]
struct Step {
    records: Vec<UndoRecord>,
}

/// The per-buffer undo log.
pub struct UndoLog {
    committed: Vec<Step>,
    redo_stack: Vec<Step>,
    /// Records accumulated for the step currently being built (between a
    /// `begin_chain`/`end_chain` pair, or a single un-chained mutation).
    pending: Vec<UndoRecord>,
    /// Nesting depth of open `start_undo_chain`/`end_undo_chain` pairs.
    link_undos: u32,
    /// `AtomicUndo`'s sticky on/off state: once set, every subsequent
    /// mutation is folded into one ever-growing step until switched off.
    atomic_undo: bool,
    enabled: bool,
    last_save_step: usize,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoLog {
    pub fn new() -> Self {
        UndoLog {
            committed: Vec::new(),
            redo_stack: Vec::new(),
            pending: Vec::new(),
            link_undos: 0,
            atomic_undo: false,
            enabled: true,
            last_save_step: 0,
        }
    }

    /// `undo.cur_step`, the number of steps currently applied. Combined
    /// with `last_save_step` this gives `is_modified`.
    pub fn cur_step(&self) -> usize {
        self.committed.len()
    }

    pub fn last_save_step(&self) -> usize {
        self.last_save_step
    }

    pub fn is_modified(&self) -> bool {
        self.cur_step() != self.last_save_step
    }

    pub fn mark_saved(&mut self) {
        self.last_save_step = self.cur_step();
        trace!(target: "undo", step = self.last_save_step, "mark_saved");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// `do_undo = false`: clears the log and resets chain state.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.committed.clear();
        self.redo_stack.clear();
        self.pending.clear();
        self.link_undos = 0;
        self.atomic_undo = false;
        self.last_save_step = 0;
        trace!(target: "undo", "disabled_and_cleared");
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn begin_chain(&mut self) {
        self.link_undos += 1;
        trace!(target: "undo", depth = self.link_undos, "begin_chain");
    }

    /// Closes one level of chain nesting. When depth returns to zero
    /// (and `atomic_undo` is not holding the step open), the pending
    /// records are committed as one step and the redo stack is cleared.
    pub fn end_chain(&mut self) {
        if self.link_undos > 0 {
            self.link_undos -= 1;
        }
        trace!(target: "undo", depth = self.link_undos, "end_chain");
        if self.link_undos == 0 && !self.atomic_undo {
            self.commit_pending();
        }
    }

    /// `AtomicUndo`: `None` toggles, `Some(0)` closes all open
    /// chains, `Some(-1)` closes one, `Some(1)` opens one, any other
    /// value sets the chain depth absolutely.
    pub fn atomic_undo(&mut self, arg: Option<i64>) {
        match arg {
            None => {
                self.atomic_undo = !self.atomic_undo;
                if !self.atomic_undo {
                    self.commit_pending();
                }
            }
            Some(0) => {
                self.atomic_undo = false;
                self.link_undos = 0;
                self.commit_pending();
            }
            Some(-1) => {
                self.atomic_undo = false;
                self.commit_pending();
            }
            Some(1) => {
                self.atomic_undo = true;
            }
            Some(n) => {
                self.link_undos = n.max(0) as u32;
                self.atomic_undo = self.link_undos > 0;
            }
        }
    }

    fn commit_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let records = std::mem::take(&mut self.pending);
        self.committed.push(Step { records });
        self.redo_stack.clear();
        trace!(target: "undo", step = self.cur_step(), "commit_step");
        if self.committed.len() > UNDO_HISTORY_MAX {
            self.committed.remove(0);
            if self.last_save_step > 0 {
                self.last_save_step -= 1;
            }
            trace!(target: "undo", "history_trimmed");
        }
    }

    /// Appends one inverse record to the step under construction. If no
    /// chain is open and `atomic_undo` is not sticky, the record is
    /// immediately committed as its own one-record step.
    pub fn push(&mut self, record: UndoRecord) {
        if !self.enabled {
            return;
        }
        self.pending.push(record);
        trace!(target: "undo", pending = self.pending.len(), "push_record");
        if self.link_undos == 0 && !self.atomic_undo {
            self.commit_pending();
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.committed.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Reverses the most recent step. Returns `false` if there is
    /// nothing to undo.
    pub fn undo(&mut self, store: &mut LineStore) -> bool {
        let Some(mut step) = self.committed.pop() else {
            return false;
        };
        for record in step.records.iter_mut().rev() {
            record.undo(store);
        }
        trace!(target: "undo", undo_depth = self.committed.len(), redo_depth = self.redo_stack.len() + 1, "undo");
        self.redo_stack.push(step);
        true
    }

    /// Reapplies the most recently undone step. Returns `false` if
    /// there is nothing to redo.
    pub fn redo(&mut self, store: &mut LineStore) -> bool {
        let Some(mut step) = self.redo_stack.pop() else {
            return false;
        };
        for record in step.records.iter_mut() {
            record.redo(store);
        }
        trace!(target: "undo", undo_depth = self.committed.len() + 1, redo_depth = self.redo_stack.len(), "redo");
        self.committed.push(step);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::LineStore;

    #[test]
    fn single_insert_undo_redo_round_trips() {
        let mut store = LineStore::new();
        let mut log = UndoLog::new();
        let head = store.head();
        store.insert_bytes(head, 0, b"ab");
        log.push(UndoRecord::Bytes { line: head, pos: 0, removed: Vec::new(), inserted: b"ab".to_vec() });
        assert_eq!(store.line(head).unwrap().bytes, b"ab");
        assert!(log.undo(&mut store));
        assert_eq!(store.line(head).unwrap().bytes, b"");
        assert!(log.redo(&mut store));
        assert_eq!(store.line(head).unwrap().bytes, b"ab");
    }

    #[test]
    fn chain_groups_multiple_records_into_one_step() {
        let mut store = LineStore::new();
        let mut log = UndoLog::new();
        let head = store.head();
        log.begin_chain();
        store.insert_bytes(head, 0, b"a");
        log.push(UndoRecord::Bytes { line: head, pos: 0, removed: Vec::new(), inserted: b"a".to_vec() });
        store.insert_bytes(head, 1, b"b");
        log.push(UndoRecord::Bytes { line: head, pos: 1, removed: Vec::new(), inserted: b"b".to_vec() });
        log.end_chain();
        assert_eq!(log.undo_depth(), 1);
        assert!(log.undo(&mut store));
        assert_eq!(store.line(head).unwrap().bytes, b"");
    }

    #[test]
    fn is_modified_tracks_save_point() {
        let mut store = LineStore::new();
        let mut log = UndoLog::new();
        let head = store.head();
        assert!(!log.is_modified());
        store.insert_bytes(head, 0, b"a");
        log.push(UndoRecord::Bytes { line: head, pos: 0, removed: Vec::new(), inserted: b"a".to_vec() });
        assert!(log.is_modified());
        log.mark_saved();
        assert!(!log.is_modified());
        log.undo(&mut store);
        assert!(log.is_modified());
    }

    #[test]
    fn new_edit_after_undo_clears_redo_stack() {
        let mut store = LineStore::new();
        let mut log = UndoLog::new();
        let head = store.head();
        store.insert_bytes(head, 0, b"a");
        log.push(UndoRecord::Bytes { line: head, pos: 0, removed: Vec::new(), inserted: b"a".to_vec() });
        log.undo(&mut store);
        assert_eq!(log.redo_depth(), 1);
        store.insert_bytes(head, 0, b"c");
        log.push(UndoRecord::Bytes { line: head, pos: 0, removed: Vec::new(), inserted: b"c".to_vec() });
        assert_eq!(log.redo_depth(), 0);
    }

    #[test]
    fn disable_clears_log() {
        let mut store = LineStore::new();
        let mut log = UndoLog::new();
        let head = store.head();
        store.insert_bytes(head, 0, b"a");
        log.push(UndoRecord::Bytes { line: head, pos: 0, removed: Vec::new(), inserted: b"a".to_vec() });
        log.disable();
        assert_eq!(log.undo_depth(), 0);
        assert!(!log.is_enabled());
    }
}
