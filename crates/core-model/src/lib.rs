//! The open-document list: `NewDoc`/`CloseDoc`/`NextDoc`/`PrevDoc`/
//! `SelectDoc` operate here, one level above a single `Buffer`.

use core_config::GlobalOptions;
use core_state::Buffer;
use tracing::{info, trace};

/// The ordered collection of open buffers and which one is current.
pub struct EditorModel {
    buffers: Vec<Buffer>,
    current: usize,
    pub global: GlobalOptions,
}

impl EditorModel {
    /// Starts with exactly one buffer, matching the invariant that the
    /// editor always has a current document.
    pub fn new(global: GlobalOptions) -> Self {
        EditorModel { buffers: vec![Buffer::new()], current: 0, global }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn current(&self) -> &Buffer {
        &self.buffers[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Buffer {
        &mut self.buffers[self.current]
    }

    pub fn get(&self, idx: usize) -> Option<&Buffer> {
        self.buffers.get(idx)
    }

    /// `NewDoc`/successful `Open`: appends a new buffer and makes it
    /// current.
    pub fn new_doc(&mut self, buffer: Buffer) -> usize {
        self.buffers.push(buffer);
        self.current = self.buffers.len() - 1;
        info!(target: "model", count = self.buffers.len(), "new_doc");
        self.current
    }

    /// `CloseDoc`: removes the current buffer. Returns `true` if the
    /// process should now exit (the last buffer just closed). The
    /// caller always treats this action as `Err` regardless, so it
    /// stops acting on the (now possibly stale) buffer reference.
    pub fn close_doc(&mut self) -> bool {
        self.buffers.remove(self.current);
        if self.buffers.is_empty() {
            info!(target: "model", "close_doc_last_buffer_exit");
            return true;
        }
        if self.current >= self.buffers.len() {
            self.current = self.buffers.len() - 1;
        }
        trace!(target: "model", current = self.current, remaining = self.buffers.len(), "close_doc");
        false
    }

    /// `NextDoc`: rotates forward, wrapping.
    pub fn next_doc(&mut self) {
        if self.buffers.len() > 1 {
            self.current = (self.current + 1) % self.buffers.len();
        }
    }

    /// `PrevDoc`: rotates backward, wrapping.
    pub fn prev_doc(&mut self) {
        if self.buffers.len() > 1 {
            self.current = (self.current + self.buffers.len() - 1) % self.buffers.len();
        }
    }

    /// `SelectDoc(n)`: jumps directly to buffer `n`.
    pub fn select_doc(&mut self, n: usize) -> bool {
        if n < self.buffers.len() {
            self.current = n;
            true
        } else {
            false
        }
    }

    pub fn any_modified(&self) -> bool {
        self.buffers.iter().any(|b| b.is_modified())
    }

    pub fn find_by_filename(&self, filename: &str) -> Option<usize> {
        self.buffers
            .iter()
            .position(|b| b.filename.as_deref() == Some(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_one_buffer() {
        let model = EditorModel::new(GlobalOptions::default());
        assert_eq!(model.len(), 1);
        assert_eq!(model.current_index(), 0);
    }

    #[test]
    fn new_doc_becomes_current() {
        let mut model = EditorModel::new(GlobalOptions::default());
        let idx = model.new_doc(Buffer::new());
        assert_eq!(idx, 1);
        assert_eq!(model.current_index(), 1);
    }

    #[test]
    fn close_last_doc_signals_exit() {
        let mut model = EditorModel::new(GlobalOptions::default());
        assert!(model.close_doc());
        assert!(model.is_empty());
    }

    #[test]
    fn next_and_prev_wrap_around() {
        let mut model = EditorModel::new(GlobalOptions::default());
        model.new_doc(Buffer::new());
        model.new_doc(Buffer::new());
        assert_eq!(model.current_index(), 2);
        model.next_doc();
        assert_eq!(model.current_index(), 0);
        model.prev_doc();
        assert_eq!(model.current_index(), 2);
    }

    #[test]
    fn select_doc_out_of_range_fails() {
        let mut model = EditorModel::new(GlobalOptions::default());
        assert!(!model.select_doc(5));
    }
}
