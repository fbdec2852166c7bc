//! The explicit `EditorContext` (C10): everything the original source
//! kept in process globals, threaded instead as an ordinary value.
//!
//! The only genuinely concurrent actor in this core is the OS signal
//! handler that sets `stop`; everything else here is plain
//! single-threaded state, which is why `EditorContext` is not `Sync`:
//! only the one `AtomicBool` needs cross-context visibility.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use core_config::GlobalOptions;
use tracing::trace;

/// A cooperative cancellation flag a signal handler can flip from
/// outside the main flow of control. Cloning shares the same
/// underlying flag; `EditorContext` hands out clones to anything that
/// needs to request a stop (e.g. a `SIGINT` handler installed by the
/// binary).
#[derive(Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        StopFlag(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Process-wide shared state, passed explicitly to every dispatcher call
/// rather than read from a global.
pub struct EditorContext {
    /// Index of the buffer currently receiving actions, into whatever
    /// ordered document list the caller (`core-model`) maintains.
    pub cur_buffer: usize,
    pub stop: StopFlag,
    /// Set when the current line's highlight attributes need
    /// recomputing before the next redraw.
    pub need_attr_update: bool,
    pub global: GlobalOptions,
    /// Terminal dimensions, refreshed by the Display collaborator.
    pub ne_lines: u16,
    pub ne_columns: u16,
}

impl EditorContext {
    pub fn new(global: GlobalOptions) -> Self {
        EditorContext {
            cur_buffer: 0,
            stop: StopFlag::new(),
            need_attr_update: false,
            global,
            ne_lines: 24,
            ne_columns: 80,
        }
    }

    /// Polled at the head of every repetition loop. Returns `true`
    /// once and clears the flag, so a single `SIGINT` stops exactly one
    /// in-flight repetition.
    pub fn poll_stop(&mut self) -> bool {
        if self.stop.is_set() {
            self.stop.clear();
            trace!(target: "editor_context", "stop_polled_and_cleared");
            true
        } else {
            false
        }
    }

    /// Whether the viewport is tall enough that redraws should defer to
    /// the end of a multi-step operation (the "turbo threshold").
    pub fn over_turbo_threshold(&self, viewport_rows: u16) -> bool {
        self.global.turbo > 0 && viewport_rows > self.global.turbo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_stop_clears_after_reading() {
        let mut ctx = EditorContext::new(GlobalOptions::default());
        assert!(!ctx.poll_stop());
        ctx.stop.set();
        assert!(ctx.poll_stop());
        assert!(!ctx.poll_stop());
    }

    #[test]
    fn stop_flag_clone_shares_state() {
        let flag = StopFlag::new();
        let clone = flag.clone();
        clone.set();
        assert!(flag.is_set());
    }

    #[test]
    fn turbo_threshold_respects_zero_meaning_disabled() {
        let mut global = GlobalOptions::default();
        global.turbo = 0;
        let ctx = EditorContext::new(global);
        assert!(!ctx.over_turbo_threshold(1000));
    }
}
