//! Macro recording and playback (C8).
//!
//! A macro is a lazy sequence of `(Action, intArg, stringArg)` tuples.
//! Dispatch itself (`dispatcher.rs`) is responsible for appending to the
//! current recording on every action it executes; this module only owns
//! the recorded stream, start/stop, optimization, and persistence
//! through [`Storage`].

use core_collab::Storage;
use core_state::ErrorKind;

use crate::action::Action;

/// One recorded step: the action plus the arguments it was actually
/// invoked with (never `UNSPECIFIED`/prompted; macros replay concrete
/// values, not prompts).
#[derive(Clone, Debug, PartialEq)]
pub struct MacroStep {
    pub action: Action,
    pub int_arg: Option<i64>,
    pub string_arg: Option<String>,
}

/// Recording/playback state for one buffer's macro stream.
#[derive(Default)]
pub struct MacroEngine {
    steps: Vec<MacroStep>,
    recording: bool,
    executing: bool,
}

impl MacroEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }

    pub fn steps(&self) -> &[MacroStep] {
        &self.steps
    }

    /// **Record**: toggles recording. Starting clears any previously
    /// recorded stream.
    pub fn toggle_record(&mut self) {
        if self.recording {
            self.recording = false;
        } else {
            self.steps.clear();
            self.recording = true;
        }
    }

    /// Appends one executed step to the stream, a no-op unless currently
    /// recording or while a macro is itself replaying (macros do not
    /// record themselves).
    pub fn record_step(&mut self, action: Action, int_arg: Option<i64>, string_arg: Option<String>) {
        if self.recording && !self.executing {
            self.steps.push(MacroStep { action, int_arg, string_arg });
        }
    }

    /// Collapses adjacent single-character `InsertChar` steps into a
    /// single `InsertString`, shrinking the serialized form without
    /// changing replay semantics.
    pub fn optimize(&mut self) {
        let mut optimized: Vec<MacroStep> = Vec::with_capacity(self.steps.len());
        for step in self.steps.drain(..) {
            if let Action::InsertChar(c) = step.action {
                if let Some(cp) = char::from_u32(c.max(0) as u32) {
                    if let Some(MacroStep { action: Action::InsertString(s), .. }) = optimized.last_mut() {
                        s.push(cp);
                        continue;
                    }
                }
            }
            optimized.push(step);
        }
        self.steps = optimized;
    }

    /// **Play(c)**: returns the steps to replay `c` times, or an error if
    /// called recursively from inside an already-executing macro
    /// (`executing_internal_macro` guards against infinite recursion).
    pub fn begin_play(&mut self, repeat: i64) -> Result<Vec<MacroStep>, ErrorKind> {
        if self.executing {
            return Ok(Vec::new());
        }
        let count = repeat.max(1) as usize;
        let mut out = Vec::with_capacity(self.steps.len() * count);
        for _ in 0..count {
            out.extend(self.steps.iter().cloned());
        }
        self.executing = true;
        Ok(out)
    }

    pub fn end_play(&mut self) {
        self.executing = false;
    }

    /// **UnloadMacros**: drops the recorded stream and leaves recording
    /// and playback both off, whatever state they were in.
    pub fn unload(&mut self) {
        self.steps.clear();
        self.recording = false;
        self.executing = false;
    }

    /// **SaveMacro**: optimizes the stream, then serializes it as one
    /// line per step (`action-name int string`) and hands it to
    /// `Storage`.
    pub fn save(&mut self, storage: &mut dyn Storage, name: &str) -> anyhow::Result<()> {
        self.optimize();
        let mut out = String::new();
        for step in &self.steps {
            out.push_str(&format!("{:?}\t{}\t{}\n", step.action, step.int_arg.unwrap_or(-1), step.string_arg.as_deref().unwrap_or("")));
        }
        storage.save_prefs(name, out.as_bytes())
    }
}
