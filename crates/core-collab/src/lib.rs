//! Trait boundaries for everything the core deliberately does not
//! implement: terminal rendering, interactive prompts, filesystem I/O,
//! pattern matching, syntax highlighting, and subprocess plumbing.
//!
//! The dispatcher in `core-actions` is generic over these traits (or
//! takes `&mut dyn Trait`, depending on the call site) so the core can be
//! driven by a real terminal, a headless test harness, or a scripted
//! fuzzer without any change to editing semantics.

use anyhow::Result;
use core_text::HighlightState;

/// What happens when a prompt is presented to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptOutcome<T> {
    Value(T),
    Abort,
}

/// Terminal output. Every method here corresponds to one of the
/// original source's rendering hooks (`print_message`, `update_line`,
/// `scroll_window`, `reset_window`, `refresh_window`,
/// `clear_entire_screen`, `ttysize`); the core only ever asks for a
/// repaint, never performs one itself.
pub trait Display {
    fn print_message(&mut self, msg: &str);
    fn print_error(&mut self, msg: &str) -> bool;
    fn update_line(&mut self, visual_row: usize);
    fn scroll_window(&mut self, by_rows: isize);
    fn reset_window(&mut self);
    fn refresh_window(&mut self);
    fn clear_entire_screen(&mut self);
    /// `(rows, columns)`.
    fn ttysize(&self) -> (usize, usize);
}

/// Interactive prompts for parameters the dispatcher needs but was not
/// given (`intArg < 0`, a missing `stringArg`).
pub trait Prompter {
    fn request_number(&mut self, prompt: &str) -> PromptOutcome<i64>;
    fn request_string(&mut self, prompt: &str) -> PromptOutcome<String>;
    fn request_file(&mut self, prompt: &str) -> PromptOutcome<String>;
    fn request_response(&mut self, prompt: &str, choices: &str) -> PromptOutcome<char>;
    fn request_char(&mut self, prompt: &str) -> PromptOutcome<char>;
    fn request_document(&mut self, prompt: &str) -> PromptOutcome<String>;
    fn get_key_code(&mut self) -> PromptOutcome<u32>;
}

/// Filesystem-shaped persistence. The core treats prefs/syntax file
/// formats as fully opaque; it only ever round-trips through this trait.
pub trait Storage {
    fn load_file(&mut self, path: &str) -> Result<Vec<u8>>;
    fn save_file(&mut self, path: &str, bytes: &[u8]) -> Result<()>;
    fn load_clip(&mut self, path: &str) -> Result<Vec<u8>>;
    fn save_clip(&mut self, path: &str, bytes: &[u8]) -> Result<()>;
    fn load_prefs(&mut self, name: &str) -> Result<Vec<u8>>;
    fn save_prefs(&mut self, name: &str, bytes: &[u8]) -> Result<()>;
    fn load_syntax_by_name(&mut self, name: &str) -> Result<Vec<u8>>;
}

/// A single regex or literal match, in byte offsets within the searched
/// line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

/// Regex/literal search and bracket matching. The core only ever asks
/// "does this pattern match starting here" and "where is the bracket
/// that matches this one"; it never implements the algorithms itself.
pub trait Matchers {
    fn find(&self, haystack: &[u8], pattern: &str, is_regexp: bool, case_sensitive: bool, backward: bool, from: usize) -> Result<Option<MatchSpan>>;
    /// Finds the offset of the bracket matching the one at `pos` in
    /// `haystack`, or `None` if `haystack[pos]` is not a bracket or has
    /// no match.
    fn match_bracket(&self, haystack: &[u8], pos: usize) -> Option<usize>;
}

/// Pure syntax-highlighter contract: parse one line given the state
/// left behind by the previous line, producing the state to hand to the
/// next line and the byte-wise attribute classes for this line.
pub trait SyntaxEngine {
    fn name(&self) -> &str;
    fn parse(&self, line: &[u8], incoming: HighlightState) -> (HighlightState, Vec<u8>);
}

/// Shell-out plumbing for `THROUGH`, `EXEC`, and `SYSTEM`.
pub trait Subprocess {
    /// Runs `cmd` with `stdin` piped to its standard input, returning its
    /// captured standard output. Used by `THROUGH`.
    fn run_filter(&mut self, cmd: &str, stdin: &[u8]) -> Result<Vec<u8>>;
    /// Runs `cmd` interactively (inherits the terminal), used by
    /// `SYSTEM`/`EXEC`. The caller is responsible for dropping and
    /// restoring interactive terminal mode around this call.
    fn run_interactive(&mut self, cmd: &str) -> Result<i32>;
}
