//! End-to-end scenarios driven entirely through `do_action`, exercising
//! the dispatcher the way a real caller would: one action at a time,
//! against small in-memory fakes of the collaborator traits rather than
//! real terminal/filesystem I/O.

use core_actions::{do_action, Action, Collaborators, MacroEngine, StringArg, UNSPECIFIED};
use core_collab::{Display, Matchers, PromptOutcome, Prompter, Storage, Subprocess, SyntaxEngine};
use core_config::GlobalOptions;
use core_events::EditorContext;
use core_model::EditorModel;
use core_state::{Clipboards, DispatchOutcome, ErrorKind};
use core_text::HighlightState;

struct NullDisplay;
impl Display for NullDisplay {
    fn print_message(&mut self, _msg: &str) {}
    fn print_error(&mut self, _msg: &str) -> bool {
        false
    }
    fn update_line(&mut self, _visual_row: usize) {}
    fn scroll_window(&mut self, _by_rows: isize) {}
    fn reset_window(&mut self) {}
    fn refresh_window(&mut self) {}
    fn clear_entire_screen(&mut self) {}
    fn ttysize(&self) -> (usize, usize) {
        (24, 80)
    }
}

/// Replays a fixed script of numeric responses, in order; `Abort` once
/// exhausted. Covers the one scenario here (`GotoLine`-style prompts)
/// that needs a live `Prompter` instead of an already-supplied `int_arg`.
#[derive(Default)]
struct FakePrompter {
    numbers: Vec<i64>,
}

impl Prompter for FakePrompter {
    fn request_number(&mut self, _prompt: &str) -> PromptOutcome<i64> {
        if self.numbers.is_empty() {
            PromptOutcome::Abort
        } else {
            PromptOutcome::Value(self.numbers.remove(0))
        }
    }
    fn request_string(&mut self, _prompt: &str) -> PromptOutcome<String> {
        PromptOutcome::Abort
    }
    fn request_file(&mut self, _prompt: &str) -> PromptOutcome<String> {
        PromptOutcome::Abort
    }
    fn request_response(&mut self, _prompt: &str, _choices: &str) -> PromptOutcome<char> {
        PromptOutcome::Abort
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

/// An in-memory stand-in for a filesystem, keyed by path/name. Good
/// enough to exercise `Save`/`LoadPrefs`/`SavePrefs` without touching a
/// real disk.
#[derive(Default)]
struct FakeStorage {
    files: std::collections::HashMap<String, Vec<u8>>,
    prefs: std::collections::HashMap<String, Vec<u8>>,
}

impl Storage for FakeStorage {
    fn load_file(&mut self, path: &str) -> anyhow::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| anyhow::anyhow!("not found"))
    }
    fn save_file(&mut self, path: &str, bytes: &[u8]) -> anyhow::Result<()> {
        self.files.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
    fn load_clip(&mut self, _path: &str) -> anyhow::Result<Vec<u8>> {
        Ok(Vec::new())
    }
    fn save_clip(&mut self, _path: &str, _bytes: &[u8]) -> anyhow::Result<()> {
        Ok(())
    }
    fn load_prefs(&mut self, name: &str) -> anyhow::Result<Vec<u8>> {
        self.prefs.get(name).cloned().ok_or_else(|| anyhow::anyhow!("not found"))
    }
    fn save_prefs(&mut self, name: &str, bytes: &[u8]) -> anyhow::Result<()> {
        self.prefs.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
    fn load_syntax_by_name(&mut self, _name: &str) -> anyhow::Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

struct NullMatchers;
impl Matchers for NullMatchers {
    fn find(&self, _haystack: &[u8], _pattern: &str, _is_regexp: bool, _case_sensitive: bool, _backward: bool, _from: usize) -> anyhow::Result<Option<core_collab::MatchSpan>> {
        Ok(None)
    }
    fn match_bracket(&self, _haystack: &[u8], _pos: usize) -> Option<usize> {
        None
    }
}

struct NullSubprocess;
impl Subprocess for NullSubprocess {
    fn run_filter(&mut self, _cmd: &str, stdin: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(stdin.to_vec())
    }
    fn run_interactive(&mut self, _cmd: &str) -> anyhow::Result<i32> {
        Ok(0)
    }
}

struct NullSyntax;
impl SyntaxEngine for NullSyntax {
    fn name(&self) -> &str {
        "none"
    }
    fn parse(&self, _line: &[u8], incoming: HighlightState) -> (HighlightState, Vec<u8>) {
        (incoming, Vec::new())
    }
}

/// Bundles every piece of session state one `do_action` call needs, so
/// each scenario only has to name the actions it cares about.
struct Harness {
    ctx: EditorContext,
    model: EditorModel,
    macros: MacroEngine,
    clips: Clipboards,
    display: NullDisplay,
    prompter: FakePrompter,
    storage: FakeStorage,
    matchers: NullMatchers,
    subprocess: NullSubprocess,
    syntax: NullSyntax,
}

impl Harness {
    fn new() -> Self {
        Harness {
            ctx: EditorContext::new(GlobalOptions::default()),
            model: EditorModel::new(GlobalOptions::default()),
            macros: MacroEngine::new(),
            clips: Clipboards::new(),
            display: NullDisplay,
            prompter: FakePrompter::default(),
            storage: FakeStorage::default(),
            matchers: NullMatchers,
            subprocess: NullSubprocess,
            syntax: NullSyntax,
        }
    }

    fn act(&mut self, action: Action, int_arg: i64, string_arg: Option<&str>) -> DispatchOutcome {
        let mut collab = Collaborators {
            display: &mut self.display,
            prompter: &mut self.prompter,
            storage: &mut self.storage,
            matchers: &self.matchers,
            subprocess: &mut self.subprocess,
            syntax: &self.syntax,
        };
        do_action(&mut self.ctx, &mut self.model, &mut self.macros, &mut self.clips, &mut collab, action, int_arg, StringArg::new(string_arg.map(str::to_string)))
    }

    fn line_bytes(&self) -> Vec<u8> {
        let buf = self.model.current();
        buf.lines.line(buf.cur_line).unwrap().bytes.clone()
    }
}

fn type_str(h: &mut Harness, s: &str) {
    for c in s.chars() {
        let out = h.act(Action::InsertChar(c as i64), UNSPECIFIED, None);
        assert_eq!(out, DispatchOutcome::Ok);
    }
}

// 1. Overwrite: empty buffer, opt.insert=false. InsertChar 'a', 'b',
// MoveSOL, InsertChar 'X'. Expected buffer "Xb"; cursor at column 1.
#[test]
fn overwrite_scenario() {
    let mut h = Harness::new();
    h.model.current_mut().opt.insert = false;
    type_str(&mut h, "ab");
    h.act(Action::MoveSol, UNSPECIFIED, None);
    h.act(Action::InsertChar('X' as i64), UNSPECIFIED, None);
    assert_eq!(h.line_bytes(), b"Xb");
    assert_eq!(h.model.current().cur_pos, 1);
}

// 2. Word-wrap: right_margin=5, word_wrap=true, buffer empty.
// InsertString "hello world". Expected: two lines "hello " and "world";
// cursor at line 1, column 5.
#[test]
fn word_wrap_scenario() {
    let mut h = Harness::new();
    h.model.current_mut().opt.word_wrap = true;
    h.model.current_mut().opt.right_margin = 5;
    let out = h.act(Action::InsertString("hello world".to_string()), UNSPECIFIED, Some("hello world"));
    assert_eq!(out, DispatchOutcome::Ok);

    let buf = h.model.current();
    assert_eq!(buf.lines.len(), 2);
    let head = buf.lines.head();
    let second = buf.lines.next_of(head).unwrap();
    assert_eq!(buf.lines.line(head).unwrap().bytes, b"hello ");
    assert_eq!(buf.lines.line(second).unwrap().bytes, b"world");
    assert_eq!(buf.cur_line, second);
    assert_eq!(buf.cur_pos, 5);
}

// 3. Undo-chain atomicity: start chain, InsertChar 'a', InsertChar 'b',
// end chain, Undo. Expected: empty buffer (both chars removed in one
// step).
#[test]
fn undo_chain_atomicity_scenario() {
    let mut h = Harness::new();
    h.act(Action::AtomicUndo(Some(1)), UNSPECIFIED, None);
    h.act(Action::InsertChar('a' as i64), UNSPECIFIED, None);
    h.act(Action::InsertChar('b' as i64), UNSPECIFIED, None);
    h.act(Action::AtomicUndo(Some(0)), UNSPECIFIED, None);
    assert_eq!(h.line_bytes(), b"ab");
    assert_eq!(h.model.current().undo.undo_depth(), 1);

    let out = h.act(Action::Undo, UNSPECIFIED, None);
    assert_eq!(out, DispatchOutcome::Ok);
    assert!(h.line_bytes().is_empty());
}

// 4. Vertical cut-paste: buffer "abcd"/"efgh"/"ijkl". Mark vertical from
// (0,1) to (2,3); Cut; MoveSOF; PasteVert at (0,0). Expected rectangle
// "bcd"/"fgh"/"jkl" spliced back in at the origin.
#[test]
fn vertical_cut_paste_scenario() {
    let mut h = Harness::new();
    let head = h.model.current().lines.head();
    h.model.current_mut().lines.insert_bytes(head, 0, b"abcd");
    let second = h.model.current_mut().lines.insert_line_after(head, b"efgh".to_vec(), HighlightState::default());
    let third = h.model.current_mut().lines.insert_line_after(second, b"ijkl".to_vec(), HighlightState::default());

    {
        let buf = h.model.current_mut();
        buf.cur_line = head;
        buf.cur_pos = 1;
        buf.start_marking(true);
        buf.cur_line = third;
        buf.cur_pos = 3;
    }
    let out = h.act(Action::Cut, UNSPECIFIED, None);
    assert_eq!(out, DispatchOutcome::Ok);
    {
        let buf = h.model.current();
        assert_eq!(buf.lines.line(head).unwrap().bytes, b"ad");
        assert_eq!(buf.lines.line(second).unwrap().bytes, b"eh");
        assert_eq!(buf.lines.line(third).unwrap().bytes, b"il");
    }

    h.act(Action::MoveSof, UNSPECIFIED, None);
    h.model.current_mut().cur_pos = 1;
    let out = h.act(Action::PasteVert, UNSPECIFIED, None);
    assert_eq!(out, DispatchOutcome::Ok);

    let buf = h.model.current();
    assert_eq!(buf.lines.line(head).unwrap().bytes, b"abcd");
    assert_eq!(buf.lines.line(second).unwrap().bytes, b"efgh");
    assert_eq!(buf.lines.line(third).unwrap().bytes, b"ijkl");
}

// 5. Replace-all encoding guard: buffer encoding 8BIT containing byte
// 0xE9. Replace "é" -> "e" where the find string decodes as valid UTF-8.
// Expected: IncompatibleSearchStringEncoding; buffer unchanged.
#[test]
fn replace_all_encoding_guard_scenario() {
    let mut h = Harness::new();
    {
        let buf = h.model.current_mut();
        buf.encoding = core_text::Encoding::EightBit;
        buf.lines.insert_bytes(buf.cur_line, 0, &[b'c', b'a', 0xE9, b'f', b'e']);
    }
    let before = h.line_bytes();

    h.model.current_mut().find_string = Some("é".to_string());
    h.model.current_mut().replace_string = Some("e".to_string());
    let out = h.act(Action::ReplaceAll, UNSPECIFIED, None);
    assert_eq!(out, DispatchOutcome::Err(ErrorKind::IncompatibleSearchStringEncoding));
    assert_eq!(h.line_bytes(), before);
}

// 6. Bookmark +/-1 cycle: set bookmarks 1, 3, 5. GotoBookmark "+1" from
// cursor jumps to the next set slot, cycling 1 -> 3 -> 5 -> 1.
#[test]
fn bookmark_cycle_scenario() {
    let mut h = Harness::new();
    h.act(Action::SetBookmark(String::new()), UNSPECIFIED, Some("1"));
    h.act(Action::SetBookmark(String::new()), UNSPECIFIED, Some("3"));
    h.act(Action::SetBookmark(String::new()), UNSPECIFIED, Some("5"));

    h.model.current_mut().bookmarks.set_cur(0);
    for expected in [1usize, 3, 5, 1] {
        h.act(Action::GotoBookmark(String::new()), UNSPECIFIED, Some("+1"));
        assert_eq!(h.model.current().bookmarks.cur(), expected);
    }
}

// --- boundary cases ---

#[test]
fn backspace_at_buffer_start_errors() {
    let mut h = Harness::new();
    let out = h.act(Action::Backspace, UNSPECIFIED, None);
    assert_eq!(out, DispatchOutcome::Err(ErrorKind::Error));
}

#[test]
fn delete_at_buffer_end_is_noop() {
    let mut h = Harness::new();
    let out = h.act(Action::DeleteChar, UNSPECIFIED, None);
    assert_eq!(out, DispatchOutcome::Ok);
    assert!(h.line_bytes().is_empty());
}

#[test]
fn insert_char_zero_errors() {
    let mut h = Harness::new();
    let out = h.act(Action::InsertChar(0), UNSPECIFIED, None);
    assert_eq!(out, DispatchOutcome::Err(ErrorKind::CantInsert0));
}

#[test]
fn tab_size_at_or_past_half_columns_errors() {
    let mut h = Harness::new();
    h.ctx.ne_columns = 80;
    let out = h.act(Action::TabSize(0), 40, None);
    assert_eq!(out, DispatchOutcome::Err(ErrorKind::TabSizeOutOfRange));
}

#[test]
fn escape_time_at_or_past_256_errors() {
    let mut h = Harness::new();
    let out = h.act(Action::EscapeTime(0), 256, None);
    assert_eq!(out, DispatchOutcome::Err(ErrorKind::EscapeTimeOutOfRange));
}

#[test]
fn undo_with_do_undo_disabled_errors() {
    let mut h = Harness::new();
    h.model.current_mut().opt.do_undo = false;
    h.model.current_mut().undo.disable();
    let out = h.act(Action::Undo, UNSPECIFIED, None);
    assert_eq!(out, DispatchOutcome::Err(ErrorKind::UndoNotEnabled));
}

/// `Play` invoked while a macro is itself replaying is currently a
/// no-op: `MacroEngine::begin_play` returns an empty step list instead
/// of erroring.
#[test]
fn nested_play_while_executing_is_a_noop_not_an_error() {
    let mut h = Harness::new();
    h.act(Action::Record, UNSPECIFIED, None);
    h.act(Action::InsertChar('a' as i64), UNSPECIFIED, None);
    h.act(Action::Record, UNSPECIFIED, None);

    h.macros.begin_play(1).unwrap();
    let nested = h.macros.begin_play(1).unwrap();
    assert!(nested.is_empty());
    h.macros.end_play();
}

