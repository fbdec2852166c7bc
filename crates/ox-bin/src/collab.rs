//! Concrete implementations of the six `core-collab` traits: the only
//! place in this binary that touches a real terminal, filesystem, regex
//! engine, or child process.

use std::io::Write;
use std::process::{Command, Stdio};

use core_collab::{Display, MatchSpan, Matchers, PromptOutcome, Prompter, Storage, Subprocess, SyntaxEngine};
use core_text::HighlightState;
use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::Print;
use crossterm::terminal;
use crossterm::{ExecutableCommand, QueueableCommand};

/// Draws the status line and repaints are driven entirely by `render.rs`;
/// this collaborator only owns the narrow slice of terminal I/O the
/// dispatcher itself asks for directly (messages, bell, raw size).
pub struct TermDisplay {
    out: std::io::Stdout,
}

impl TermDisplay {
    pub fn new() -> Self {
        TermDisplay { out: std::io::stdout() }
    }

    fn print_status(&mut self, msg: &str) {
        let (cols, rows) = terminal::size().unwrap_or((80, 24));
        let _ = self.out.queue(MoveTo(0, rows.saturating_sub(1)));
        let _ = self.out.queue(terminal::Clear(terminal::ClearType::CurrentLine));
        let truncated: String = msg.chars().take(cols as usize).collect();
        let _ = self.out.queue(Print(truncated));
        let _ = self.out.flush();
    }
}

impl Display for TermDisplay {
    fn print_message(&mut self, msg: &str) {
        self.print_status(msg);
    }

    fn print_error(&mut self, msg: &str) -> bool {
        self.print_status(&format!("! {msg}"));
        true
    }

    fn update_line(&mut self, _visual_row: usize) {
        // The renderer repaints from buffer state every cycle; no
        // incremental dirty tracking in this build.
    }

    fn scroll_window(&mut self, _by_rows: isize) {}

    fn reset_window(&mut self) {
        let _ = self.out.execute(terminal::Clear(terminal::ClearType::All));
    }

    fn refresh_window(&mut self) {
        let _ = self.out.flush();
    }

    fn clear_entire_screen(&mut self) {
        let _ = self.out.execute(terminal::Clear(terminal::ClearType::All));
    }

    fn ttysize(&self) -> (usize, usize) {
        let (cols, rows) = terminal::size().unwrap_or((80, 24));
        (rows as usize, cols as usize)
    }
}

/// Reads one line (or one character) of interactive input from the
/// bottom status row, the way a modeless terminal editor asks for a
/// filename, a search pattern, or a repeat count.
pub struct TermPrompter;

impl TermPrompter {
    fn read_line(&mut self, prompt: &str) -> PromptOutcome<String> {
        let (cols, rows) = terminal::size().unwrap_or((80, 24));
        let mut buf = String::new();
        loop {
            let mut out = std::io::stdout();
            let _ = out.queue(MoveTo(0, rows.saturating_sub(1)));
            let _ = out.queue(terminal::Clear(terminal::ClearType::CurrentLine));
            let line = format!("{prompt} {buf}");
            let truncated: String = line.chars().take(cols as usize).collect();
            let _ = out.queue(Print(truncated));
            let _ = out.flush();

            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Enter => return PromptOutcome::Value(buf),
                    KeyCode::Esc => return PromptOutcome::Abort,
                    KeyCode::Backspace => {
                        buf.pop();
                    }
                    KeyCode::Char(c) => buf.push(c),
                    _ => {}
                },
                Ok(_) => {}
                Err(_) => return PromptOutcome::Abort,
            }
        }
    }
}

impl Prompter for TermPrompter {
    fn request_number(&mut self, prompt: &str) -> PromptOutcome<i64> {
        match self.read_line(prompt) {
            PromptOutcome::Value(s) => match s.trim().parse() {
                Ok(n) => PromptOutcome::Value(n),
                Err(_) => PromptOutcome::Abort,
            },
            PromptOutcome::Abort => PromptOutcome::Abort,
        }
    }

    fn request_string(&mut self, prompt: &str) -> PromptOutcome<String> {
        self.read_line(prompt)
    }

    fn request_file(&mut self, prompt: &str) -> PromptOutcome<String> {
        self.read_line(prompt)
    }

    fn request_response(&mut self, prompt: &str, choices: &str) -> PromptOutcome<char> {
        loop {
            match self.read_line(&format!("{prompt} [{choices}]")) {
                PromptOutcome::Value(s) => {
                    if let Some(c) = s.chars().next() {
                        if choices.contains(c) {
                            return PromptOutcome::Value(c);
                        }
                    } else {
                        return PromptOutcome::Abort;
                    }
                }
                PromptOutcome::Abort => return PromptOutcome::Abort,
            }
        }
    }

    fn request_char(&mut self, prompt: &str) -> PromptOutcome<char> {
        match self.read_line(prompt) {
            PromptOutcome::Value(s) => s.chars().next().map_or(PromptOutcome::Abort, PromptOutcome::Value),
            PromptOutcome::Abort => PromptOutcome::Abort,
        }
    }

    fn request_document(&mut self, prompt: &str) -> PromptOutcome<String> {
        self.read_line(prompt)
    }

    fn get_key_code(&mut self) -> PromptOutcome<u32> {
        loop {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    return PromptOutcome::Value(keycode_to_u32(key.code));
                }
                Ok(_) => continue,
                Err(_) => return PromptOutcome::Abort,
            }
        }
    }
}

/// Collapses a `crossterm::KeyCode` to a single numeric code: a
/// printable character's own codepoint, or a small reserved value above
/// the Unicode range for non-character keys.
fn keycode_to_u32(code: KeyCode) -> u32 {
    const NON_CHAR_BASE: u32 = 0x0011_0000;
    match code {
        KeyCode::Char(c) => c as u32,
        KeyCode::Enter => NON_CHAR_BASE,
        KeyCode::Tab => NON_CHAR_BASE + 1,
        KeyCode::Backspace => NON_CHAR_BASE + 2,
        KeyCode::Esc => NON_CHAR_BASE + 3,
        KeyCode::Left => NON_CHAR_BASE + 4,
        KeyCode::Right => NON_CHAR_BASE + 5,
        KeyCode::Up => NON_CHAR_BASE + 6,
        KeyCode::Down => NON_CHAR_BASE + 7,
        KeyCode::Home => NON_CHAR_BASE + 8,
        KeyCode::End => NON_CHAR_BASE + 9,
        KeyCode::PageUp => NON_CHAR_BASE + 10,
        KeyCode::PageDown => NON_CHAR_BASE + 11,
        KeyCode::Delete => NON_CHAR_BASE + 12,
        KeyCode::F(n) => NON_CHAR_BASE + 100 + n as u32,
        _ => NON_CHAR_BASE + 1000,
    }
}

/// Plain filesystem `Storage`: documents, clips and preferences are all
/// just files; preferences round-trip through the typed `Options`/
/// `GlobalOptions` records via `toml` on the caller's side.
pub struct FsStorage;

impl Storage for FsStorage {
    fn load_file(&mut self, path: &str) -> anyhow::Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    fn save_file(&mut self, path: &str, bytes: &[u8]) -> anyhow::Result<()> {
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn load_clip(&mut self, path: &str) -> anyhow::Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    fn save_clip(&mut self, path: &str, bytes: &[u8]) -> anyhow::Result<()> {
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn load_prefs(&mut self, name: &str) -> anyhow::Result<Vec<u8>> {
        Ok(std::fs::read(name)?)
    }

    fn save_prefs(&mut self, name: &str, bytes: &[u8]) -> anyhow::Result<()> {
        std::fs::write(name, bytes)?;
        Ok(())
    }

    fn load_syntax_by_name(&mut self, name: &str) -> anyhow::Result<Vec<u8>> {
        Ok(std::fs::read(name)?)
    }
}

/// Literal and regex search, backed by the `regex` crate; bracket
/// matching walks a small hardcoded pair table the way a syntax-unaware
/// editor would.
pub struct RegexMatchers;

const BRACKET_PAIRS: &[(u8, u8)] = &[(b'(', b')'), (b'[', b']'), (b'{', b'}')];

impl Matchers for RegexMatchers {
    fn find(
        &self,
        haystack: &[u8],
        pattern: &str,
        is_regexp: bool,
        case_sensitive: bool,
        backward: bool,
        from: usize,
    ) -> anyhow::Result<Option<MatchSpan>> {
        let hay = String::from_utf8_lossy(haystack);
        let literal;
        let raw_pattern = if is_regexp {
            pattern
        } else {
            literal = regex::escape(pattern);
            &literal
        };
        let re = if case_sensitive {
            regex::Regex::new(raw_pattern)?
        } else {
            regex::Regex::new(&format!("(?i){raw_pattern}"))?
        };

        if backward {
            let mut last = None;
            for m in re.find_iter(&hay) {
                if m.start() >= from {
                    break;
                }
                last = Some(m);
            }
            Ok(last.map(|m| MatchSpan { start: m.start(), end: m.end() }))
        } else {
            let start = from.min(hay.len());
            Ok(re
                .find_at(&hay, start)
                .map(|m| MatchSpan { start: m.start(), end: m.end() }))
        }
    }

    fn match_bracket(&self, haystack: &[u8], pos: usize) -> Option<usize> {
        let byte = *haystack.get(pos)?;
        for &(open, close) in BRACKET_PAIRS {
            if byte == open {
                let mut depth = 0i32;
                for (i, &b) in haystack.iter().enumerate().skip(pos) {
                    if b == open {
                        depth += 1;
                    } else if b == close {
                        depth -= 1;
                        if depth == 0 {
                            return Some(i);
                        }
                    }
                }
                return None;
            }
            if byte == close {
                let mut depth = 0i32;
                for i in (0..=pos).rev() {
                    let b = haystack[i];
                    if b == close {
                        depth += 1;
                    } else if b == open {
                        depth -= 1;
                        if depth == 0 {
                            return Some(i);
                        }
                    }
                }
                return None;
            }
        }
        None
    }
}

/// `THROUGH`/`EXEC`/`SYSTEM` plumbing. `THROUGH` round-trips the
/// selection through temporary files rather than an in-process pipe, so
/// the filter command sees ordinary seekable files the way it would
/// from a shell redirection.
pub struct ShellSubprocess;

impl Subprocess for ShellSubprocess {
    fn run_filter(&mut self, cmd: &str, stdin: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut input = tempfile::NamedTempFile::new()?;
        input.write_all(stdin)?;
        input.flush()?;
        let output = tempfile::NamedTempFile::new()?;

        let shell_cmd = format!(
            "{cmd} < {} > {}",
            input.path().display(),
            output.path().display()
        );
        let status = Command::new("sh").arg("-c").arg(&shell_cmd).status()?;
        if !status.success() {
            anyhow::bail!("filter command exited with status {status}");
        }
        Ok(std::fs::read(output.path())?)
    }

    fn run_interactive(&mut self, cmd: &str) -> anyhow::Result<i32> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        Ok(status.code().unwrap_or(-1))
    }
}

/// No syntax highlighting in this build: every line comes back with a
/// flat attribute row and the incoming state unchanged.
pub struct PlainSyntax;

impl SyntaxEngine for PlainSyntax {
    fn name(&self) -> &str {
        "none"
    }

    fn parse(&self, line: &[u8], incoming: HighlightState) -> (HighlightState, Vec<u8>) {
        (incoming, vec![0u8; line.len()])
    }
}
