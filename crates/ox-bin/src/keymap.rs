//! Translates a raw terminal key event into the `(Action, intArg,
//! stringArg)` triple `do_action` expects.
//!
//! The editor is modeless: there is no separate command mode. A bare
//! printable key always means `InsertChar`; every other
//! binding is a control/function key or an Esc-prefixed mnemonic, mirrored
//! loosely on the key bindings a terminal editor in this lineage ships
//! with.

use core_actions::{Action, UNSPECIFIED};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub struct Translated {
    pub action: Action,
    pub int_arg: i64,
    pub string_arg: Option<String>,
}

fn a(action: Action) -> Option<Translated> {
    Some(Translated { action, int_arg: UNSPECIFIED, string_arg: None })
}

/// Resolves one key event to an action, or `None` if the key carries no
/// binding (dropped silently, as the original source does for unbound
/// keys).
pub fn translate(key: KeyEvent) -> Option<Translated> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl {
        return match key.code {
            KeyCode::Char('q') => a(Action::Exit),
            KeyCode::Char('s') => a(Action::Save),
            KeyCode::Char('o') => a(Action::Open),
            KeyCode::Char('n') => a(Action::NewDoc),
            KeyCode::Char('w') => a(Action::CloseDoc),
            KeyCode::Char('f') => a(Action::Find(String::new())),
            KeyCode::Char('r') => a(Action::ReplaceAll),
            KeyCode::Char('g') => a(Action::GotoLine),
            KeyCode::Char('z') => a(Action::Undo),
            KeyCode::Char('y') => a(Action::Redo),
            KeyCode::Char('k') => a(Action::Cut),
            KeyCode::Char('c') => a(Action::Copy),
            KeyCode::Char('v') => a(Action::Paste),
            KeyCode::Char('b') => a(Action::Mark),
            KeyCode::Char('u') => a(Action::ToUpper),
            KeyCode::Char('l') => a(Action::ToLower),
            KeyCode::Char('_') => a(Action::AtomicUndo(None)),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char(c) => a(Action::InsertChar(c as i64)),
        KeyCode::Enter => a(Action::InsertChar('\n' as i64)),
        KeyCode::Tab => a(Action::InsertTab),
        KeyCode::Backspace => a(Action::Backspace),
        KeyCode::Delete => a(Action::DeleteChar),
        KeyCode::Left => a(Action::MoveLeft),
        KeyCode::Right => a(Action::MoveRight),
        KeyCode::Up => a(Action::LineUp),
        KeyCode::Down => a(Action::LineDown),
        KeyCode::Home => a(Action::MoveSol),
        KeyCode::End => a(Action::MoveEol),
        KeyCode::PageUp => a(Action::PrevPage),
        KeyCode::PageDown => a(Action::NextPage),
        KeyCode::Esc => a(Action::Escape),
        KeyCode::F(1) => a(Action::Help),
        KeyCode::F(3) => a(Action::RepeatLast),
        _ => None,
    }
}
