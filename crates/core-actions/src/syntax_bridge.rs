//! Bridges a `Buffer`'s lines to an external [`SyntaxEngine`] (C6).
//!
//! The core never implements a grammar itself; it only threads
//! `HighlightState` from one line's outgoing state to the next line's
//! incoming state, and caches the byte-wise attribute classes for the
//! current line so the renderer can ask for them without re-parsing.

use core_collab::SyntaxEngine;
use core_state::Buffer;
use core_text::{AttrCache, HighlightState, LineId};

/// Reparses the current line if its cached attributes are stale,
/// storing the result in `buf.attrs` and the outgoing state in
/// `buf.next_state`.
pub fn freeze_attributes(buf: &mut Buffer, engine: &dyn SyntaxEngine) {
    if !buf.attrs.is_stale() {
        return;
    }
    let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
    let incoming = buf.lines.line(buf.cur_line).unwrap().incoming_state;
    let (outgoing, attrs) = engine.parse(&bytes, incoming);
    buf.attrs = AttrCache::Valid(attrs);
    buf.next_state = outgoing;
}

/// Propagates the current line's outgoing state into its successor's
/// incoming state, returning whether the successor's state actually
/// changed (so the caller knows whether to keep walking forward).
fn propagate_to(buf: &mut Buffer, line: LineId, state: HighlightState) -> bool {
    let Some(l) = buf.lines.line_mut(line) else { return false };
    if l.incoming_state == state {
        false
    } else {
        l.incoming_state = state;
        true
    }
}

/// Re-parses every line from `from` onward, propagating highlight state
/// line-to-line, until either the buffer ends or a line's incoming state
/// turns out unchanged from what it already had (the standard
/// incremental-highlighting stopping rule: anything further downstream
/// only depends on this line through `incoming_state`, so an unchanged
/// state means nothing downstream needs reparsing).
pub fn update_syntax_states(buf: &mut Buffer, engine: &dyn SyntaxEngine, from: LineId) {
    let mut cur = Some(from);
    while let Some(id) = cur {
        let bytes = match buf.lines.line(id) {
            Some(l) => l.bytes.clone(),
            None => break,
        };
        let incoming = buf.lines.line(id).unwrap().incoming_state;
        let (outgoing, attrs) = engine.parse(&bytes, incoming);
        if id == buf.cur_line {
            buf.attrs = AttrCache::Valid(attrs);
            buf.next_state = outgoing;
        }
        let Some(next) = buf.lines.next_of(id) else { break };
        if !propagate_to(buf, next, outgoing) {
            break;
        }
        cur = Some(next);
    }
}

/// **Syntax(name)**: loads a named grammar. The core has no notion of
/// "which grammar is loaded" beyond invalidating every line's cache so
/// the next repaint reparses under whatever `SyntaxEngine` the caller
/// now has in hand.
pub fn invalidate_all(buf: &mut Buffer) {
    for id in buf.lines.iter_ids().collect::<Vec<_>>() {
        if let Some(line) = buf.lines.line_mut(id) {
            line.incoming_state = HighlightState::default();
        }
    }
    buf.attrs.invalidate();
    buf.next_state = HighlightState::default();
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::Buffer;

    struct UpperOnDigit;
    impl SyntaxEngine for UpperOnDigit {
        fn name(&self) -> &str {
            "test"
        }
        fn parse(&self, line: &[u8], incoming: HighlightState) -> (HighlightState, Vec<u8>) {
            let has_digit = line.iter().any(u8::is_ascii_digit);
            let state = HighlightState(if has_digit { 1 } else { 0 });
            let attrs = vec![if has_digit { 1u8 } else { 0u8 }; line.len()];
            let _ = incoming;
            (state, attrs)
        }
    }

    #[test]
    fn freeze_attributes_only_reparses_when_stale() {
        let mut buf = Buffer::new();
        buf.lines.insert_bytes(buf.cur_line, 0, b"a1b");
        let engine = UpperOnDigit;
        freeze_attributes(&mut buf, &engine);
        assert!(!buf.attrs.is_stale());
        assert_eq!(buf.next_state, HighlightState(1));
    }

    #[test]
    fn update_syntax_states_stops_when_state_unchanged() {
        let mut buf = Buffer::new();
        let head = buf.cur_line;
        buf.lines.insert_bytes(head, 0, b"1");
        let second = buf.lines.insert_line_after(head, b"2".to_vec(), HighlightState::default());
        let _third = buf.lines.insert_line_after(second, b"x".to_vec(), HighlightState::default());
        let engine = UpperOnDigit;
        update_syntax_states(&mut buf, &engine, head);
        assert_eq!(buf.lines.line(second).unwrap().incoming_state, HighlightState(1));
    }

    #[test]
    fn invalidate_all_resets_every_line() {
        let mut buf = Buffer::new();
        let head = buf.cur_line;
        buf.lines.line_mut(head).unwrap().incoming_state = HighlightState(7);
        invalidate_all(&mut buf);
        assert_eq!(buf.lines.line(head).unwrap().incoming_state, HighlightState::default());
        assert!(buf.attrs.is_stale());
    }
}
