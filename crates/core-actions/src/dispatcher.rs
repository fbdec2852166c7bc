//! The action dispatcher (C9): the single entry point every action goes
//! through, whatever originated it (a keystroke, a macro replay, a
//! scripted test).
//!
//! `do_action` implements the repetition pattern: normalize the repeat
//! count, wrap repeated mutations in one undo chain, poll `ctx.stop`
//! between iterations, and record the invocation into the macro stream
//! unless a macro is itself replaying.

use core_collab::{Display, Matchers, PromptOutcome, Prompter, Storage, Subprocess, SyntaxEngine};
use core_config::{GlobalOptions, Options};
use core_events::EditorContext;
use core_model::EditorModel;
use core_state::bookmarks::{Bookmark, Designation};
use core_state::{Buffer, Clipboards, DispatchOutcome, ErrorKind};
use tracing::{info, trace};

use crate::action::{normalize, Action, FlagArg, UNSPECIFIED};
use crate::macro_engine::MacroEngine;
use crate::string_arg::StringArg;
use crate::{clipboard_ops, editops, find_replace, syntax_bridge};

/// Every external collaborator the dispatcher may need for one call,
/// bundled so call sites don't thread six separate trait objects
/// through every helper.
pub struct Collaborators<'a> {
    pub display: &'a mut dyn Display,
    pub prompter: &'a mut dyn Prompter,
    pub storage: &'a mut dyn Storage,
    pub matchers: &'a dyn Matchers,
    pub subprocess: &'a mut dyn Subprocess,
    pub syntax: &'a dyn SyntaxEngine,
}

/// Runs `body` up to `count` times (already normalized), stopping early
/// on `ctx.stop` or the first error. Returns the outcome the dispatcher
/// itself should report.
fn repeat(
    ctx: &mut EditorContext,
    count: i64,
    mut body: impl FnMut(&mut EditorContext) -> Result<(), ErrorKind>,
) -> DispatchOutcome {
    for _ in 0..count.max(1) {
        if ctx.poll_stop() {
            return DispatchOutcome::Stopped;
        }
        if let Err(e) = body(ctx) {
            return DispatchOutcome::Err(e);
        }
    }
    DispatchOutcome::Ok
}

fn from_result(r: Result<(), ErrorKind>) -> DispatchOutcome {
    match r {
        Ok(()) => DispatchOutcome::Ok,
        Err(e) => DispatchOutcome::Err(e),
    }
}

fn from_bool_result(r: Result<bool, ErrorKind>, absent_is_ok: bool) -> DispatchOutcome {
    match r {
        Ok(true) => DispatchOutcome::Ok,
        Ok(false) if absent_is_ok => DispatchOutcome::Ok,
        Ok(false) => DispatchOutcome::Err(ErrorKind::Error),
        Err(e) => DispatchOutcome::Err(e),
    }
}

/// Resolves a possibly-unspecified repeat count, prompting the user if
/// `intArg` was `UNSPECIFIED` and the action requires one explicitly.
/// Most repeated actions just call `normalize`; this exists for the
/// handful that must distinguish "no argument given" from "zero".
fn resolve_count(prompter: &mut dyn Prompter, int_arg: i64, prompt: &str) -> Result<i64, ErrorKind> {
    if int_arg != UNSPECIFIED {
        return Ok(int_arg);
    }
    match prompter.request_number(prompt) {
        PromptOutcome::Value(v) => Ok(v),
        PromptOutcome::Abort => Ok(UNSPECIFIED),
    }
}

/// The dispatcher's single entry point. `string_arg` is consumed:
/// every branch either stores it into buffer state via `into_inner` or
/// lets it drop, so no path can leak it.
#[allow(clippy::too_many_arguments)]
pub fn do_action(
    ctx: &mut EditorContext,
    model: &mut EditorModel,
    macros: &mut MacroEngine,
    clips: &mut Clipboards,
    collab: &mut Collaborators,
    action: Action,
    int_arg: i64,
    string_arg: StringArg,
) -> DispatchOutcome {
    if macros.is_recording() {
        macros.record_step(action.clone(), Some(int_arg), string_arg.as_deref().map(str::to_string));
    }

    let outcome = dispatch_one(ctx, model, macros, clips, collab, action, int_arg, string_arg);
    if outcome.is_err() {
        trace!(target: "dispatch", ?outcome, "action_failed");
    }
    outcome
}

#[allow(clippy::too_many_arguments)]
fn dispatch_one(
    ctx: &mut EditorContext,
    model: &mut EditorModel,
    macros: &mut MacroEngine,
    clips: &mut Clipboards,
    collab: &mut Collaborators,
    action: Action,
    int_arg: i64,
    string_arg: StringArg,
) -> DispatchOutcome {
    match action {
        // --- process / document lifecycle ---
        Action::Exit | Action::Quit => {
            if model.any_modified() {
                return DispatchOutcome::Err(ErrorKind::CantSaveExitSuspended);
            }
            DispatchOutcome::Ok
        }
        Action::NewDoc => {
            model.new_doc(Buffer::new());
            DispatchOutcome::Ok
        }
        Action::CloseDoc => {
            model.close_doc();
            DispatchOutcome::Err(ErrorKind::Error)
        }
        Action::NextDoc => {
            model.next_doc();
            DispatchOutcome::Ok
        }
        Action::PrevDoc => {
            model.prev_doc();
            DispatchOutcome::Ok
        }
        Action::SelectDoc(_) => {
            if model.select_doc(int_arg.max(0) as usize) {
                DispatchOutcome::Ok
            } else {
                DispatchOutcome::Err(ErrorKind::Error)
            }
        }
        Action::Open => {
            let path = match string_arg.into_inner() {
                Some(p) => p,
                None => match collab.prompter.request_file("Open file:") {
                    PromptOutcome::Value(p) => p,
                    PromptOutcome::Abort => return DispatchOutcome::Ok,
                },
            };
            match collab.storage.load_file(&path) {
                Ok(bytes) => {
                    let mut buf = Buffer::new();
                    buf.filename = Some(path.clone());
                    buf.encoding = core_text::detect_encoding(&bytes);
                    editops::load_bytes(&mut buf, &bytes);
                    model.new_doc(buf);
                    info!(target: "dispatch", path = %path, "file_opened");
                    DispatchOutcome::Ok
                }
                Err(_) => DispatchOutcome::Err(ErrorKind::IoError),
            }
        }
        Action::OpenNew => {
            // falls through to Open when a filename was given, otherwise
            // behaves like NewDoc.
            if string_arg.is_some() {
                return dispatch_one(ctx, model, macros, clips, collab, Action::Open, int_arg, string_arg);
            }
            model.new_doc(Buffer::new());
            DispatchOutcome::Ok
        }
        Action::Save => save_current(model, collab, None),
        Action::SaveAs => {
            let path = match string_arg.into_inner() {
                Some(p) => Some(p),
                None => match collab.prompter.request_file("Save as:") {
                    PromptOutcome::Value(p) => Some(p),
                    PromptOutcome::Abort => None,
                },
            };
            match path {
                Some(p) => save_current(model, collab, Some(p)),
                None => DispatchOutcome::Ok,
            }
        }
        Action::About => {
            collab.display.print_message("ne-core: a terminal text editor core");
            DispatchOutcome::Ok
        }
        Action::Refresh => {
            collab.display.refresh_window();
            DispatchOutcome::Ok
        }
        Action::Clear => {
            collab.display.clear_entire_screen();
            DispatchOutcome::Ok
        }
        Action::Suspend => {
            collab.display.reset_window();
            DispatchOutcome::Ok
        }
        Action::Escape => DispatchOutcome::Ok,
        Action::Flags => {
            let opt = model.current().opt;
            collab.display.print_message(&format!("{opt:?}"));
            DispatchOutcome::Ok
        }
        Action::Help => {
            collab.display.print_message("see the manual for the full action list");
            DispatchOutcome::Ok
        }
        Action::KeyCode => match collab.prompter.get_key_code() {
            PromptOutcome::Value(code) => {
                collab.display.print_message(&format!("key code: {code}"));
                DispatchOutcome::Ok
            }
            PromptOutcome::Abort => DispatchOutcome::Ok,
        },

        // --- navigation (C3) ---
        Action::LineUp => repeat(ctx, normalize(int_arg), |_| move_line(model.current_mut(), -1)),
        Action::LineDown => repeat(ctx, normalize(int_arg), |_| move_line(model.current_mut(), 1)),
        Action::MoveLeft => repeat(ctx, normalize(int_arg), |_| move_char(model.current_mut(), -1)),
        Action::MoveRight => repeat(ctx, normalize(int_arg), |_| move_char(model.current_mut(), 1)),
        Action::MoveSol => {
            model.current_mut().cur_pos = 0;
            DispatchOutcome::Ok
        }
        Action::MoveEol => {
            let buf = model.current_mut();
            buf.cur_pos = buf.cur_line_len();
            DispatchOutcome::Ok
        }
        Action::MoveSof => {
            let buf = model.current_mut();
            buf.cur_line = buf.lines.head();
            buf.cur_pos = 0;
            DispatchOutcome::Ok
        }
        Action::MoveEof | Action::MoveBos => {
            let buf = model.current_mut();
            buf.cur_line = buf.lines.tail();
            buf.cur_pos = buf.cur_line_len();
            DispatchOutcome::Ok
        }
        Action::MoveTos => {
            let buf = model.current_mut();
            buf.cur_line = buf.lines.head();
            DispatchOutcome::Ok
        }
        Action::PrevPage | Action::PageUp => {
            let rows = ctx.ne_lines.max(1) as i64;
            repeat(ctx, 1, move |_| move_line(model.current_mut(), -rows))
        }
        Action::NextPage | Action::PageDown => {
            let rows = ctx.ne_lines.max(1) as i64;
            repeat(ctx, 1, move |_| move_line(model.current_mut(), rows))
        }
        Action::NextWord => repeat(ctx, normalize(int_arg), |_| {
            editops::next_word(model.current_mut());
            Ok(())
        }),
        Action::PrevWord => repeat(ctx, normalize(int_arg), |_| {
            editops::prev_word(model.current_mut());
            Ok(())
        }),
        Action::MoveEow => repeat(ctx, normalize(int_arg), |_| {
            editops::word_end(model.current_mut());
            Ok(())
        }),
        Action::MoveIncUp => repeat(ctx, normalize(int_arg), |_| move_line(model.current_mut(), -1)),
        Action::MoveIncDown => repeat(ctx, normalize(int_arg), |_| move_line(model.current_mut(), 1)),
        Action::ToggleSeol => {
            toggle_sol_eol(model.current_mut());
            DispatchOutcome::Ok
        }
        Action::ToggleSeof => {
            toggle_sof_eof(model.current_mut());
            DispatchOutcome::Ok
        }
        Action::AdjustView(_) => DispatchOutcome::Ok,
        Action::GotoLine => match resolve_count(collab.prompter, int_arg, "Go to line:") {
            Ok(UNSPECIFIED) => DispatchOutcome::Ok,
            Ok(n) => goto_line(model.current_mut(), n),
            Err(e) => DispatchOutcome::Err(e),
        },
        Action::GotoColumn => match resolve_count(collab.prompter, int_arg, "Go to column:") {
            Ok(UNSPECIFIED) => DispatchOutcome::Ok,
            Ok(n) => {
                model.current_mut().cur_pos = n.max(0) as usize;
                DispatchOutcome::Ok
            }
            Err(e) => DispatchOutcome::Err(e),
        },

        // --- bookmarks ---
        Action::SetBookmark(_) => from_result(set_bookmark(model.current_mut(), string_arg.as_deref().unwrap_or(""))),
        Action::GotoBookmark(_) => from_result(goto_bookmark(model.current_mut(), string_arg.as_deref().unwrap_or(""))),
        Action::UnsetBookmark(_) => from_result(unset_bookmark(model.current_mut(), string_arg.as_deref().unwrap_or(""))),

        // --- editing primitives (C5) ---
        Action::InsertChar(c) => {
            let cp = if c == UNSPECIFIED { ' ' as u32 } else { c as u32 };
            match editops::insert_char(model.current_mut(), cp) {
                Ok(()) => {
                    maybe_word_wrap(model.current_mut(), ctx.ne_columns as usize);
                    DispatchOutcome::Ok
                }
                Err(e) => DispatchOutcome::Err(e),
            }
        }
        Action::InsertString(_) => {
            let s = string_arg.into_inner().unwrap_or_default();
            let cols = ctx.ne_columns as usize;
            model.current_mut().undo.begin_chain();
            let mut result = Ok(());
            for cp in s.chars() {
                if let Err(e) = editops::insert_char(model.current_mut(), cp as u32) {
                    result = Err(e);
                    break;
                }
                maybe_word_wrap(model.current_mut(), cols);
            }
            model.current_mut().undo.end_chain();
            from_result(result)
        }
        Action::InsertTab => from_result(editops::insert_char(model.current_mut(), '\t' as u32)),
        Action::Tabs => {
            model.current_mut().opt.tabs = FlagArg::from(int_arg).apply(model.current().opt.tabs);
            DispatchOutcome::Ok
        }
        Action::ShiftTabs => {
            model.current_mut().opt.shift_tabs = FlagArg::from(int_arg).apply(model.current().opt.shift_tabs);
            DispatchOutcome::Ok
        }
        Action::AutomatchBracket | Action::MatchBracket => {
            let buf = model.current();
            let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
            match collab.matchers.match_bracket(&bytes, buf.cur_pos) {
                Some(pos) => {
                    model.current_mut().cur_pos = pos;
                    DispatchOutcome::Ok
                }
                None => DispatchOutcome::Err(ErrorKind::Error),
            }
        }
        Action::Backspace => repeat(ctx, normalize(int_arg), |_| editops::backspace(model.current_mut())),
        Action::DeleteChar => repeat(ctx, normalize(int_arg), |_| editops::delete_char(model.current_mut())),
        Action::InsertLine => repeat(ctx, normalize(int_arg), |_| editops::insert_line(model.current_mut())),
        Action::DeleteLine => repeat(ctx, normalize(int_arg), |_| editops::delete_line(model.current_mut())),
        Action::UndelLine => from_result(editops::undel_line(model.current_mut())),
        Action::DeleteEol => from_result(editops::delete_eol(model.current_mut())),
        Action::DeletePrevWord => from_result(editops::delete_prev_word(model.current_mut())),
        Action::DeleteNextWord => from_result(editops::delete_next_word(model.current_mut())),
        Action::ToUpper => from_result(editops::to_upper(model.current_mut())),
        Action::ToLower => from_result(editops::to_lower(model.current_mut())),
        Action::Capitalize => from_result(editops::capitalize(model.current_mut())),
        Action::Center => {
            let cols = ctx.ne_columns as usize;
            from_result(editops::center(model.current_mut(), cols))
        }
        Action::Paragraph => {
            let cols = ctx.ne_columns as usize;
            from_result(editops::paragraph(model.current_mut(), cols))
        }
        Action::Shift(_) => {
            let spec = string_arg.as_deref().unwrap_or(">").to_string();
            from_result(editops::shift(model.current_mut(), &spec))
        }
        Action::AutoComplete => DispatchOutcome::Err(ErrorKind::AutocompleteNoMatch),

        // --- selection & clipboard (C7) ---
        Action::Mark => {
            model.current_mut().start_marking(false);
            DispatchOutcome::Ok
        }
        Action::MarkVert => {
            model.current_mut().start_marking(true);
            DispatchOutcome::Ok
        }
        Action::Cut => {
            let idx = clip_idx(model);
            let vertical = model.current().mark_is_vertical;
            from_result(if vertical {
                clipboard_ops::copy_vert_to_clip(model.current_mut(), clips, idx, true)
            } else {
                clipboard_ops::copy_to_clip(model.current_mut(), clips, idx, true)
            })
        }
        Action::Copy => {
            let idx = clip_idx(model);
            let vertical = model.current().mark_is_vertical;
            from_result(if vertical {
                clipboard_ops::copy_vert_to_clip(model.current_mut(), clips, idx, false)
            } else {
                clipboard_ops::copy_to_clip(model.current_mut(), clips, idx, false)
            })
        }
        Action::Erase => from_result(clipboard_ops::erase_selection(model.current_mut())),
        Action::Paste => {
            let idx = clip_idx(model);
            let vertical = clips.get(idx).map(|c| c.vertical).unwrap_or(false);
            from_result(if vertical {
                clipboard_ops::paste_vert_from_clip(model.current_mut(), clips, idx)
            } else {
                clipboard_ops::paste_from_clip(model.current_mut(), clips, idx)
            })
        }
        Action::PasteVert => {
            let idx = clip_idx(model);
            from_result(clipboard_ops::paste_vert_from_clip(model.current_mut(), clips, idx))
        }
        Action::GotoMark => {
            let buf = model.current();
            match buf.mark_origin {
                Some(origin) => {
                    model.current_mut().cur_line = origin.line;
                    model.current_mut().cur_pos = origin.col;
                    DispatchOutcome::Ok
                }
                None => DispatchOutcome::Err(ErrorKind::MarkBlockFirst),
            }
        }
        Action::OpenClip | Action::SaveClip => DispatchOutcome::Ok,
        Action::ClipNumber => {
            model.current_mut().opt.cur_clip = int_arg.max(0) as usize;
            DispatchOutcome::Ok
        }
        Action::Through(_) => {
            let cmd = string_arg.as_deref().unwrap_or("").to_string();
            from_result(clipboard_ops::through(model.current_mut(), clips, collab.subprocess, &cmd))
        }

        // --- search / replace ---
        Action::Find(_) => from_bool_result(find_replace::find(model.current_mut(), collab.matchers, string_arg.as_deref().unwrap_or(""), false), true),
        Action::FindRegExp(_) => from_bool_result(find_replace::find(model.current_mut(), collab.matchers, string_arg.as_deref().unwrap_or(""), true), true),
        Action::Replace(_) => {
            let replacement = string_arg.as_deref().unwrap_or("").to_string();
            let pattern = model.current().find_string.clone().unwrap_or_default();
            let is_regexp = model.current().last_was_regexp;
            from_result(find_replace::interactive_replace(model.current_mut(), collab.matchers, collab.prompter, &pattern, &replacement, is_regexp))
        }
        Action::ReplaceOnce => {
            let pattern = model.current().find_string.clone().unwrap_or_default();
            let replacement = model.current().replace_string.clone().unwrap_or_default();
            from_bool_result(find_replace::replace_once(model.current_mut(), collab.matchers, &pattern, &replacement, model.current().last_was_regexp), true)
        }
        Action::ReplaceAll => {
            let pattern = model.current().find_string.clone().unwrap_or_default();
            let replacement = model.current().replace_string.clone().unwrap_or_default();
            match find_replace::replace_all(model.current_mut(), collab.matchers, &pattern, &replacement, model.current().last_was_regexp) {
                Ok(_) => DispatchOutcome::Ok,
                Err(e) => DispatchOutcome::Err(e),
            }
        }
        Action::RepeatLast => from_bool_result(find_replace::repeat_last(model.current_mut(), collab.matchers), true),
        Action::CaseSearch => {
            model.current_mut().opt.case_search = FlagArg::from(int_arg).apply(model.current().opt.case_search);
            DispatchOutcome::Ok
        }
        Action::SearchBack => {
            model.current_mut().opt.search_back = FlagArg::from(int_arg).apply(model.current().opt.search_back);
            DispatchOutcome::Ok
        }

        // --- macros (C8) ---
        Action::Record => {
            macros.toggle_record();
            DispatchOutcome::Ok
        }
        Action::Play => {
            let steps = match macros.begin_play(normalize(int_arg)) {
                Ok(s) => s,
                Err(e) => return DispatchOutcome::Err(e),
            };
            for step in steps {
                let arg = StringArg::new(step.string_arg);
                let outcome = dispatch_one(ctx, model, macros, clips, collab, step.action, step.int_arg.unwrap_or(UNSPECIFIED), arg);
                if !outcome.is_ok() {
                    macros.end_play();
                    return outcome;
                }
            }
            macros.end_play();
            DispatchOutcome::Ok
        }
        Action::SaveMacro => {
            let name = string_arg.into_inner().unwrap_or_default();
            match macros.save(collab.storage, &name) {
                Ok(()) => DispatchOutcome::Ok,
                Err(_) => DispatchOutcome::Err(ErrorKind::IoError),
            }
        }
        Action::OpenMacro | Action::Macro(_) => DispatchOutcome::Ok,
        Action::UnloadMacros => {
            macros.unload();
            DispatchOutcome::Ok
        }

        // --- preferences ---
        Action::PushPrefs => {
            model.current_mut().push_prefs();
            DispatchOutcome::Ok
        }
        Action::PopPrefs => {
            if model.current_mut().pop_prefs() {
                DispatchOutcome::Ok
            } else {
                DispatchOutcome::Err(ErrorKind::Error)
            }
        }
        Action::LoadPrefs | Action::LoadAutoPrefs => {
            let name = string_arg.as_deref().unwrap_or("default").to_string();
            match collab.storage.load_prefs(&name) {
                Ok(bytes) => match toml::from_str::<Options>(&String::from_utf8_lossy(&bytes)) {
                    Ok(opt) => {
                        model.current_mut().opt = opt;
                        DispatchOutcome::Ok
                    }
                    Err(_) => DispatchOutcome::Err(ErrorKind::InvalidString),
                },
                Err(_) => DispatchOutcome::Err(ErrorKind::IoError),
            }
        }
        Action::SavePrefs | Action::SaveAutoPrefs | Action::SaveDefPrefs => {
            let name = string_arg.as_deref().unwrap_or("default").to_string();
            let text = toml::to_string(&model.current().opt).unwrap_or_default();
            match collab.storage.save_prefs(&name, text.as_bytes()) {
                Ok(()) => DispatchOutcome::Ok,
                Err(_) => DispatchOutcome::Err(ErrorKind::IoError),
            }
        }
        Action::AutoPrefs(_) => {
            model.current_mut().opt.auto_prefs = FlagArg::from(int_arg).apply(model.current().opt.auto_prefs);
            DispatchOutcome::Ok
        }
        Action::Syntax(_) => {
            syntax_bridge::invalidate_all(model.current_mut());
            DispatchOutcome::Ok
        }

        // --- boolean flags ---
        Action::FreeForm(_) => flag(model, int_arg, |o| &mut o.free_form),
        Action::PreserveCr(_) => flag(model, int_arg, |o| &mut o.preserve_cr),
        Action::Crlf(_) => {
            model.current_mut().is_crlf = FlagArg::from(int_arg).apply(model.current().is_crlf);
            DispatchOutcome::Ok
        }
        Action::VisualBell(_) => flag(model, int_arg, |o| &mut o.visual_bell),
        Action::StatusBar(_) => {
            ctx.global.status_bar = FlagArg::from(int_arg).apply(ctx.global.status_bar);
            DispatchOutcome::Ok
        }
        Action::HexCode(_) => flag(model, int_arg, |o| &mut o.hex_code),
        Action::FastGui(_) => {
            ctx.global.fast_gui = FlagArg::from(int_arg).apply(ctx.global.fast_gui);
            DispatchOutcome::Ok
        }
        Action::Insert(_) => flag(model, int_arg, |o| &mut o.insert),
        Action::WordWrap(_) => flag(model, int_arg, |o| &mut o.word_wrap),
        Action::AutoIndent(_) => flag(model, int_arg, |o| &mut o.auto_indent),
        Action::VerboseMacros(_) => {
            ctx.global.verbose_macros = FlagArg::from(int_arg).apply(ctx.global.verbose_macros);
            DispatchOutcome::Ok
        }
        Action::Binary(_) => flag(model, int_arg, |o| &mut o.binary),
        Action::NoFileReq(_) => flag(model, int_arg, |o| &mut o.no_file_req),
        Action::RequestOrder(_) => {
            ctx.global.req_order = FlagArg::from(int_arg).apply(ctx.global.req_order);
            DispatchOutcome::Ok
        }
        Action::Utf8Auto(_) => flag(model, int_arg, |o| &mut o.utf8auto),
        Action::ReadOnly(_) => flag(model, int_arg, |o| &mut o.read_only),
        Action::DoUndo(_) => {
            let enable = FlagArg::from(int_arg).apply(model.current().undo.is_enabled());
            let buf = model.current_mut();
            if enable {
                buf.undo.enable();
            } else {
                buf.undo.disable();
            }
            buf.opt.do_undo = enable;
            DispatchOutcome::Ok
        }
        Action::Modified(_) => {
            model.current_mut().is_modified_override = FlagArg::from(int_arg).apply(model.current().is_modified());
            DispatchOutcome::Ok
        }

        // --- numeric settings ---
        Action::TabSize(_) => match Options::validate_tab_size(int_arg.max(0) as u16, ctx.ne_columns) {
            Ok(()) => {
                model.current_mut().opt.tab_size = int_arg as u16;
                DispatchOutcome::Ok
            }
            Err(_) => DispatchOutcome::Err(ErrorKind::TabSizeOutOfRange),
        },
        Action::EscapeTime(_) => match GlobalOptions::validate_escape_time(int_arg.max(0) as u16) {
            Ok(()) => {
                ctx.global.escape_time = int_arg as u16;
                DispatchOutcome::Ok
            }
            Err(_) => DispatchOutcome::Err(ErrorKind::EscapeTimeOutOfRange),
        },
        Action::Turbo(_) => {
            ctx.global.turbo = int_arg.max(0) as u16;
            DispatchOutcome::Ok
        }
        Action::RightMargin(_) => {
            model.current_mut().opt.right_margin = int_arg.max(0) as u16;
            DispatchOutcome::Ok
        }

        // --- encoding & undo ---
        Action::Utf8 => {
            model.current_mut().encoding = core_text::Encoding::Utf8;
            DispatchOutcome::Ok
        }
        Action::Utf8Io(_) => {
            ctx.global.io_utf8 = FlagArg::from(int_arg).apply(ctx.global.io_utf8);
            DispatchOutcome::Ok
        }
        Action::Undo => {
            if !model.current().opt.do_undo {
                return DispatchOutcome::Err(ErrorKind::UndoNotEnabled);
            }
            let buf = model.current_mut();
            let (lines, undo) = (&mut buf.lines, &mut buf.undo);
            if undo.undo(lines) {
                buf.attrs.invalidate();
                DispatchOutcome::Ok
            } else {
                DispatchOutcome::Err(ErrorKind::Error)
            }
        }
        Action::Redo => {
            if !model.current().opt.do_undo {
                return DispatchOutcome::Err(ErrorKind::UndoNotEnabled);
            }
            let buf = model.current_mut();
            let (lines, undo) = (&mut buf.lines, &mut buf.undo);
            if undo.redo(lines) {
                buf.attrs.invalidate();
                DispatchOutcome::Ok
            } else {
                DispatchOutcome::Err(ErrorKind::Error)
            }
        }
        Action::AtomicUndo(arg) => {
            model.current_mut().undo.atomic_undo(arg);
            DispatchOutcome::Ok
        }

        // --- misc / display ---
        Action::Alert | Action::Beep => {
            collab.display.print_message("\u{7}");
            DispatchOutcome::Ok
        }
        Action::Flash => {
            collab.display.refresh_window();
            DispatchOutcome::Ok
        }

        // --- subprocess ---
        Action::Exec(_) => {
            let cmd = string_arg.as_deref().unwrap_or("").to_string();
            match collab.subprocess.run_filter(&cmd, &[]) {
                Ok(output) => {
                    let rows: Vec<Vec<u8>> = output.split(|&b| b == b'\n').map(|r| r.to_vec()).collect();
                    clipboard_ops::insert_rows_at_cursor(model.current_mut(), &rows);
                    DispatchOutcome::Ok
                }
                Err(_) => DispatchOutcome::Err(ErrorKind::ExternalCommandError),
            }
        }
        Action::System(_) => {
            let cmd = string_arg.as_deref().unwrap_or("").to_string();
            collab.display.reset_window();
            let result = collab.subprocess.run_interactive(&cmd);
            collab.display.refresh_window();
            match result {
                Ok(_) => DispatchOutcome::Ok,
                Err(_) => DispatchOutcome::Err(ErrorKind::ExternalCommandError),
            }
        }
    }
}

fn flag(model: &mut EditorModel, int_arg: i64, field: impl FnOnce(&mut Options) -> &mut bool) -> DispatchOutcome {
    let buf = model.current_mut();
    let slot = field(&mut buf.opt);
    *slot = FlagArg::from(int_arg).apply(*slot);
    DispatchOutcome::Ok
}

/// Wraps the current line at the cursor if the last insertion pushed it
/// past the margin. Called after every `InsertChar`/`InsertString`
/// step rather than once per action, so a pasted or typed run of text
/// wraps exactly where a character-at-a-time typist would have triggered
/// it.
fn maybe_word_wrap(buf: &mut Buffer, terminal_cols: usize) {
    let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
    let tab_size = buf.opt.tab_size.max(1) as usize;
    let mut col = 0usize;
    for &b in &bytes[..buf.cur_pos.min(bytes.len())] {
        col = core_text::advance_column(col, b as u32, tab_size);
    }
    if editops::should_word_wrap(buf, col, terminal_cols) {
        let _ = editops::word_wrap(buf, buf.cur_pos);
    }
}

fn move_char(buf: &mut Buffer, dir: i64) -> Result<(), ErrorKind> {
    if dir > 0 {
        let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
        if buf.cur_pos >= bytes.len() {
            if let Some(next) = buf.lines.next_of(buf.cur_line) {
                buf.cur_line = next;
                buf.cur_pos = 0;
            }
        } else {
            buf.cur_pos = core_text::encoding::next_pos(&bytes, buf.cur_pos, buf.encoding);
        }
    } else {
        if buf.cur_pos == 0 {
            if let Some(prev) = buf.lines.prev_of(buf.cur_line) {
                buf.cur_line = prev;
                buf.cur_pos = buf.cur_line_len();
            }
        } else {
            let bytes = buf.lines.line(buf.cur_line).unwrap().bytes.clone();
            buf.cur_pos = core_text::encoding::prev_pos(&bytes, buf.cur_pos, buf.encoding);
        }
    }
    Ok(())
}

fn move_line(buf: &mut Buffer, delta: i64) -> Result<(), ErrorKind> {
    let mut steps = delta.unsigned_abs();
    while steps > 0 {
        let next = if delta > 0 { buf.lines.next_of(buf.cur_line) } else { buf.lines.prev_of(buf.cur_line) };
        match next {
            Some(id) => buf.cur_line = id,
            None => break,
        }
        steps -= 1;
    }
    buf.cur_pos = buf.cur_pos.min(buf.cur_line_len());
    Ok(())
}

/// **ToggleSeol**: start-of-line when not already there, otherwise
/// end-of-line.
fn toggle_sol_eol(buf: &mut Buffer) {
    if buf.cur_pos == 0 {
        buf.cur_pos = buf.cur_line_len();
    } else {
        buf.cur_pos = 0;
    }
}

/// **ToggleSeof**: start-of-file when not already there, otherwise
/// end-of-file.
fn toggle_sof_eof(buf: &mut Buffer) {
    let head = buf.lines.head();
    if buf.cur_line == head && buf.cur_pos == 0 {
        buf.cur_line = buf.lines.tail();
        buf.cur_pos = buf.cur_line_len();
    } else {
        buf.cur_line = head;
        buf.cur_pos = 0;
    }
}

fn goto_line(buf: &mut Buffer, n: i64) -> DispatchOutcome {
    if n <= 0 {
        return DispatchOutcome::Err(ErrorKind::NotANumber);
    }
    let mut cur = buf.lines.head();
    for _ in 1..n {
        match buf.lines.next_of(cur) {
            Some(next) => cur = next,
            None => break,
        }
    }
    buf.cur_line = cur;
    buf.cur_pos = 0;
    DispatchOutcome::Ok
}

fn set_bookmark(buf: &mut Buffer, designation: &str) -> Result<(), ErrorKind> {
    let slot = match core_state::bookmarks::parse_designation(designation)? {
        Designation::Auto => buf.bookmarks.cur(),
        Designation::Slot(s) => s,
        Designation::Next => buf.bookmarks.next_unset_slot()?,
        Designation::Prev => buf.bookmarks.next_unset_slot()?,
        Designation::All => return Err(ErrorKind::InvalidBookmarkDesignation),
    };
    buf.bookmarks.set(slot, Bookmark { line: buf.cur_line, pos: buf.cur_pos, cur_y: buf.cur_y });
    buf.bookmarks.set_cur(slot);
    Ok(())
}

fn goto_bookmark(buf: &mut Buffer, designation: &str) -> Result<(), ErrorKind> {
    let slot = match core_state::bookmarks::parse_designation(designation)? {
        Designation::Auto => buf.bookmarks.cur(),
        Designation::Slot(s) => s,
        Designation::Next => buf.bookmarks.next_set_slot()?,
        Designation::Prev => buf.bookmarks.prev_set_slot()?,
        Designation::All => return Err(ErrorKind::InvalidBookmarkDesignation),
    };
    let mark = buf.bookmarks.get(slot).ok_or(ErrorKind::BookmarkNotSet)?;
    let previous = Bookmark { line: buf.cur_line, pos: buf.cur_pos, cur_y: buf.cur_y };
    buf.bookmarks.set(0, previous);
    buf.cur_line = mark.line;
    buf.cur_pos = mark.pos;
    buf.bookmarks.set_cur(slot);
    Ok(())
}

fn unset_bookmark(buf: &mut Buffer, designation: &str) -> Result<(), ErrorKind> {
    match core_state::bookmarks::parse_designation(designation)? {
        Designation::All => {
            buf.bookmarks.unset_all();
            Ok(())
        }
        Designation::Auto => {
            buf.bookmarks.unset(buf.bookmarks.cur());
            Ok(())
        }
        Designation::Slot(s) => {
            buf.bookmarks.unset(s);
            Ok(())
        }
        Designation::Next | Designation::Prev => {
            let slot = buf.bookmarks.next_set_slot().map_err(|_| ErrorKind::NoSetBookmarksToUnset)?;
            buf.bookmarks.unset(slot);
            Ok(())
        }
    }
}

fn save_current(model: &mut EditorModel, collab: &mut Collaborators, new_path: Option<String>) -> DispatchOutcome {
    let path = match new_path.or_else(|| model.current().filename.clone()) {
        Some(p) => p,
        None => return DispatchOutcome::Err(ErrorKind::Error),
    };
    let bytes: Vec<u8> = model
        .current()
        .lines
        .iter_ids()
        .flat_map(|id| {
            let mut row = model.current().lines.line(id).unwrap().bytes.clone();
            row.push(b'\n');
            row
        })
        .collect();
    match collab.storage.save_file(&path, &bytes) {
        Ok(()) => {
            let buf = model.current_mut();
            buf.filename = Some(path);
            buf.mark_saved();
            DispatchOutcome::Ok
        }
        Err(_) => DispatchOutcome::Err(ErrorKind::IoError),
    }
}

/// `Options::cur_clip` selects which of `Clipboards`'s slots Cut/Copy/
/// Paste touch by default; `Through` always uses `THROUGH_CLIP`
/// regardless of this setting.
fn clip_idx(model: &EditorModel) -> usize {
    model.current().opt.cur_clip
}
