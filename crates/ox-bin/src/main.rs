//! Oxidized entrypoint: wires the synchronous core (`core-actions`'
//! `do_action`) to a real terminal, filesystem and subprocess layer.

mod collab;
mod keymap;
mod render;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use core_actions::{editops, do_action, Action, MacroEngine, StringArg};
use core_config::{GlobalOptions, Options};
use core_events::EditorContext;
use core_model::EditorModel;
use core_state::{Clipboards, DispatchOutcome, ErrorKind};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use collab::{FsStorage, PlainSyntax, RegexMatchers, ShellSubprocess, TermDisplay, TermPrompter};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "oxidized", version, about = "Oxidized editor")]
struct Args {
    /// Optional path to open at startup. If omitted, a blank buffer is used.
    path: Option<PathBuf>,
    /// Preferences file (TOML); defaults to `oxidized.toml` in the cwd.
    #[arg(long = "config")]
    config: Option<PathBuf>,
}

/// The process-wide preferences file: buffer `Options` plus `GlobalOptions`,
/// loaded as one record the way `PushPrefs`/`LoadPrefs` expect a saved
/// snapshot to look.
#[derive(serde::Serialize, serde::Deserialize, Default)]
struct Prefs {
    #[serde(default)]
    options: Options,
    #[serde(default)]
    global: GlobalOptions,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_path = std::path::Path::new(".");
    let file_appender = tracing_appender::rolling::never(log_path, "oxidized.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

fn install_panic_hook(raw_mode_active: Arc<AtomicBool>) {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if raw_mode_active.load(Ordering::Relaxed) {
            let _ = terminal::disable_raw_mode();
        }
        tracing::error!(target: "runtime.panic", ?info, "panic");
        default_panic(info);
    }));
}

/// Reads and validates `config` (or `oxidized.toml` if unset), falling
/// back to documented defaults when no preferences file exists.
fn load_prefs(config: Option<&PathBuf>) -> Prefs {
    let path = config
        .cloned()
        .unwrap_or_else(|| PathBuf::from("oxidized.toml"));
    let Ok(text) = std::fs::read_to_string(&path) else {
        return Prefs::default();
    };
    match toml::from_str::<Prefs>(&text) {
        Ok(mut prefs) => {
            if Options::validate_tab_size(prefs.options.tab_size, 80).is_err() {
                warn!(target: "config", "tab_size out of range in prefs, using default");
                prefs.options.tab_size = Options::default().tab_size;
            }
            if GlobalOptions::validate_escape_time(prefs.global.escape_time).is_err() {
                warn!(target: "config", "escape_time out of range in prefs, using default");
                prefs.global.escape_time = GlobalOptions::default().escape_time;
            }
            prefs
        }
        Err(e) => {
            warn!(target: "config", ?e, "malformed prefs file, using defaults");
            Prefs::default()
        }
    }
}

/// Disables raw mode and leaves the alternate screen on drop, so any
/// exit path (normal quit, `?`, a panic caught upstream) restores the
/// caller's terminal.
struct TerminalGuard {
    active: Arc<AtomicBool>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let active = Arc::new(AtomicBool::new(true));
        Ok(TerminalGuard { active })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Relaxed);
        let _ = terminal::disable_raw_mode();
    }
}

fn main() -> Result<()> {
    let _log_guard = configure_logging();
    let raw_mode_active = Arc::new(AtomicBool::new(false));
    install_panic_hook(raw_mode_active.clone());

    let args = Args::parse();
    let prefs = load_prefs(args.config.as_ref());

    let mut model = EditorModel::new(prefs.global);
    model.current_mut().opt = prefs.options;

    let mut storage = FsStorage;
    if let Some(path) = &args.path {
        let path_str = path.to_string_lossy().to_string();
        match std::fs::read(path) {
            Ok(bytes) => {
                let buf = model.current_mut();
                buf.filename = Some(path_str.clone());
                buf.encoding = core_text::detect_encoding(&bytes);
                editops::load_bytes(buf, &bytes);
                info!(target: "runtime.startup", path = %path_str, "file_opened");
            }
            Err(e) => {
                error!(target: "runtime.startup", ?e, path = %path_str, "file_open_error");
            }
        }
    }

    let mut ctx = EditorContext::new(model.global);
    if let Ok((cols, rows)) = terminal::size() {
        ctx.ne_columns = cols;
        ctx.ne_lines = rows;
    }

    let mut macros = MacroEngine::new();
    let mut clips = Clipboards::new();

    let mut display = TermDisplay::new();
    let mut prompter = TermPrompter;
    let matchers = RegexMatchers;
    let mut subprocess = ShellSubprocess;
    let syntax = PlainSyntax;

    let guard = TerminalGuard::enter()?;
    raw_mode_active.store(true, Ordering::Relaxed);

    let result = run_event_loop(
        &mut ctx,
        &mut model,
        &mut macros,
        &mut clips,
        &mut display,
        &mut prompter,
        &mut storage,
        &matchers,
        &mut subprocess,
        &syntax,
        args.path.as_ref().map(|p| p.to_string_lossy().to_string()),
    );

    drop(guard);
    result
}

#[allow(clippy::too_many_arguments)]
fn run_event_loop(
    ctx: &mut EditorContext,
    model: &mut EditorModel,
    macros: &mut MacroEngine,
    clips: &mut Clipboards,
    display: &mut TermDisplay,
    prompter: &mut TermPrompter,
    storage: &mut FsStorage,
    matchers: &RegexMatchers,
    subprocess: &mut ShellSubprocess,
    syntax: &PlainSyntax,
    filename: Option<String>,
) -> Result<()> {
    render::draw(model.current_mut(), filename.as_deref())?;

    loop {
        if ctx.stop.is_set() {
            break;
        }

        let event = event::read()?;
        let translated = match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => keymap::translate(key),
            Event::Resize(cols, rows) => {
                ctx.ne_columns = cols;
                ctx.ne_lines = rows;
                None
            }
            _ => None,
        };

        let Some(translated) = translated else {
            render::draw(model.current_mut(), filename.as_deref())?;
            continue;
        };

        let mut collab = core_actions::Collaborators {
            display: &mut *display,
            prompter: &mut *prompter,
            storage: &mut *storage,
            matchers,
            subprocess: &mut *subprocess,
            syntax,
        };

        let outcome = do_action(
            ctx,
            model,
            macros,
            clips,
            &mut collab,
            translated.action.clone(),
            translated.int_arg,
            StringArg::new(translated.string_arg),
        );

        match (&translated.action, outcome) {
            (Action::Exit | Action::Quit, DispatchOutcome::Ok) => break,
            (_, DispatchOutcome::Err(e)) => {
                let msg = format_error(e);
                collab.display.print_error(&msg);
            }
            _ => {}
        }

        render::draw(model.current_mut(), filename.as_deref())?;
    }

    Ok(())
}

fn format_error(e: ErrorKind) -> String {
    format!("{e}")
}
