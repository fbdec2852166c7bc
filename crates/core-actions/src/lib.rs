//! Operations on a `Buffer`: the editing primitives (C5), syntax-state
//! propagation (C6), clipboard transforms (C7), macro recording (C8),
//! search/replace, and the action dispatcher that ties them all
//! together (C9).
//!
//! `core-state` owns the data; this crate owns what happens to it.

pub mod action;
pub mod clipboard_ops;
pub mod dispatcher;
pub mod editops;
pub mod find_replace;
pub mod macro_engine;
pub mod string_arg;
pub mod syntax_bridge;

pub use action::{Action, FlagArg, normalize, UNSPECIFIED};
pub use dispatcher::{do_action, Collaborators};
pub use macro_engine::{MacroEngine, MacroStep};
pub use string_arg::StringArg;
