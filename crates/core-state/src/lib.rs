//! Per-buffer editing state: the `Buffer` aggregate, the undo log (C4),
//! bookmarks, and clip storage (C7).
//!
//! `core-actions` owns the *operations* on a `Buffer` (the dispatcher and
//! `EditOps`); this crate only owns the data and the invariants that
//! don't require orchestrating several components at once.

pub mod bookmarks;
pub mod buffer;
pub mod clipboard;
pub mod errors;
pub mod undo;

pub use bookmarks::{Bookmark, Bookmarks, Designation, NUM_BOOKMARKS};
pub use buffer::{Buffer, MarkOrigin};
pub use clipboard::{Clip, Clipboards, THROUGH_CLIP};
pub use errors::{DispatchOutcome, ErrorKind, numeric_error};
pub use undo::{UndoLog, UndoRecord};
