//! The user-facing error vocabulary and the dispatcher's outcome type.

use thiserror::Error;

/// Every way a primitive or the dispatcher can fail, each carrying the
/// user-facing string the original source printed via `print_error`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("generic error")]
    Error,
    #[error("can't save all modified buffers, exit suspended")]
    CantSaveExitSuspended,
    #[error("the file is read only")]
    FileIsReadOnly,
    #[error("can't insert character code zero")]
    CantInsert0,
    #[error("invalid character")]
    InvalidCharacter,
    #[error("invalid string")]
    InvalidString,
    #[error("invalid bookmark designation")]
    InvalidBookmarkDesignation,
    #[error("invalid match mode")]
    InvalidMatchMode,
    #[error("invalid level")]
    InvalidLevel,
    #[error("bookmark not set")]
    BookmarkNotSet,
    #[error("no unset bookmarks to set")]
    NoUnsetBookmarksToSet,
    #[error("no set bookmarks to go to")]
    NoSetBookmarksToGoto,
    #[error("no set bookmarks to unset")]
    NoSetBookmarksToUnset,
    #[error("not a number")]
    NotANumber,
    #[error("out of memory")]
    OutOfMemory,
    #[error("incompatible search string encoding")]
    IncompatibleSearchStringEncoding,
    #[error("incompatible replace string encoding")]
    IncompatibleReplaceStringEncoding,
    #[error("no search string")]
    NoSearchString,
    #[error("no replace string")]
    NoReplaceString,
    #[error("undo is not enabled")]
    UndoNotEnabled,
    #[error("syntax highlighting is not enabled")]
    SyntaxNotEnabled,
    #[error("the buffer is not UTF-8")]
    BufferIsNotUtf8,
    #[error("tab size out of range")]
    TabSizeOutOfRange,
    #[error("escape time out of range")]
    EscapeTimeOutOfRange,
    #[error("external command error")]
    ExternalCommandError,
    #[error("can't open temporary file")]
    CantOpenTemporaryFile,
    #[error("mark a block first")]
    MarkBlockFirst,
    #[error("the file has been migrated")]
    FileIsMigrated,
    #[error("the file is a directory")]
    FileIsDirectory,
    #[error("the file is too large")]
    FileIsTooLarge,
    #[error("I/O error")]
    IoError,
    #[error("not found")]
    NotFound,
    #[error("no completion found")]
    AutocompleteNoMatch,
}

/// The dispatcher's return value: success, user-requested cancellation,
/// or a specific failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ok,
    Stopped,
    Err(ErrorKind),
}

impl DispatchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, DispatchOutcome::Ok)
    }

    pub fn is_err(&self) -> bool {
        matches!(self, DispatchOutcome::Err(_))
    }
}

impl From<ErrorKind> for DispatchOutcome {
    fn from(kind: ErrorKind) -> Self {
        DispatchOutcome::Err(kind)
    }
}

/// Implements `NUMERIC_ERROR(c)`: non-numeric prompt input becomes
/// `NotANumber`, an explicit abort becomes `Ok`.
pub fn numeric_error(aborted: bool) -> DispatchOutcome {
    if aborted {
        DispatchOutcome::Ok
    } else {
        DispatchOutcome::Err(ErrorKind::NotANumber)
    }
}
