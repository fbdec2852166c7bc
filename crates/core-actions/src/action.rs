//! The action surface: every symbolic action the dispatcher accepts,
//! each carrying `(intArg, stringArg)` per the dispatcher's calling
//! convention.

/// `intArg = -1` means "unspecified". Most movement/editing actions
/// treat unspecified as a repeat count of 1.
pub const UNSPECIFIED: i64 = -1;

/// `NORMALIZE(c)`: an unspecified repeat count becomes 1.
pub fn normalize(c: i64) -> i64 {
    if c < 0 { 1 } else { c }
}

/// The on/off/toggle triple every flag action accepts: `intArg<0` toggles,
/// `=0` clears, `>0` sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagArg {
    Toggle,
    Clear,
    Set,
}

impl From<i64> for FlagArg {
    fn from(v: i64) -> Self {
        if v < 0 {
            FlagArg::Toggle
        } else if v == 0 {
            FlagArg::Clear
        } else {
            FlagArg::Set
        }
    }
}

impl FlagArg {
    pub fn apply(self, current: bool) -> bool {
        match self {
            FlagArg::Toggle => !current,
            FlagArg::Clear => false,
            FlagArg::Set => true,
        }
    }
}

/// Every action the dispatcher can receive, by category.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    // --- process / document lifecycle ---
    Exit,
    Quit,
    NewDoc,
    CloseDoc,
    NextDoc,
    PrevDoc,
    SelectDoc(i64),
    Open,
    OpenNew,
    Save,
    SaveAs,
    About,
    Refresh,
    Clear,
    Suspend,
    Escape,
    Flags,
    Help,
    KeyCode,

    // --- navigation (C3) ---
    LineUp,
    LineDown,
    PrevPage,
    NextPage,
    MoveLeft,
    MoveRight,
    MoveSol,
    MoveEol,
    MoveSof,
    MoveEof,
    PageUp,
    PageDown,
    MoveTos,
    MoveBos,
    AdjustView(String),
    ToggleSeof,
    ToggleSeol,
    NextWord,
    PrevWord,
    MoveEow,
    MoveIncUp,
    MoveIncDown,
    GotoLine,
    GotoColumn,

    // --- bookmarks ---
    SetBookmark(String),
    GotoBookmark(String),
    UnsetBookmark(String),

    // --- editing primitives (C5) ---
    InsertChar(i64),
    InsertString(String),
    InsertTab,
    Tabs,
    ShiftTabs,
    AutomatchBracket,
    Backspace,
    DeleteChar,
    InsertLine,
    DeleteLine,
    UndelLine,
    DeleteEol,
    DeletePrevWord,
    DeleteNextWord,
    ToUpper,
    ToLower,
    Capitalize,
    Center,
    Paragraph,
    Shift(String),
    MatchBracket,
    AutoComplete,

    // --- selection & clipboard (C7) ---
    Mark,
    MarkVert,
    Cut,
    Copy,
    Erase,
    Paste,
    PasteVert,
    GotoMark,
    OpenClip,
    SaveClip,
    ClipNumber,
    Through(String),

    // --- search / replace ---
    Find(String),
    FindRegExp(String),
    Replace(String),
    ReplaceOnce,
    ReplaceAll,
    RepeatLast,
    CaseSearch,
    SearchBack,

    // --- macros (C8) ---
    Record,
    Play,
    SaveMacro,
    OpenMacro,
    Macro(String),
    UnloadMacros,

    // --- preferences ---
    PushPrefs,
    PopPrefs,
    LoadPrefs,
    SavePrefs,
    LoadAutoPrefs,
    SaveAutoPrefs,
    SaveDefPrefs,
    AutoPrefs(i64),
    Syntax(String),

    // --- boolean flags (on/off/toggle triple) ---
    FreeForm(i64),
    PreserveCr(i64),
    Crlf(i64),
    VisualBell(i64),
    StatusBar(i64),
    HexCode(i64),
    FastGui(i64),
    Insert(i64),
    WordWrap(i64),
    AutoIndent(i64),
    VerboseMacros(i64),
    Binary(i64),
    NoFileReq(i64),
    RequestOrder(i64),
    Utf8Auto(i64),
    ReadOnly(i64),
    DoUndo(i64),
    Modified(i64),

    // --- numeric settings ---
    TabSize(i64),
    EscapeTime(i64),
    Turbo(i64),
    RightMargin(i64),

    // --- encoding & undo ---
    Utf8,
    Utf8Io(i64),
    Undo,
    Redo,
    AtomicUndo(Option<i64>),

    // --- misc / display ---
    Alert,
    Beep,
    Flash,

    // --- subprocess ---
    Exec(String),
    System(String),
}
