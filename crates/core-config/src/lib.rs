//! Typed configuration records (C12): the per-buffer `Options` and the
//! process-wide `GlobalOptions`.
//!
//! This crate never touches a filesystem path or a config-file format;
//! that belongs to a `Storage` implementation (see `core-collab`). It
//! only defines what a "preference" *is*, so the core, a concrete
//! Storage, and a test harness all agree on the same typed shape.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bracket-automatch visual styles, OR-combined into `Options::automatch`.
pub mod automatch {
    pub const BRIGHTNESS: u8 = 1;
    pub const INVERSE: u8 = 2;
    pub const BOLD: u8 = 4;
    pub const UNDERLINE: u8 = 8;
}

/// Errors raised validating a setting against its documented range.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tab size out of range")]
    TabSizeOutOfRange,
    #[error("escape time out of range")]
    EscapeTimeOutOfRange,
}

/// Per-buffer options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub tabs: bool,
    pub shift_tabs: bool,
    pub tab_size: u16,
    pub insert: bool,
    pub word_wrap: bool,
    pub right_margin: u16,
    pub free_form: bool,
    pub preserve_cr: bool,
    pub binary: bool,
    pub read_only: bool,
    pub do_undo: bool,
    pub auto_indent: bool,
    pub auto_prefs: bool,
    pub no_file_req: bool,
    pub utf8auto: bool,
    pub case_search: bool,
    pub search_back: bool,
    pub hex_code: bool,
    pub visual_bell: bool,
    pub automatch: u8,
    pub cur_clip: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            tabs: true,
            shift_tabs: false,
            tab_size: 8,
            insert: true,
            word_wrap: false,
            right_margin: 0,
            free_form: false,
            preserve_cr: false,
            binary: false,
            read_only: false,
            do_undo: true,
            auto_indent: false,
            auto_prefs: false,
            no_file_req: false,
            utf8auto: true,
            case_search: false,
            search_back: false,
            hex_code: false,
            visual_bell: false,
            automatch: automatch::BRIGHTNESS,
            cur_clip: 0,
        }
    }
}

impl Options {
    /// Validates `tab_size` against `ne_columns/2`.
    pub fn validate_tab_size(tab_size: u16, ne_columns: u16) -> Result<(), ConfigError> {
        if tab_size == 0 || tab_size as u32 >= (ne_columns as u32 / 2).max(1) {
            Err(ConfigError::TabSizeOutOfRange)
        } else {
            Ok(())
        }
    }
}

/// Process-wide options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalOptions {
    pub status_bar: bool,
    pub fast_gui: bool,
    pub verbose_macros: bool,
    pub req_order: bool,
    pub io_utf8: bool,
    pub turbo: u16,
    /// Tenths of a second; must stay below 256.
    pub escape_time: u16,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        GlobalOptions {
            status_bar: true,
            fast_gui: false,
            verbose_macros: false,
            req_order: false,
            io_utf8: true,
            turbo: 0,
            escape_time: 1,
        }
    }
}

impl GlobalOptions {
    pub fn validate_escape_time(escape_time: u16) -> Result<(), ConfigError> {
        if escape_time >= 256 {
            Err(ConfigError::EscapeTimeOutOfRange)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let opt = Options::default();
        assert!(opt.tabs);
        assert!(opt.insert);
        assert_eq!(opt.tab_size, 8);
        assert_eq!(opt.right_margin, 0);
    }

    #[test]
    fn tab_size_out_of_range_is_rejected() {
        assert_eq!(
            Options::validate_tab_size(40, 80),
            Err(ConfigError::TabSizeOutOfRange)
        );
        assert_eq!(Options::validate_tab_size(8, 80), Ok(()));
    }

    #[test]
    fn escape_time_out_of_range_is_rejected() {
        assert_eq!(
            GlobalOptions::validate_escape_time(256),
            Err(ConfigError::EscapeTimeOutOfRange)
        );
        assert_eq!(GlobalOptions::validate_escape_time(255), Ok(()));
    }

    #[test]
    fn round_trips_through_toml() {
        let opt = Options::default();
        let text = toml::to_string(&opt).unwrap();
        let back: Options = toml::from_str(&text).unwrap();
        assert_eq!(opt, back);
    }
}
