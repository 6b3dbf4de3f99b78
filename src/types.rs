//! Core shortcut types: modifier flags, canonical shortcuts, and parsing.
//!
//! This module provides:
//! - `Modifiers` - modifier key flags (ctrl, alt, shift, meta)
//! - `Shortcut` - a canonical keyboard shortcut (modifiers + key)
//! - `ShortcutParseError` - detailed parse errors for user feedback
//! - Platform-aware display (⌃⇧R on macOS, Ctrl+Shift+R elsewhere)
//!
//! The canonical string form is the load-bearing invariant: a shortcut
//! built from a statically declared keymap and one encoded from a runtime
//! key event must compare equal, regardless of the order the modifiers
//! were observed in. Modifier tokens always render in the fixed order
//! Ctrl, Alt, Shift, Meta.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when parsing a shortcut string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortcutParseError {
    #[error("empty shortcut string")]
    Empty,
    #[error("shortcut names no key, only modifiers")]
    MissingKey,
    #[error("unrecognized token `{0}` in shortcut")]
    UnknownToken(String),
    #[error("unrecognized key `{0}`")]
    UnknownKey(String),
}

/// Modifier keys for a shortcut.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub meta: bool,
}

impl Modifiers {
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Default::default()
        }
    }
    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Default::default()
        }
    }
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Default::default()
        }
    }
    pub fn meta() -> Self {
        Self {
            meta: true,
            ..Default::default()
        }
    }
    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.shift || self.meta
    }
    pub fn none(&self) -> bool {
        !self.any()
    }
}

/// Platform enum for display formatting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    MacOS,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        #[cfg(target_os = "macos")]
        {
            Platform::MacOS
        }
        #[cfg(target_os = "windows")]
        {
            Platform::Windows
        }
        #[cfg(target_os = "linux")]
        {
            Platform::Linux
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            Platform::Linux
        }
    }
}

/// A keyboard shortcut consisting of modifier flags and a canonical key.
///
/// Construction always canonicalizes the key, so two shortcuts describing
/// the same chord are equal and hash identically whatever the source
/// spelling was.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub modifiers: Modifiers,
    pub key: String,
}

impl Shortcut {
    pub fn new(key: impl AsRef<str>, modifiers: Modifiers) -> Self {
        Self {
            modifiers,
            key: canonicalize_key(key.as_ref()),
        }
    }

    /// Parse a human-written shortcut string such as `"Ctrl+Shift+R"`,
    /// `"alt m"`, or `"meta+Enter"`.
    ///
    /// Tokens may be separated by `+` or whitespace and are matched
    /// case-insensitively; common modifier and key aliases are accepted.
    /// The key is validated against the known set so configuration typos
    /// surface as errors instead of dead bindings.
    pub fn parse(s: &str) -> Result<Self, ShortcutParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShortcutParseError::Empty);
        }

        let normalized = s.replace('+', " ");
        let parts: Vec<&str> = normalized.split_whitespace().collect();
        if parts.is_empty() {
            return Err(ShortcutParseError::Empty);
        }

        let mut modifiers = Modifiers::default();
        let mut key_part: Option<&str> = None;

        for part in &parts {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "ctl" | "^" => modifiers.ctrl = true,
                "alt" | "opt" | "option" | "⌥" => modifiers.alt = true,
                "shift" | "⇧" => modifiers.shift = true,
                "meta" | "cmd" | "command" | "super" | "win" | "⌘" => modifiers.meta = true,
                _ => {
                    if key_part.is_some() {
                        return Err(ShortcutParseError::UnknownToken((*part).to_string()));
                    }
                    key_part = Some(part);
                }
            }
        }

        let key = key_part.ok_or(ShortcutParseError::MissingKey)?;
        let canonical = canonicalize_key(key);
        if !is_known_key(&canonical) {
            return Err(ShortcutParseError::UnknownKey(key.to_string()));
        }

        Ok(Self {
            modifiers,
            key: canonical,
        })
    }

    /// Render for the given platform: glyph style on macOS, the canonical
    /// `+`-joined form everywhere else.
    pub fn display_for_platform(&self, platform: Platform) -> String {
        match platform {
            Platform::MacOS => self.display_macos(),
            Platform::Windows | Platform::Linux => self.to_string(),
        }
    }

    /// Render for the current platform.
    pub fn display(&self) -> String {
        self.display_for_platform(Platform::current())
    }

    fn display_macos(&self) -> String {
        let mut s = String::new();
        if self.modifiers.ctrl {
            s.push('⌃');
        }
        if self.modifiers.alt {
            s.push('⌥');
        }
        if self.modifiers.shift {
            s.push('⇧');
        }
        if self.modifiers.meta {
            s.push('⌘');
        }
        s.push_str(&self.key_glyph());
        s
    }

    fn key_glyph(&self) -> String {
        match self.key.as_str() {
            "Enter" => "↵",
            "Escape" => "⎋",
            "Tab" => "⇥",
            "Space" => "␣",
            "Backspace" => "⌫",
            "Delete" => "⌦",
            "ArrowUp" => "↑",
            "ArrowDown" => "↓",
            "ArrowLeft" => "←",
            "ArrowRight" => "→",
            "Home" => "↖",
            "End" => "↘",
            "PageUp" => "⇞",
            "PageDown" => "⇟",
            k => return k.to_string(),
        }
        .to_string()
    }
}

/// The canonical form: modifier tokens in the fixed Ctrl, Alt, Shift,
/// Meta order, then the key, joined with `+`.
impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.modifiers.alt {
            f.write_str("Alt+")?;
        }
        if self.modifiers.shift {
            f.write_str("Shift+")?;
        }
        if self.modifiers.meta {
            f.write_str("Meta+")?;
        }
        f.write_str(&self.key)
    }
}

impl std::str::FromStr for Shortcut {
    type Err = ShortcutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Serialized as the canonical string, so override documents stay
/// hand-editable.
impl Serialize for Shortcut {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Shortcut {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(D::Error::custom)
    }
}

/// Canonicalize a key identifier.
///
/// The space character becomes `Space`, a single printable character is
/// upper-cased, known aliases collapse to their canonical name, and any
/// other key name passes through verbatim. Runtime key events and static
/// keymap declarations therefore meet in the same form.
pub fn canonicalize_key(key: &str) -> String {
    if key == " " {
        return "Space".to_string();
    }
    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return c.to_uppercase().to_string();
    }
    match key.to_ascii_lowercase().as_str() {
        "space" => "Space",
        "esc" | "escape" => "Escape",
        "enter" | "return" => "Enter",
        "tab" => "Tab",
        "backspace" | "back" => "Backspace",
        "delete" | "del" => "Delete",
        "insert" | "ins" => "Insert",
        "up" | "arrowup" | "uparrow" => "ArrowUp",
        "down" | "arrowdown" | "downarrow" => "ArrowDown",
        "left" | "arrowleft" | "leftarrow" => "ArrowLeft",
        "right" | "arrowright" | "rightarrow" => "ArrowRight",
        "home" => "Home",
        "end" => "End",
        "pageup" | "pgup" => "PageUp",
        "pagedown" | "pgdn" | "pgdown" => "PageDown",
        lower => {
            if let Some(n) = function_key_number(lower) {
                return format!("F{n}");
            }
            return key.to_string();
        }
    }
    .to_string()
}

fn function_key_number(lower: &str) -> Option<u8> {
    let digits = lower.strip_prefix('f')?;
    let n: u8 = digits.parse().ok()?;
    (1..=24).contains(&n).then_some(n)
}

/// Check whether a canonical key name is part of the known set.
///
/// Any single character counts; multi-character names must be one of the
/// named keys or a function key.
pub fn is_known_key(key: &str) -> bool {
    if key.chars().count() == 1 {
        return true;
    }
    if function_key_number(&key.to_ascii_lowercase()).is_some() {
        return true;
    }
    matches!(
        key,
        "Space"
            | "Enter"
            | "Escape"
            | "Tab"
            | "Backspace"
            | "Delete"
            | "Insert"
            | "Home"
            | "End"
            | "PageUp"
            | "PageDown"
            | "ArrowUp"
            | "ArrowDown"
            | "ArrowLeft"
            | "ArrowRight"
    )
}
