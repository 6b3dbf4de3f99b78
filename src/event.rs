//! Raw input events and live modifier state.
//!
//! The host feeds `KeyEvent`s into the engine exactly as the platform
//! delivers them; nothing here is canonicalized. `ModifierTracker` derives
//! the ctrl/alt/shift/meta state from those events, and `TypingGuard`
//! decides which event targets swallow shortcuts (text entry must never
//! trigger them).

use std::collections::HashSet;

use tracing::trace;

use crate::types::Modifiers;

/// Where a key event landed, as far as shortcut dispatch cares.
///
/// The host tags events originating from focusable elements with the
/// element's kind (e.g. `"text-input"`); the engine's [`TypingGuard`]
/// matches those kinds. `enter_opt_in` marks targets that still want
/// `Enter` delivered as a shortcut (a search field with a "go" binding,
/// say) even while ordinary keys are swallowed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyTarget {
    pub kind: Option<String>,
    pub enter_opt_in: bool,
}

impl KeyTarget {
    /// A target of the given element kind.
    pub fn element(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            enter_opt_in: false,
        }
    }

    /// Mark this target as still accepting `Enter` as a shortcut.
    pub fn with_enter_opt_in(mut self) -> Self {
        self.enter_opt_in = true;
        self
    }
}

/// A raw key event as delivered by the host.
///
/// `key` is the platform key identifier, untouched: `"m"`, `"M"`, `" "`,
/// `"Escape"`, `"Control"`, ...
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub target: KeyTarget,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            target: KeyTarget::default(),
        }
    }

    pub fn with_target(mut self, target: KeyTarget) -> Self {
        self.target = target;
        self
    }
}

/// The set of element kinds whose key events must not dispatch shortcuts.
#[derive(Clone, Debug, Default)]
pub struct TypingGuard {
    kinds: HashSet<String>,
}

impl TypingGuard {
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
        }
    }

    /// A guard that captures nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether events from this target are swallowed.
    pub fn captures(&self, target: &KeyTarget) -> bool {
        target
            .kind
            .as_deref()
            .is_some_and(|kind| self.kinds.contains(kind))
    }
}

/// Live state of the four modifier keys.
///
/// Fed from raw key-down/key-up events. `blur` unconditionally clears all
/// flags: when focus leaves the window the matching key-ups are never
/// delivered, and without the reset a modifier would stay stuck down.
#[derive(Debug, Default)]
pub struct ModifierTracker {
    modifiers: Modifiers,
}

impl ModifierTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key going down. Returns true if the key was a modifier.
    pub fn key_down(&mut self, key: &str) -> bool {
        self.set_flag(key, true)
    }

    /// Record a key coming up. Returns true if the key was a modifier.
    pub fn key_up(&mut self, key: &str) -> bool {
        self.set_flag(key, false)
    }

    /// The window lost input focus; release everything.
    pub fn blur(&mut self) {
        if self.modifiers.any() {
            trace!("window blur, releasing modifier state");
        }
        self.modifiers = Modifiers::default();
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    fn set_flag(&mut self, key: &str, pressed: bool) -> bool {
        match key {
            "Control" => self.modifiers.ctrl = pressed,
            "Alt" => self.modifiers.alt = pressed,
            "Shift" => self.modifiers.shift = pressed,
            // "OS" is the legacy identifier some hosts still report.
            "Meta" | "OS" | "Super" => self.modifiers.meta = pressed,
            _ => return false,
        }
        true
    }
}
