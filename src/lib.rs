//! Context-aware keyboard shortcut dispatch.
//!
//! This crate provides:
//! - Typed action identifiers and a rebindable keymap registry
//! - Deterministic canonical shortcut encoding and parsing
//! - An ordered context stack with a `"global"` fallback
//! - Live modifier tracking with blur reset (no stuck modifiers)
//! - A typing guard so text entry never triggers shortcuts
//!
//! # Architecture
//!
//! Handlers are registered against actions, not key strings. The engine
//! resolves each action's current binding into a per-context lookup table
//! and rebuilds it whenever the keymap changes, so user rebinding never
//! orphans a handler. Resolution checks the current context first, then
//! the global base; exactly one handler fires per key event.
//!
//! # Example
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use shortcut_kit::{
//!     Binding, DispatchEngine, KeyEvent, KeymapRegistry, Shortcut, TypingGuard,
//! };
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Action {
//!     Save,
//!     CloseOverlay,
//! }
//!
//! let registry = KeymapRegistry::new([
//!     (Action::Save, Binding::new(Shortcut::parse("Ctrl+S")?, "Save the document")),
//!     (Action::CloseOverlay, Binding::new(Shortcut::parse("Escape")?, "Close the overlay")),
//! ]);
//! let mut engine = DispatchEngine::new(registry, TypingGuard::new(["text-input"]));
//!
//! engine.register(Action::Save, Box::new(|_event: &KeyEvent| { /* save */ }))?;
//!
//! engine.key_down(&KeyEvent::new("Control"));
//! let outcome = engine.key_down(&KeyEvent::new("s"));
//! assert!(outcome.should_suppress_default());
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod event;
pub mod overrides;
pub mod registry;
pub mod types;

pub use context::{ContextStack, GLOBAL_CONTEXT};
pub use engine::{Dispatch, DispatchEngine, Handler};
pub use error::{RegisterError, ResultExt};
pub use event::{KeyEvent, KeyTarget, ModifierTracker, TypingGuard};
pub use overrides::{KeymapOverrides, OverrideError};
pub use registry::{ActionId, Binding, KeymapRegistry};
pub use types::{
    canonicalize_key, is_known_key, Modifiers, Platform, Shortcut, ShortcutParseError,
};



#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;
