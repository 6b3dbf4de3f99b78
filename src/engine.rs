//! The dispatch engine: handler table, re-registration, and the key-down
//! pipeline.
//!
//! Handlers are registered against *actions*, not shortcuts. The engine
//! resolves each action's current binding into a per-context lookup table
//! and rebuilds that table whenever bindings change, so rebinding never
//! orphans a handler. Dispatch checks the current context first and falls
//! back to `"global"`; exactly one handler fires per key event.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::context::{ContextStack, GLOBAL_CONTEXT};
use crate::error::RegisterError;
use crate::event::{KeyEvent, ModifierTracker, TypingGuard};
use crate::overrides::{KeymapOverrides, OverrideError};
use crate::registry::{ActionId, Binding, KeymapRegistry};
use crate::types::Shortcut;

/// A shortcut callback. Invoked synchronously with the event that
/// triggered it.
pub type Handler = Box<dyn FnMut(&KeyEvent)>;

/// What happened to a key-down event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch<A> {
    /// A handler ran; the host should suppress the platform's default
    /// handling for this key combination.
    Handled(A),
    /// No binding matched in the current context or the global fallback.
    NoMatch,
    /// The typing guard swallowed the event (the target captures input).
    Guarded,
    /// Dispatch is disabled or the engine has been destroyed.
    Disabled,
}

impl<A> Dispatch<A> {
    /// True exactly when the host should call the platform's
    /// suppress-default mechanism.
    pub fn should_suppress_default(&self) -> bool {
        matches!(self, Self::Handled(_))
    }
}

struct Registration<A> {
    action: A,
    context: String,
    handler: Handler,
}

/// Context-aware shortcut dispatcher.
///
/// One instance per interactive surface; instances share no state and are
/// independently destructible. All methods are synchronous: a binding
/// change completes its re-registration before the call returns, and
/// dispatch for an event observes the modifier state updated by that same
/// event.
pub struct DispatchEngine<A: ActionId> {
    registry: KeymapRegistry<A>,
    guard: TypingGuard,
    tracker: ModifierTracker,
    contexts: ContextStack,
    /// Source of truth for what is registered; the table below is an
    /// index into it.
    registrations: Vec<Registration<A>>,
    /// context name -> shortcut -> registration index
    table: HashMap<String, HashMap<Shortcut, usize>>,
    enabled: bool,
    destroyed: bool,
}

impl<A: ActionId> DispatchEngine<A> {
    pub fn new(registry: KeymapRegistry<A>, guard: TypingGuard) -> Self {
        Self {
            registry,
            guard,
            tracker: ModifierTracker::new(),
            contexts: ContextStack::new(),
            registrations: Vec::new(),
            table: HashMap::new(),
            enabled: true,
            destroyed: false,
        }
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register a handler for an action in the global context.
    pub fn register(&mut self, action: A, handler: Handler) -> Result<(), RegisterError<A>> {
        self.register_in(action, GLOBAL_CONTEXT, handler)
    }

    /// Register a handler for an action in a specific context.
    ///
    /// The action must be known to the registry (default or override);
    /// otherwise registration is skipped with a warning. Registering the
    /// same (action, context) pair again replaces the previous handler.
    pub fn register_in(
        &mut self,
        action: A,
        context: impl Into<String>,
        handler: Handler,
    ) -> Result<(), RegisterError<A>> {
        if self.destroyed {
            warn!(action = ?action, "register on a destroyed engine");
            return Err(RegisterError::Destroyed);
        }
        if !self.registry.is_known(action) {
            warn!(action = ?action, "cannot register handler for unknown action");
            return Err(RegisterError::UnknownAction(action));
        }

        let context = context.into();
        match self.position(action, &context) {
            Some(i) => self.registrations[i].handler = handler,
            None => self.registrations.push(Registration {
                action,
                context,
                handler,
            }),
        }
        self.rebuild_table();
        Ok(())
    }

    /// Remove an action's handler from the global context.
    pub fn unregister(&mut self, action: A) {
        self.unregister_in(action, GLOBAL_CONTEXT);
    }

    /// Remove an action's handler from a context. No-op if absent.
    ///
    /// The engine never removes handlers on `pop_context`; a host that
    /// registers handlers for the lifetime of a scope owns unregistering
    /// them when the scope closes.
    pub fn unregister_in(&mut self, action: A, context: impl AsRef<str>) {
        let context = context.as_ref();
        if let Some(i) = self.position(action, context) {
            self.registrations.remove(i);
            self.rebuild_table();
        }
    }

    fn position(&self, action: A, context: &str) -> Option<usize> {
        self.registrations
            .iter()
            .position(|r| r.action == action && r.context == context)
    }

    // ------------------------------------------------------------------
    // Bindings
    // ------------------------------------------------------------------

    /// Replace the override set wholesale and re-register every handler
    /// against the new bindings before returning.
    pub fn set_overrides(&mut self, entries: impl IntoIterator<Item = (A, Option<Binding>)>) {
        self.registry.set_overrides(entries);
        self.rebuild_table();
    }

    /// Clear all overrides, reverting to the default keymap.
    pub fn reset_overrides(&mut self) {
        self.registry.reset_overrides();
        self.rebuild_table();
    }

    /// Apply a serialized override document, returning its parse errors.
    /// Valid entries still take effect.
    pub fn apply_overrides(&mut self, doc: &KeymapOverrides<A>) -> Vec<OverrideError<A>> {
        let (entries, errors) = doc.resolve(&self.registry);
        for error in &errors {
            warn!(%error, "skipping unparseable override entry");
        }
        self.set_overrides(entries);
        errors
    }

    /// Merged default+override bindings, for a host help display.
    pub fn bindings(&self) -> Vec<(A, &Binding)> {
        self.registry.bindings()
    }

    pub fn registry(&self) -> &KeymapRegistry<A> {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Contexts
    // ------------------------------------------------------------------

    pub fn push_context(&mut self, name: impl Into<String>) {
        self.contexts.push(name);
    }

    pub fn pop_context(&mut self) -> Option<String> {
        self.contexts.pop()
    }

    pub fn replace_top(&mut self, name: impl Into<String>) {
        self.contexts.replace_top(name);
    }

    pub fn current_context(&self) -> &str {
        self.contexts.current()
    }

    // ------------------------------------------------------------------
    // Enable / teardown
    // ------------------------------------------------------------------

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.destroyed
    }

    /// Tear the engine down: all registrations are dropped and dispatch
    /// becomes permanently inert. Safe to call any number of times.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.enabled = false;
        self.registrations.clear();
        self.table.clear();
        debug!("dispatch engine destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ------------------------------------------------------------------
    // Event pipeline
    // ------------------------------------------------------------------

    /// Feed a key-down event through the dispatch pipeline.
    pub fn key_down(&mut self, event: &KeyEvent) -> Dispatch<A> {
        // Modifier state updates first, so this very event is resolved
        // against it.
        self.tracker.key_down(&event.key);

        if self.destroyed || !self.enabled {
            return Dispatch::Disabled;
        }
        if self.guard.captures(&event.target) && !always_handled(event) {
            trace!(key = %event.key, "typing guard swallowed event");
            return Dispatch::Guarded;
        }

        let shortcut = Shortcut::new(&event.key, self.tracker.modifiers());
        let Some(index) = self.resolve(&shortcut) else {
            return Dispatch::NoMatch;
        };

        let registration = &mut self.registrations[index];
        let action = registration.action;
        trace!(action = ?action, shortcut = %shortcut, context = %registration.context, "dispatch");
        (registration.handler)(event);
        Dispatch::Handled(action)
    }

    /// Feed a key-up event (modifier bookkeeping only).
    pub fn key_up(&mut self, event: &KeyEvent) {
        if !self.destroyed {
            self.tracker.key_up(&event.key);
        }
    }

    /// The window lost input focus; modifier state resets so keys
    /// released outside the window cannot stick.
    pub fn window_blur(&mut self) {
        self.tracker.blur();
    }

    fn resolve(&self, shortcut: &Shortcut) -> Option<usize> {
        let current = self.contexts.current();
        if let Some(&i) = self.table.get(current).and_then(|m| m.get(shortcut)) {
            return Some(i);
        }
        if current != GLOBAL_CONTEXT {
            return self
                .table
                .get(GLOBAL_CONTEXT)
                .and_then(|m| m.get(shortcut))
                .copied();
        }
        None
    }

    /// Recompute the context -> shortcut -> handler index from the
    /// retained registrations and the registry's current bindings.
    fn rebuild_table(&mut self) {
        self.table.clear();
        for (i, registration) in self.registrations.iter().enumerate() {
            let Some(binding) = self.registry.binding(registration.action) else {
                debug!(
                    action = ?registration.action,
                    "registration has no effective binding, parked until rebound"
                );
                continue;
            };
            let slot = self.table.entry(registration.context.clone()).or_default();
            if let Some(prev) = slot.insert(binding.shortcut.clone(), i) {
                warn!(
                    shortcut = %binding.shortcut,
                    context = %registration.context,
                    shadowed = ?self.registrations[prev].action,
                    winner = ?registration.action,
                    "shortcut collision, later registration wins"
                );
            }
        }
    }
}

impl<A: ActionId> fmt::Debug for DispatchEngine<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("registrations", &self.registrations.len())
            .field("current_context", &self.contexts.current())
            .field("enabled", &self.enabled)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

/// Keys that dispatch even from input-capturing targets: `Escape` must
/// always close things, and `Enter` when the target opted in.
fn always_handled(event: &KeyEvent) -> bool {
    event.key == "Escape" || (event.key == "Enter" && event.target.enter_opt_in)
}
