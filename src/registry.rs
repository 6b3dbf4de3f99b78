//! Keymap registry: typed actions, default bindings, user overrides.
//!
//! Uses Vec storage for deterministic iteration order and a HashMap index
//! for O(1) lookup. Overrides are replaced wholesale and always win over
//! defaults; an override entry of `None` disables the action's shortcut
//! without forgetting it.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::Shortcut;

/// Identifier for a host-defined action.
///
/// Hosts are expected to use a plain enum, which makes the set of
/// dispatchable actions closed at compile time; there is no string name
/// to mistype.
pub trait ActionId: Copy + Eq + Hash + fmt::Debug + 'static {}

impl<T> ActionId for T where T: Copy + Eq + Hash + fmt::Debug + 'static {}

/// The association between an action and its shortcut.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub shortcut: Shortcut,
    /// Human-readable label for help and settings displays.
    pub description: String,
}

impl Binding {
    pub fn new(shortcut: Shortcut, description: impl Into<String>) -> Self {
        Self {
            shortcut,
            description: description.into(),
        }
    }
}

/// Registry of action bindings: a host-supplied default table plus a
/// wholesale-replaceable override set.
#[derive(Clone, Debug)]
pub struct KeymapRegistry<A: ActionId> {
    defaults: Vec<(A, Binding)>,
    default_index: HashMap<A, usize>,
    overrides: Vec<(A, Option<Binding>)>,
    override_index: HashMap<A, usize>,
}

impl<A: ActionId> KeymapRegistry<A> {
    /// Build a registry from the host's default keymap. A duplicate
    /// action replaces the earlier entry, with a warning.
    pub fn new(defaults: impl IntoIterator<Item = (A, Binding)>) -> Self {
        let mut registry = Self {
            defaults: Vec::new(),
            default_index: HashMap::new(),
            overrides: Vec::new(),
            override_index: HashMap::new(),
        };
        for (action, binding) in defaults {
            if let Some(&i) = registry.default_index.get(&action) {
                warn!(action = ?action, "duplicate default binding, keeping the later one");
                registry.defaults[i].1 = binding;
            } else {
                registry.default_index.insert(action, registry.defaults.len());
                registry.defaults.push((action, binding));
            }
        }
        registry
    }

    /// Whether the action has any default or override entry.
    pub fn is_known(&self, action: A) -> bool {
        self.default_index.contains_key(&action) || self.override_index.contains_key(&action)
    }

    /// The effective binding: override if present (`None` = disabled),
    /// else default.
    pub fn binding(&self, action: A) -> Option<&Binding> {
        if let Some(&i) = self.override_index.get(&action) {
            return self.overrides[i].1.as_ref();
        }
        self.default_binding(action)
    }

    /// The default binding, ignoring overrides.
    pub fn default_binding(&self, action: A) -> Option<&Binding> {
        self.default_index.get(&action).map(|&i| &self.defaults[i].1)
    }

    /// Replace the override set wholesale.
    pub fn set_overrides(&mut self, entries: impl IntoIterator<Item = (A, Option<Binding>)>) {
        self.overrides.clear();
        self.override_index.clear();
        for (action, binding) in entries {
            if let Some(&i) = self.override_index.get(&action) {
                self.overrides[i].1 = binding;
            } else {
                self.override_index.insert(action, self.overrides.len());
                self.overrides.push((action, binding));
            }
        }
    }

    /// Drop all overrides, reverting every action to its default.
    pub fn reset_overrides(&mut self) {
        self.set_overrides(std::iter::empty());
    }

    pub fn has_overrides(&self) -> bool {
        !self.overrides.is_empty()
    }

    /// The current override entries, in insertion order. `None` marks a
    /// disabled action.
    pub fn override_entries(&self) -> impl Iterator<Item = (A, Option<&Binding>)> {
        self.overrides.iter().map(|(a, b)| (*a, b.as_ref()))
    }

    /// Merged view of effective bindings, in deterministic order: the
    /// default table first (disabled actions skipped), then override-only
    /// actions in override order. This is what a host help display
    /// renders.
    pub fn bindings(&self) -> Vec<(A, &Binding)> {
        let mut merged: Vec<(A, &Binding)> = Vec::with_capacity(self.defaults.len());
        for &(action, _) in &self.defaults {
            if let Some(binding) = self.binding(action) {
                merged.push((action, binding));
            }
        }
        for (action, binding) in &self.overrides {
            if self.default_index.contains_key(action) {
                continue;
            }
            if let Some(binding) = binding.as_ref() {
                merged.push((*action, binding));
            }
        }
        merged
    }

    /// Report every shortcut claimed by more than one action.
    ///
    /// Purely diagnostic: dispatch resolves such collisions by letting
    /// the later registration win, but a host settings screen will want
    /// to show them.
    pub fn find_conflicts(&self) -> Vec<(Shortcut, Vec<A>)> {
        let mut groups: Vec<(Shortcut, Vec<A>)> = Vec::new();
        for (action, binding) in self.bindings() {
            match groups.iter_mut().find(|(s, _)| *s == binding.shortcut) {
                Some((_, actions)) => actions.push(action),
                None => groups.push((binding.shortcut.clone(), vec![action])),
            }
        }
        groups.retain(|(_, actions)| actions.len() > 1);
        groups
    }
}
