//! User keymap customization as a serializable document.
//!
//! Format: a map from action to an optional shortcut string, where
//! - `"Alt+M"` (any parseable string) rebinds the action, and
//! - `null` disables the action's shortcut.
//!
//! The engine performs no file I/O; the host loads this document from
//! wherever it keeps preferences, applies it, and serializes the current
//! state back when saving.

use std::collections::HashMap;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::{ActionId, Binding, KeymapRegistry};
use crate::types::{Shortcut, ShortcutParseError};

/// An override entry whose shortcut string does not parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid shortcut {value:?} for action {action:?}: {source}")]
pub struct OverrideError<A: ActionId> {
    pub action: A,
    pub value: String,
    #[source]
    pub source: ShortcutParseError,
}

/// User shortcut overrides, as the host persists them.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeymapOverrides<A: Eq + Hash> {
    overrides: HashMap<A, Option<String>>,
}

impl<A: Eq + Hash> Default for KeymapOverrides<A> {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }
}

impl<A: Eq + Hash> KeymapOverrides<A> {
    /// Rebind (`Some`) or disable (`None`) an action.
    pub fn set(&mut self, action: A, shortcut: Option<String>) {
        self.overrides.insert(action, shortcut);
    }

    /// Drop an entry, reverting the action to its default.
    pub fn remove(&mut self, action: &A) {
        self.overrides.remove(action);
    }

    pub fn get(&self, action: &A) -> Option<&Option<String>> {
        self.overrides.get(action)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn clear(&mut self) {
        self.overrides.clear();
    }
}

impl<A: Eq + Hash + DeserializeOwned> KeymapOverrides<A> {
    /// Parse a JSON document the host read from its preference store.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl<A: Eq + Hash + Serialize> KeymapOverrides<A> {
    /// Serialize for the host to write to its preference store.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl<A: ActionId> KeymapOverrides<A> {
    /// Resolve the document against a registry into concrete override
    /// entries. Unparseable shortcuts are reported and skipped; valid
    /// entries still resolve. Rebound actions keep their default
    /// description.
    pub fn resolve(
        &self,
        registry: &KeymapRegistry<A>,
    ) -> (Vec<(A, Option<Binding>)>, Vec<OverrideError<A>>) {
        let mut entries = Vec::with_capacity(self.overrides.len());
        let mut errors = Vec::new();
        for (&action, value) in &self.overrides {
            match value {
                None => entries.push((action, None)),
                Some(s) => match Shortcut::parse(s) {
                    Ok(shortcut) => {
                        let description = registry
                            .default_binding(action)
                            .map(|b| b.description.clone())
                            .unwrap_or_default();
                        entries.push((action, Some(Binding::new(shortcut, description))));
                    }
                    Err(source) => errors.push(OverrideError {
                        action,
                        value: s.clone(),
                        source,
                    }),
                },
            }
        }
        (entries, errors)
    }

    /// Resolve and apply to a registry, returning the parse errors.
    pub fn apply(&self, registry: &mut KeymapRegistry<A>) -> Vec<OverrideError<A>> {
        let (entries, errors) = self.resolve(registry);
        registry.set_overrides(entries);
        errors
    }

    /// Snapshot a registry's current overrides into a document the host
    /// can persist.
    pub fn from_registry(registry: &KeymapRegistry<A>) -> Self {
        let mut doc = Self::default();
        for (action, binding) in registry.override_entries() {
            doc.set(action, binding.map(|b| b.shortcut.to_string()));
        }
        doc
    }
}
