use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::error::HeaderError;

/// A flat, independent header mapping.
pub type HeaderMap = BTreeMap<String, String>;

/// A header layer that narrower scopes may stack on.
///
/// Children only ever borrow their parent immutably; mutation goes through
/// whoever owns the scope (the parser, in practice).
pub type SharedHeaders = Rc<RefCell<ScopedHeaders>>;

/// A key/value layer with parent fallback, local overrides, and local
/// deletions.
///
/// Lookup order: a locally deleted key is absent; otherwise a local override
/// wins; otherwise the parent is consulted.
#[derive(Debug, Default)]
pub struct ScopedHeaders {
    parent: Option<SharedHeaders>,
    values: HeaderMap,
    deleted: BTreeSet<String>,
}

impl ScopedHeaders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stacked(parent: SharedHeaders) -> Self {
        Self {
            parent: Some(parent),
            values: HeaderMap::new(),
            deleted: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn into_shared(self) -> SharedHeaders {
        Rc::new(RefCell::new(self))
    }

    /// Looks up the visible value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::NotFound`] when the key was deleted in this
    /// layer, or when neither this layer nor any parent defines it.
    pub fn get(&self, key: &str) -> Result<String, HeaderError> {
        if self.deleted.contains(key) {
            return Err(not_found(key));
        }
        if let Some(value) = self.values.get(key) {
            return Ok(value.clone());
        }
        match self.parent.as_ref() {
            Some(parent) => parent.borrow().get(key),
            None => Err(not_found(key)),
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    /// Sets a local override, clearing any local deletion of the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.deleted.remove(&key);
        self.values.insert(key, value.into());
    }

    /// Hides `key` in this layer, even if a parent still defines it.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::NotFound`] when the key is already deleted
    /// here, or when there is no local override and no parent defines it.
    pub fn delete(&mut self, key: &str) -> Result<(), HeaderError> {
        if self.deleted.contains(key) {
            return Err(not_found(key));
        }
        if self.values.remove(key).is_none() && !self.parent_contains(key) {
            return Err(not_found(key));
        }
        self.deleted.insert(key.to_owned());
        Ok(())
    }

    /// Visible keys: local overrides first, then inherited keys that are
    /// neither shadowed nor deleted. Each key appears exactly once.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.keys().cloned().collect();
        if let Some(parent) = self.parent.as_ref() {
            let inherited = parent.borrow().keys();
            keys.extend(inherited.into_iter().filter(|key| {
                !self.values.contains_key(key) && !self.deleted.contains(key)
            }));
        }
        keys
    }

    /// Visible key/value pairs in [`keys`](Self::keys) order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.keys()
            .into_iter()
            .filter_map(|key| self.get(&key).ok().map(|value| (key, value)))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the local override and deletion marker for `key`, making the
    /// inherited value visible again.
    pub fn reset(&mut self, key: &str) {
        self.deleted.remove(key);
        self.values.remove(key);
    }

    /// Drops every local override and deletion marker.
    pub fn reset_all(&mut self) {
        self.deleted.clear();
        self.values.clear();
    }

    /// Snapshots the visible headers into an independent mapping. Later
    /// changes to this layer or its parents do not affect the snapshot.
    #[must_use]
    pub fn flatten(&self) -> HeaderMap {
        let mut flat = match self.parent.as_ref() {
            Some(parent) => parent.borrow().flatten(),
            None => HeaderMap::new(),
        };
        flat.retain(|key, _| !self.deleted.contains(key));
        flat.extend(
            self.values
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        flat
    }

    fn parent_contains(&self, key: &str) -> bool {
        self.parent
            .as_ref()
            .is_some_and(|parent| parent.borrow().contains(key))
    }
}

fn not_found(key: &str) -> HeaderError {
    HeaderError::NotFound {
        key: key.to_owned(),
    }
}
