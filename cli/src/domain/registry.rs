//! Append-only, insertion-ordered registry shared by agents and tasks.
//!
//! Pure data structure: no I/O, no async.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::domain::error::RegistryError;

/// Ordered map that rejects duplicate keys.
///
/// Iteration yields values in insertion order; lookup is a hash probe.
#[derive(Debug, Clone)]
pub struct Registry<K, V> {
    kind: &'static str,
    order: Vec<K>,
    entries: HashMap<K, V>,
}

impl<K, V> Registry<K, V>
where
    K: Eq + Hash + Clone + ToString,
{
    /// Creates an empty registry. `kind` names the entries in diagnostics
    /// (`"agent"`, `"task"`).
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    /// Inserts `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateEntry`] if `key` is already present;
    /// the existing entry is left untouched.
    pub fn add(&mut self, key: K, value: V) -> Result<(), RegistryError> {
        if self.entries.contains_key(&key) {
            return Err(RegistryError::DuplicateEntry {
                kind: self.kind,
                name: key.to_string(),
            });
        }
        self.order.push(key.clone());
        self.entries.insert(key, value);
        Ok(())
    }

    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    /// Like [`Registry::get`] but fails with [`RegistryError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not registered.
    pub fn require<Q>(&self, key: &Q) -> Result<&V, RegistryError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToString + ?Sized,
    {
        self.entries.get(key).ok_or_else(|| RegistryError::NotFound {
            kind: self.kind,
            name: key.to_string(),
        })
    }

    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Keys in insertion order.
    #[must_use]
    pub fn names(&self) -> &[K] {
        &self.order
    }

    /// Values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.order.iter().filter_map(|k| self.entries.get(k))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Removes and returns the entry under `key`, keeping the order of the rest.
    ///
    /// Not part of the append-only contract: only call this during setup,
    /// never while a dispatch is in flight.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let value = self.entries.remove(key)?;
        self.order.retain(|k| <K as Borrow<Q>>::borrow(k) != key);
        Some(value)
    }
}
