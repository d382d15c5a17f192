//! # State Map
//!
//! Collection of attached package states addressable both by package name and
//! by identity token. Exactly one entry exists per package name, and each
//! token maps to at most one name.
//!
//! Not internally synchronized: the service holds its lock around every use.

use super::value_objects::DomainSetId;
use std::collections::{BTreeMap, HashMap};

/// Dual-indexed map of package name / identity token → value.
#[derive(Debug)]
pub struct StateMap<T> {
    by_name: BTreeMap<String, (DomainSetId, T)>,
    name_by_id: HashMap<DomainSetId, String>,
}

impl<T> StateMap<T> {
    pub fn new() -> Self {
        Self {
            by_name: BTreeMap::new(),
            name_by_id: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn get(&self, package_name: &str) -> Option<&T> {
        self.by_name.get(package_name).map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, package_name: &str) -> Option<&mut T> {
        self.by_name.get_mut(package_name).map(|(_, value)| value)
    }

    pub fn get_by_id(&self, id: &DomainSetId) -> Option<&T> {
        let name = self.name_by_id.get(id)?;
        self.get(name)
    }

    pub fn get_by_id_mut(&mut self, id: &DomainSetId) -> Option<&mut T> {
        let name = self.name_by_id.get(id)?;
        self.by_name.get_mut(name).map(|(_, value)| value)
    }

    pub fn contains_id(&self, id: &DomainSetId) -> bool {
        self.name_by_id.contains_key(id)
    }

    /// Inserts `value` under both keys.
    ///
    /// Any previous token bound to `package_name`, and any previous package
    /// bound to `id`, is unbound first. Returns the value replaced under
    /// `package_name`, if any.
    pub fn put(&mut self, package_name: impl Into<String>, id: DomainSetId, value: T) -> Option<T> {
        let package_name = package_name.into();

        if let Some(other_name) = self.name_by_id.get(&id) {
            if *other_name != package_name {
                let other_name = other_name.clone();
                self.by_name.remove(&other_name);
            }
        }

        let previous = self.by_name.insert(package_name.clone(), (id, value));
        if let Some((old_id, _)) = &previous {
            if *old_id != id {
                self.name_by_id.remove(old_id);
            }
        }
        self.name_by_id.insert(id, package_name);

        previous.map(|(_, value)| value)
    }

    pub fn remove(&mut self, package_name: &str) -> Option<T> {
        let (id, value) = self.by_name.remove(package_name)?;
        self.name_by_id.remove(&id);
        Some(value)
    }

    pub fn remove_by_id(&mut self, id: &DomainSetId) -> Option<T> {
        let name = self.name_by_id.remove(id)?;
        self.by_name.remove(&name).map(|(_, value)| value)
    }

    /// Value at `index` in package-name order.
    pub fn value_at(&self, index: usize) -> Option<&T> {
        self.by_name.values().nth(index).map(|(_, value)| value)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.by_name.values().map(|(_, value)| value)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.by_name.values_mut().map(|(_, value)| value)
    }

    /// `(package name, token, value)` in package-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, DomainSetId, &T)> {
        self.by_name
            .iter()
            .map(|(name, (id, value))| (name.as_str(), *id, value))
    }
}

impl<T> Default for StateMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
