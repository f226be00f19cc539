//! An insertion-ordered collection of uniquely named items.

use std::collections::HashMap;

/// Anything stored in a [`NamedList`] exposes the key it is stored under.
pub trait Named {
    fn name(&self) -> &str;
}

/// Ordered list with unique keys and O(1) lookup by name.
///
/// Iteration follows insertion order. Removing an item keeps the relative
/// order of the rest.
#[derive(Debug, Clone)]
pub struct NamedList<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for NamedList<T> {
    fn default() -> Self {
        NamedList {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Named> NamedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&i| &self.items[i])
    }

    pub fn get_index(&self, position: usize) -> Option<&T> {
        self.items.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Appends `item` unless its name is already present.
    /// Returns `false` (and drops `item`) when the name was taken.
    pub fn insert(&mut self, item: T) -> bool {
        if self.index.contains_key(item.name()) {
            return false;
        }
        self.index.insert(item.name().to_string(), self.items.len());
        self.items.push(item);
        true
    }

    /// Inserts `item`, replacing an existing item of the same name in place.
    pub fn upsert(&mut self, item: T) {
        match self.index.get(item.name()) {
            Some(&i) => self.items[i] = item,
            None => {
                self.insert(item);
            }
        }
    }

    /// Replaces the item called `name` with `item`, keeping its position.
    ///
    /// Does nothing and returns `false` if `name` is absent or if `item`'s
    /// name already belongs to a different item.
    pub fn replace(&mut self, name: &str, item: T) -> bool {
        let Some(&i) = self.index.get(name) else {
            return false;
        };
        if item.name() != name && self.index.contains_key(item.name()) {
            return false;
        }
        self.index.remove(name);
        self.index.insert(item.name().to_string(), i);
        self.items[i] = item;
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<T> {
        let i = self.index.remove(name)?;
        let removed = self.items.remove(i);
        for position in self.index.values_mut() {
            if *position > i {
                *position -= 1;
            }
        }
        Some(removed)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(Named::name)
    }
}

impl<T: Named> FromIterator<T> for NamedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = NamedList::new();
        for item in iter {
            list.insert(item);
        }
        list
    }
}

impl<T: Named> Extend<T> for NamedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<'a, T> IntoIterator for &'a NamedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
