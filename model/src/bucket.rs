use std::collections::btree_map::{BTreeMap, Entry};

use serde::Serialize;

/// Owns a set of items keyed by id.
///
/// Ids are handed out in increasing order and never reused so iteration (which is always in
/// ascending id order) gives a stable processing order for the lifetime of the bucket.
#[derive(Clone, Debug, Serialize)]
pub struct Bucket<T> {
    inner: BTreeMap<usize, T>,
    next_id: usize,
}

impl<T> Default for Bucket<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Bucket<T> {
    pub fn new() -> Self {
        Bucket {
            inner: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn add(&mut self, item: T) -> usize {
        let id = self.next_id;
        self.next_id += 1;

        match self.inner.entry(id) {
            Entry::Vacant(entry) => {
                entry.insert(item);
            }
            Entry::Occupied(_) => unreachable!("id {} was handed out twice", id),
        }

        id
    }

    /// Removing an id that isn't in the bucket is a no-op.
    pub fn remove(&mut self, id: usize) -> Option<T> {
        self.inner.remove(&id)
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        self.inner.get(&id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut T> {
        self.inner.get_mut(&id)
    }

    pub fn contains(&self, id: usize) -> bool {
        self.inner.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&usize, &T)> {
        self.inner.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&usize, &mut T)> {
        self.inner.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &usize> {
        self.inner.keys()
    }

    /// Removes every item the predicate returns true for, returning them in id order.
    pub fn drain_where<F: FnMut(&T) -> bool>(&mut self, mut predicate: F) -> Vec<(usize, T)> {
        let ids: Vec<usize> = self
            .inner
            .iter()
            .filter(|(_, item)| predicate(item))
            .map(|(id, _)| *id)
            .collect();

        ids.into_iter()
            .filter_map(|id| self.inner.remove(&id).map(|item| (id, item)))
            .collect()
    }

    /// All ids are less than this value
    pub fn max_id(&self) -> usize {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
