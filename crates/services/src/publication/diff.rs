use std::collections::HashMap;

use serde::Serialize;

/// Documents that can be tracked across publication snapshots.
pub trait Keyed {
    fn key(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CollectionDiff<T> {
    pub added: Vec<T>,
    pub changed: Vec<T>,
    pub removed: Vec<String>,
}

impl<T> CollectionDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Compares two snapshots of one collection. `added` and `changed` keep the
/// order of `next`; `removed` keeps the order of `previous`.
pub fn diff<T>(previous: &[T], next: &[T]) -> CollectionDiff<T>
where
    T: Keyed + PartialEq + Clone,
{
    let before: HashMap<&str, &T> = previous.iter().map(|d| (d.key(), d)).collect();
    let after: HashMap<&str, &T> = next.iter().map(|d| (d.key(), d)).collect();

    let mut added = Vec::new();
    let mut changed = Vec::new();
    for doc in next {
        match before.get(doc.key()) {
            None => added.push(doc.clone()),
            Some(old) if *old != doc => changed.push(doc.clone()),
            Some(_) => {}
        }
    }

    let removed = previous
        .iter()
        .filter(|d| !after.contains_key(d.key()))
        .map(|d| d.key().to_string())
        .collect();

    CollectionDiff {
        added,
        changed,
        removed,
    }
}
