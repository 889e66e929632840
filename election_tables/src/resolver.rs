use log::{debug, warn};

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// How a key was resolved.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Resolution {
    /// The entity was in the snapshot or was created earlier through this resolver.
    Existing,
    /// The entity was missing and has just been created.
    Created,
}

/// A natural-key cache in two phases: a preloaded snapshot of the store,
/// then resolve-or-create against that snapshot with write-through on miss.
///
/// The snapshot is not synchronized with the store. Two resolvers preloaded
/// from the same state will both miss on the same new key and both call
/// their creation function: loads for the same election must be serialized
/// by the caller.
#[derive(Debug, Clone)]
pub struct EntityResolver<K, E> {
    entries: HashMap<K, E>,
    created: usize,
    collisions: usize,
}

impl<K, E> Default for EntityResolver<K, E> {
    fn default() -> Self {
        EntityResolver {
            entries: HashMap::new(),
            created: 0,
            collisions: 0,
        }
    }
}

impl<K: Eq + Hash + Clone + Debug, E: Clone> EntityResolver<K, E> {
    pub fn new() -> EntityResolver<K, E> {
        EntityResolver::default()
    }

    /// Builds the snapshot. When two entries share a key, the first one is kept.
    pub fn preload<I: IntoIterator<Item = (K, E)>>(snapshot: I) -> EntityResolver<K, E> {
        let mut res = EntityResolver::new();
        for (key, entity) in snapshot {
            if res.entries.contains_key(&key) {
                warn!("preload: duplicate natural key {:?}, keeping the first entry", key);
                res.collisions += 1;
                continue;
            }
            res.entries.insert(key, entity);
        }
        debug!("preload: {} entries", res.entries.len());
        res
    }

    pub fn get(&self, key: &K) -> Option<&E> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the cached entity for `key`, or calls `create` and caches its result.
    ///
    /// Nothing is cached when `create` fails.
    pub fn resolve_or_create<F, Err>(&mut self, key: K, create: F) -> Result<(E, Resolution), Err>
    where
        F: FnOnce(&K) -> Result<E, Err>,
    {
        if let Some(entity) = self.entries.get(&key) {
            return Ok((entity.clone(), Resolution::Existing));
        }
        let entity = create(&key)?;
        self.entries.insert(key, entity.clone());
        self.created += 1;
        Ok((entity, Resolution::Created))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entities created through this resolver.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Number of snapshot entries dropped because their key was already present.
    pub fn collisions(&self) -> usize {
        self.collisions
    }
}
