//! Storage for the DI container
//!
//! [`Registry`] holds registrations and is frozen once a container is built.
//! [`SingletonStore`] holds singleton instances for the container's lifetime
//! and uses `DashMap` so concurrent resolves never block each other on
//! unrelated keys.

use crate::{Instance, Registration, TypeKey};
use ahash::RandomState;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Registrations keyed by type, remembering registration order
#[derive(Clone, Default)]
pub(crate) struct Registry {
    entries: HashMap<TypeKey, Registration, RandomState>,
    order: Vec<TypeKey>,
}

impl Registry {
    /// Insert or replace a registration
    pub fn insert(&mut self, registration: Registration) {
        let key = registration.key().clone();
        if self.entries.insert(key.clone(), registration).is_none() {
            self.order.push(key);
        }
    }

    #[inline]
    pub fn get(&self, key: &TypeKey) -> Option<&Registration> {
        self.entries.get(key)
    }

    #[inline]
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &TypeKey> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("count", &self.len())
            .finish()
    }
}

/// Build-once slot for one singleton
type Slot = Arc<OnceCell<Instance>>;

/// Singleton instances, written at most once per key
pub(crate) struct SingletonStore {
    slots: DashMap<TypeKey, Slot, RandomState>,
}

impl SingletonStore {
    /// Create an empty store.
    ///
    /// Uses 8 shards; registries are small and a store is created per
    /// container, including every override.
    pub fn new() -> Self {
        Self {
            slots: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
        }
    }

    /// Instance already built for `key`
    #[inline]
    pub fn get(&self, key: &TypeKey) -> Option<Instance> {
        self.slots.get(key).and_then(|slot| slot.value().get().cloned())
    }

    /// Slot for `key`, created empty if missing.
    ///
    /// The map guard is released before returning, so the caller may
    /// recurse into other keys while initializing the slot.
    pub fn slot(&self, key: &TypeKey) -> Slot {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(key.clone()).or_default().value())
    }

    /// Number of singletons built so far
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.value().get().is_some()).count()
    }
}

impl Default for SingletonStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SingletonStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonStore")
            .field("built", &self.len())
            .finish()
    }
}
