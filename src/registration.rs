//! Service registration types.

use std::any::Any;
use std::sync::Arc;

use crate::error::DiResult;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;
use crate::traits::BoxError;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Ctor = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

pub(crate) type DisposeHook = Arc<dyn Fn(&AnyArc) -> Result<(), BoxError> + Send + Sync>;

#[cfg(feature = "ahash")]
pub(crate) type KeyMap<V> = ahash::AHashMap<Key, V>;
#[cfg(not(feature = "ahash"))]
pub(crate) type KeyMap<V> = std::collections::HashMap<Key, V>;

/// Service registration with lifetime and constructor
pub(crate) struct Registration {
    pub(crate) key: Key,
    pub(crate) lifetime: Lifetime,
    pub(crate) ctor: Ctor,
    pub(crate) dispose: Option<DisposeHook>,
    /// Dependencies declared for build-time validation
    pub(crate) dependencies: Vec<Key>,
    /// Position in registration order
    pub(crate) ordinal: usize,
    /// Index into the singleton slots or the per-scope slots, by lifetime
    pub(crate) slot: usize,
}

impl Registration {
    pub(crate) fn new(key: Key, ctor: Ctor, ordinal: usize) -> Self {
        Self {
            key,
            lifetime: Lifetime::Transient,
            ctor,
            dispose: None,
            dependencies: Vec::new(),
            ordinal,
            slot: 0,
        }
    }
}

/// Frozen registrations: one winner per key, slots assigned.
pub(crate) struct RegistrationTable {
    registrations: Vec<Registration>,
    index: KeyMap<usize>,
    pub(crate) singleton_count: usize,
    pub(crate) scoped_count: usize,
}

impl RegistrationTable {
    /// Keeps the most recent registration for each key and assigns slot
    /// indices to cached lifetimes.
    pub(crate) fn freeze(all: Vec<Registration>) -> Self {
        let mut registrations: Vec<Registration> = Vec::with_capacity(all.len());
        let mut index = KeyMap::default();

        for reg in all {
            match index.get(&reg.key) {
                Some(&pos) => registrations[pos] = reg,
                None => {
                    index.insert(reg.key, registrations.len());
                    registrations.push(reg);
                }
            }
        }

        let mut singleton_count = 0;
        let mut scoped_count = 0;
        for reg in &mut registrations {
            match reg.lifetime {
                Lifetime::Singleton => {
                    reg.slot = singleton_count;
                    singleton_count += 1;
                }
                Lifetime::PerScope | Lifetime::PerMatchingScope(_) => {
                    reg.slot = scoped_count;
                    scoped_count += 1;
                }
                Lifetime::Transient => {}
            }
        }

        Self {
            registrations,
            index,
            singleton_count,
            scoped_count,
        }
    }

    #[inline(always)]
    pub(crate) fn get(&self, key: &Key) -> Option<&Registration> {
        self.index.get(key).map(|&pos| &self.registrations[pos])
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.registrations.len()
    }
}
