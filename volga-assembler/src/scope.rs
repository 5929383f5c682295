//! Scope stores: caches that decide whether an instance is reused or recreated

use crate::{
    error::Error,
    types::{Instance, KeyMap, TypeKey}
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::{Arc, OnceLock},
    thread::{self, ThreadId}
};

/// A cache slot of a single singleton type
struct SingletonSlot {
    instance: OnceLock<Instance>,
    /// Serializes construction of this type only
    init: Mutex<()>,
    /// `false` for types on a dependency cycle, whose construction never succeeds
    serialized: bool,
}

/// Process-wide instances shared by every execution context
///
/// Slots are created up front for every singleton rule, so the map itself is never
/// locked, and construction of unrelated types never waits on each other.
pub(crate) struct SingletonStore {
    slots: KeyMap<SingletonSlot>,
}

impl Debug for SingletonStore {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonStore")
            .field("slots", &self.slots.len())
            .finish()
    }
}

impl SingletonStore {
    /// Creates a slot for each of `types`; slots of `cyclic` types skip construction locking
    pub(crate) fn new(
        types: impl IntoIterator<Item = TypeKey>,
        is_cyclic: impl Fn(&TypeKey) -> bool
    ) -> Self {
        let slots = types
            .into_iter()
            .map(|ty| (ty, SingletonSlot {
                instance: OnceLock::new(),
                init: Mutex::new(()),
                serialized: !is_cyclic(&ty),
            }))
            .collect();
        Self { slots }
    }

    /// Returns the cached instance of `ty` or constructs and caches it
    ///
    /// At most one caller constructs a given type, the others wait for it and get
    /// the same instance. A failed construction caches nothing.
    pub(crate) fn get_or_try_init<F>(&self, ty: TypeKey, construct: F) -> Result<Instance, Error>
    where
        F: FnOnce() -> Result<Instance, Error>
    {
        let Some(slot) = self.slots.get(&ty) else {
            return construct();
        };
        if let Some(instance) = slot.instance.get() {
            return Ok(instance.clone());
        }

        let _guard = slot.serialized.then(|| slot.init.lock());
        if let Some(instance) = slot.instance.get() {
            return Ok(instance.clone());
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(type_name = ty.name(), "constructing singleton");

        let instance = construct()?;
        Ok(slot.instance.get_or_init(|| instance).clone())
    }
}

/// Instances of one execution context
type Instances = KeyMap<Instance>;

/// Instances private to one execution context
#[derive(Clone)]
pub(crate) enum LocalStore {
    /// Every OS thread is its own context, maps are owned by the assembler
    Thread(Arc<Mutex<HashMap<ThreadId, Instances>>>),
    /// An explicit context that may travel between threads with its owner
    Context(Arc<Mutex<Instances>>),
}

impl Debug for LocalStore {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LocalStore::Thread(threads) => f
                .debug_struct("LocalStore::Thread")
                .field("threads", &threads.lock().len())
                .finish(),
            LocalStore::Context(_) => f.write_str("LocalStore::Context(..)"),
        }
    }
}

impl LocalStore {
    /// Creates an empty per-thread store
    #[inline]
    pub(crate) fn thread() -> Self {
        Self::Thread(Arc::new(Mutex::new(HashMap::new())))
    }

    /// Creates an empty explicit context
    #[inline]
    pub(crate) fn context() -> Self {
        Self::Context(Arc::new(Mutex::new(KeyMap::default())))
    }

    /// Returns the instance of `ty` cached in this context or constructs and caches it
    ///
    /// No lock is held while constructing. If the context is shared and raced,
    /// the first stored instance wins and is returned to both callers.
    pub(crate) fn get_or_try_init<F>(&self, ty: TypeKey, construct: F) -> Result<Instance, Error>
    where
        F: FnOnce() -> Result<Instance, Error>
    {
        if let Some(instance) = self.get(ty) {
            return Ok(instance);
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(type_name = ty.name(), "constructing thread-local instance");

        let instance = construct()?;
        Ok(self.insert(ty, instance))
    }

    fn get(&self, ty: TypeKey) -> Option<Instance> {
        match self {
            LocalStore::Thread(threads) => threads
                .lock()
                .get(&thread::current().id())
                .and_then(|instances| instances.get(&ty))
                .cloned(),
            LocalStore::Context(instances) => instances
                .lock()
                .get(&ty)
                .cloned(),
        }
    }

    fn insert(&self, ty: TypeKey, instance: Instance) -> Instance {
        match self {
            LocalStore::Thread(threads) => threads
                .lock()
                .entry(thread::current().id())
                .or_default()
                .entry(ty)
                .or_insert(instance)
                .clone(),
            LocalStore::Context(instances) => instances
                .lock()
                .entry(ty)
                .or_insert(instance)
                .clone(),
        }
    }
}
