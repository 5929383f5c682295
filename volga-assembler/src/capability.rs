//! Explicit capability model: which registered types satisfy which abstractions

use crate::{
    error::Error,
    types::{Instance, KeyMap, TypeKey}
};
use std::sync::Arc;

/// Converts an instance of a concrete type into an instance of a capability it satisfies
pub(crate) type CastFn = Arc<
    dyn Fn(&Instance) -> Result<Instance, Error>
    + Send
    + Sync
>;

/// Capability declarations of an assembler
#[derive(Default)]
pub(crate) struct Capabilities {
    /// concrete -> capability -> cast
    casts: KeyMap<KeyMap<CastFn>>,
    /// capability -> concretes, in declaration order
    implementors: KeyMap<Vec<TypeKey>>,
}

impl Capabilities {
    /// Declares that `C` satisfies `I`
    pub(crate) fn declare<C, I, F>(&mut self, cast: F)
    where
        C: Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<I> + Send + Sync + 'static
    {
        let concrete = TypeKey::of::<C>();
        let capability = TypeKey::of::<I>();
        let cast: CastFn = Arc::new(move |instance: &Instance| {
            instance
                .try_downcast::<C>()
                .map(|instance| Instance::new(cast(instance)))
        });

        let replaced = self.casts
            .entry(concrete)
            .or_default()
            .insert(capability, cast);
        if replaced.is_none() {
            self.implementors
                .entry(capability)
                .or_default()
                .push(concrete);
        }
    }

    /// Checks whether `concrete` can be used where `required` is expected
    #[inline]
    pub(crate) fn satisfies(&self, concrete: TypeKey, required: TypeKey) -> bool {
        concrete == required || self.cast_fn(concrete, required).is_some()
    }

    /// Returns the types declared to satisfy `capability`, in declaration order
    #[inline]
    pub(crate) fn implementors(&self, capability: TypeKey) -> &[TypeKey] {
        self.implementors
            .get(&capability)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Converts `instance` into an instance of `required`
    pub(crate) fn cast(&self, instance: &Instance, required: TypeKey) -> Result<Instance, Error> {
        let concrete = instance.type_key();
        if concrete == required {
            return Ok(instance.clone());
        }
        self.cast_fn(concrete, required)
            .ok_or(Error::ResolveFailed(required.name()))
            .and_then(|cast| cast(instance))
    }

    #[inline]
    pub(crate) fn cast_fn(&self, concrete: TypeKey, capability: TypeKey) -> Option<&CastFn> {
        self.casts
            .get(&concrete)
            .and_then(|casts| casts.get(&capability))
    }
}
