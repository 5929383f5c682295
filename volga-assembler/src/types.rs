//! Type descriptors and type-erased instances

use crate::error::Error;
use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    fmt::{Debug, Display, Formatter},
    hash::{BuildHasherDefault, Hash, Hasher},
    sync::Arc
};

/// An opaque, comparable handle that identifies a type
///
/// Two keys are equal when they describe the same type,
/// the type name is kept for diagnostics only.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Creates a key for the type `T`, which may be unsized, e.g. `dyn Trait`
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Returns the underlying [`TypeId`]
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the type name
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for TypeKey {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

impl Display for TypeKey {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// A shared, type-erased instance tagged with the type it was produced for
///
/// Internally holds an `Arc<T>`, so unsized types such as `dyn Trait`
/// can be stored and shared the same way as concrete ones.
#[derive(Clone)]
pub struct Instance {
    ty: TypeKey,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Debug for Instance {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Instance({})", self.ty)
    }
}

impl Instance {
    /// Wraps a shared pointer to `T`
    #[inline]
    pub fn new<T: ?Sized + Send + Sync + 'static>(instance: Arc<T>) -> Self {
        Self {
            ty: TypeKey::of::<T>(),
            inner: Arc::new(instance),
        }
    }

    /// Returns the type this instance was produced for
    #[inline]
    pub fn type_key(&self) -> TypeKey {
        self.ty
    }

    /// Returns the shared pointer if the instance holds a `T`
    #[inline]
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.inner
            .downcast_ref::<Arc<T>>()
            .cloned()
    }

    /// Same as [`Instance::downcast`] but fails with [`Error::ResolveFailed`]
    #[inline]
    pub(crate) fn try_downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, Error> {
        self.downcast::<T>()
            .ok_or(Error::ResolveFailed(type_name::<T>()))
    }
}

/// A HashMap keyed by [`TypeKey`]
pub(crate) type KeyMap<V> = HashMap<
    TypeKey,
    V,
    BuildHasherDefault<TypeIdHasher>
>;

#[derive(Default)]
pub(crate) struct TypeIdHasher(u64);

impl Hasher for TypeIdHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    #[cold]
    fn write(&mut self, bytes: &[u8]) {
        // TypeId normally calls write_u64, fall back to FNV-1a otherwise
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(0x100000001b3);
        }
    }

    #[inline]
    fn write_u64(&mut self, id: u64) {
        self.0 = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[test]
    fn it_compares_keys_by_type() {
        assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
        assert_ne!(TypeKey::of::<String>(), TypeKey::of::<&'static str>());
        assert_ne!(TypeKey::of::<English>(), TypeKey::of::<dyn Greeter>());
    }

    #[test]
    fn it_uses_keys_in_key_map() {
        let mut map = KeyMap::default();
        map.insert(TypeKey::of::<u32>(), 1);
        map.insert(TypeKey::of::<u64>(), 2);
        map.insert(TypeKey::of::<dyn Greeter>(), 3);

        assert_eq!(map[&TypeKey::of::<u32>()], 1);
        assert_eq!(map[&TypeKey::of::<u64>()], 2);
        assert_eq!(map[&TypeKey::of::<dyn Greeter>()], 3);
    }

    #[test]
    fn it_downcasts_sized_instance() {
        let instance = Instance::new(Arc::new(String::from("value")));

        assert_eq!(instance.type_key(), TypeKey::of::<String>());
        assert_eq!(*instance.downcast::<String>().unwrap(), "value");
        assert!(instance.downcast::<u32>().is_none());
    }

    #[test]
    fn it_downcasts_trait_object_instance() {
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        let instance = Instance::new(greeter.clone());

        let resolved = instance.downcast::<dyn Greeter>().unwrap();

        assert_eq!(resolved.greet(), "hello");
        assert!(Arc::ptr_eq(&resolved, &greeter));
        assert!(instance.downcast::<English>().is_none());
    }

    #[test]
    fn it_fails_to_downcast_with_resolve_error() {
        let instance = Instance::new(Arc::new(1u8));

        let err = instance.try_downcast::<String>().unwrap_err();

        assert!(matches!(err, Error::ResolveFailed("alloc::string::String")));
    }
}
