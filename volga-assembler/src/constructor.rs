//! Typed constructors and their formal parameter lists

use crate::{
    error::Error,
    types::{Instance, TypeKey}
};
use std::{
    fmt::{Debug, Formatter},
    marker::PhantomData,
    sync::Arc
};

pub use self::{
    factory::GenericFactory,
    from_arguments::{FromArgument, FromArguments}
};

pub mod factory;
pub mod from_arguments;

/// A type-erased call into a constructor
pub(crate) type InvokeFn = Arc<
    dyn Fn(&[Instance]) -> Result<Instance, Error>
    + Send
    + Sync
>;

/// A formal parameter of a constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    name: Option<&'static str>,
    ty: TypeKey,
}

impl Param {
    /// Returns the parameter name, if the constructor declared one
    #[inline]
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// Returns the formal type of the parameter
    #[inline]
    pub fn ty(&self) -> TypeKey {
        self.ty
    }
}

/// A constructor of `T` described by its formal parameter list
///
/// Wraps a factory function whose parameters are `Arc<U>` values,
/// each of them making `U` the formal type of that position.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use volga_assembler::Constructor;
///
/// struct Widget;
///
/// struct Gadget {
///     name: Arc<String>,
///     widget: Arc<Widget>,
/// }
///
/// let ctor = Constructor::new(|name: Arc<String>, widget: Arc<Widget>| Ok(Gadget { name, widget }))
///     .with_names(["name", "widget"]);
///
/// assert_eq!(ctor.arity(), 2);
/// assert_eq!(ctor.params()[1].name(), Some("widget"));
/// ```
pub struct Constructor<T> {
    params: Vec<Param>,
    invoke: InvokeFn,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Constructor<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            params: self.params.clone(),
            invoke: self.invoke.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Debug for Constructor<T> {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Constructor")
            .field("target", &std::any::type_name::<T>())
            .field("params", &self.params)
            .finish()
    }
}

impl<T: Send + Sync + 'static> Constructor<T> {
    /// Creates a constructor from a factory function
    pub fn new<F, Args>(factory: F) -> Self
    where
        F: GenericFactory<Args, Output = T>,
        Args: FromArguments + 'static
    {
        let params = Args::param_types()
            .into_iter()
            .map(|ty| Param { name: None, ty })
            .collect();
        let invoke = Arc::new(move |arguments: &[Instance]| -> Result<Instance, Error> {
            let args = Args::from_arguments(arguments)?;
            factory.call(args)
                .map(|instance| Instance::new(Arc::new(instance)))
                .map_err(|cause| Error::construction_failed(std::any::type_name::<T>(), cause))
        });
        Self { params, invoke, _marker: PhantomData }
    }
}

impl<T> Constructor<T> {
    /// Names the formal parameters, in order
    ///
    /// Names are used to tell apart constructors that share a shape.
    /// Positions without a name stay unnamed.
    pub fn with_names<const N: usize>(mut self, names: [&'static str; N]) -> Self {
        debug_assert!(N <= self.params.len(), "more names than constructor parameters");
        for (param, name) in self.params.iter_mut().zip(names) {
            param.name = Some(name);
        }
        self
    }

    /// Returns the formal parameters
    #[inline]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Returns the number of formal parameters
    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub(crate) fn into_parts(self) -> (Vec<Param>, InvokeFn) {
        (self.params, self.invoke)
    }
}

/// A type that lists the constructors available to the assembler
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use volga_assembler::{Constructible, Constructor};
///
/// struct Widget {
///     name: Arc<String>,
/// }
///
/// impl Constructible for Widget {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![
///             Constructor::new(|| Ok(Widget { name: Arc::new("default".into()) })),
///             Constructor::new(|name: Arc<String>| Ok(Widget { name })).with_names(["name"]),
///         ]
///     }
/// }
/// ```
pub trait Constructible: Sized + Send + Sync + 'static {
    /// Returns every constructor of `Self`
    fn constructors() -> Vec<Constructor<Self>>;
}
