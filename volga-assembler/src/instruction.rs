//! Assembly instructions: scopes and parameter sources of a rule

use crate::types::{Instance, TypeKey};
use std::{
    fmt::{Debug, Display, Formatter},
    sync::Arc
};

/// Lifecycle policy of assembled instances
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// A new instance is constructed on every request
    Prototype,

    /// A single instance is shared by every caller of an assembler
    #[default]
    Singleton,

    /// A single instance is shared within one execution context
    ThreadLocal,
}

impl Display for Scope {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Prototype => f.write_str("prototype"),
            Scope::Singleton => f.write_str("singleton"),
            Scope::ThreadLocal => f.write_str("thread-local"),
        }
    }
}

/// Describes where the argument of a constructor parameter comes from
#[derive(Clone)]
pub enum ParamSpec {
    /// A literal, already constructed value
    Value {
        /// Name of the parameter to match
        name: Option<&'static str>,
        /// The literal, tagged with its concrete type
        value: Instance,
    },

    /// A dependency of an explicitly declared type
    Reference {
        /// Name of the parameter to match
        name: Option<&'static str>,
        /// The type to assemble
        ty: TypeKey,
    },

    /// A dependency whose type is the formal type of the matching parameter
    Auto {
        /// Name of the parameter to match
        name: Option<&'static str>,
    },
}

impl Debug for ParamSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamSpec::Value { name, value } => f.debug_struct("Value")
                .field("name", name)
                .field("type", &value.type_key())
                .finish(),
            ParamSpec::Reference { name, ty } => f.debug_struct("Reference")
                .field("name", name)
                .field("type", ty)
                .finish(),
            ParamSpec::Auto { name } => f.debug_struct("Auto")
                .field("name", name)
                .finish(),
        }
    }
}

impl ParamSpec {
    /// Creates a [`ParamSpec::Value`] spec
    #[inline]
    pub fn value<V: Send + Sync + 'static>(name: impl Into<Option<&'static str>>, value: V) -> Self {
        Self::shared_value(name, Arc::new(value))
    }

    /// Creates a [`ParamSpec::Value`] spec from a shared pointer,
    /// which also allows unsized literals such as `Arc<dyn Trait>`
    #[inline]
    pub fn shared_value<V>(name: impl Into<Option<&'static str>>, value: Arc<V>) -> Self
    where
        V: ?Sized + Send + Sync + 'static
    {
        Self::Value { name: name.into(), value: Instance::new(value) }
    }

    /// Creates a [`ParamSpec::Reference`] spec
    #[inline]
    pub fn reference<R: ?Sized + 'static>(name: impl Into<Option<&'static str>>) -> Self {
        Self::Reference { name: name.into(), ty: TypeKey::of::<R>() }
    }

    /// Creates a [`ParamSpec::Auto`] spec
    #[inline]
    pub fn auto(name: impl Into<Option<&'static str>>) -> Self {
        Self::Auto { name: name.into() }
    }

    /// Returns the parameter name this spec is bound to, if any
    #[inline]
    pub fn name(&self) -> Option<&'static str> {
        match self {
            ParamSpec::Value { name, .. }
            | ParamSpec::Reference { name, .. }
            | ParamSpec::Auto { name } => *name,
        }
    }
}

/// Describes how to assemble a type: its scope and
/// the ordered sources of its constructor arguments
///
/// # Example
/// ```
/// use volga_assembler::{Instruction, Scope};
///
/// struct Repository;
///
/// let instruction = Instruction::new()
///     .scope(Scope::Prototype)
///     .value("url", String::from("postgres://localhost"))
///     .reference::<Repository>("repository")
///     .auto(None);
///
/// assert_eq!(instruction.params().len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Instruction {
    scope: Option<Scope>,
    params: Vec<ParamSpec>,
}

impl Instruction {
    /// Creates an instruction without parameters that uses the assembler's default scope
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scope, overriding the assembler's default
    #[inline]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Appends a literal value parameter
    #[inline]
    pub fn value<V: Send + Sync + 'static>(self, name: impl Into<Option<&'static str>>, value: V) -> Self {
        self.param(ParamSpec::value(name, value))
    }

    /// Appends a literal value parameter held by a shared pointer
    #[inline]
    pub fn shared_value<V>(self, name: impl Into<Option<&'static str>>, value: Arc<V>) -> Self
    where
        V: ?Sized + Send + Sync + 'static
    {
        self.param(ParamSpec::shared_value(name, value))
    }

    /// Appends a dependency on `R`
    #[inline]
    pub fn reference<R: ?Sized + 'static>(self, name: impl Into<Option<&'static str>>) -> Self {
        self.param(ParamSpec::reference::<R>(name))
    }

    /// Appends a dependency on the formal type of the matching parameter
    #[inline]
    pub fn auto(self, name: impl Into<Option<&'static str>>) -> Self {
        self.param(ParamSpec::auto(name))
    }

    /// Appends a parameter spec
    #[inline]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Returns the scope, if one was set
    #[inline]
    pub fn requested_scope(&self) -> Option<Scope> {
        self.scope
    }

    /// Returns the parameter specs, in order
    #[inline]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    #[inline]
    pub(crate) fn into_parts(self) -> (Option<Scope>, Vec<ParamSpec>) {
        (self.scope, self.params)
    }
}
