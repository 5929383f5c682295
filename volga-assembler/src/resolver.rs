//! Recursive dependency resolution with cycle detection

use crate::{
    error::Error,
    instruction::{ParamSpec, Scope},
    registry::{Lookup, Registry, Rule},
    scope::{LocalStore, SingletonStore},
    types::{Instance, TypeKey}
};
use smallvec::SmallVec;

/// Usual depth of a dependency graph
const DEFAULT_PATH_DEPTH: usize = 8;

/// Types currently being resolved within one top-level assembly, outermost first
#[derive(Debug, Default)]
pub(crate) struct ResolutionSet {
    path: SmallVec<[TypeKey; DEFAULT_PATH_DEPTH]>,
}

impl ResolutionSet {
    /// Marks `ty` as in progress or fails if it already is
    #[inline]
    pub(crate) fn enter(&mut self, ty: TypeKey) -> Result<(), Error> {
        if self.path.contains(&ty) {
            return Err(Error::CyclicDependency {
                type_name: ty.name(),
                path: self.path.iter().map(TypeKey::name).collect(),
            });
        }
        self.path.push(ty);
        Ok(())
    }

    /// Marks the innermost type as finished
    #[inline]
    pub(crate) fn leave(&mut self) {
        self.path.pop();
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Walks the dependency graph of one top-level assembly
pub(crate) struct Resolver<'a> {
    registry: &'a Registry,
    singletons: &'a SingletonStore,
    locals: &'a LocalStore,
    touched: ResolutionSet,
}

impl<'a> Resolver<'a> {
    #[inline]
    pub(crate) fn new(
        registry: &'a Registry,
        singletons: &'a SingletonStore,
        locals: &'a LocalStore
    ) -> Self {
        Self {
            registry,
            singletons,
            locals,
            touched: ResolutionSet::default(),
        }
    }

    /// Resolves an instance of `ty`, assembling its dependencies first
    pub(crate) fn resolve(&mut self, ty: TypeKey) -> Result<Instance, Error> {
        if let Err(err) = self.touched.enter(ty) {
            #[cfg(feature = "tracing")]
            tracing::debug!("{err}");
            return Err(err);
        }
        let result = self.resolve_entered(ty);
        self.touched.leave();
        result
    }

    fn resolve_entered(&mut self, ty: TypeKey) -> Result<Instance, Error> {
        let registry = self.registry;
        let rule = match registry.lookup(ty)? {
            Lookup::Exact(rule) => rule,
            Lookup::Capability(rule, cast) => {
                let instance = self.resolve(rule.target)?;
                return cast(&instance);
            }
        };

        let singletons = self.singletons;
        let locals = self.locals;
        match rule.scope {
            Scope::Prototype => self.construct(rule),
            Scope::Singleton => singletons.get_or_try_init(ty, || self.construct(rule)),
            Scope::ThreadLocal => locals.get_or_try_init(ty, || self.construct(rule)),
        }
    }

    fn construct(&mut self, rule: &Rule) -> Result<Instance, Error> {
        let registry = self.registry;
        let capabilities = registry.capabilities();
        let mut arguments = Vec::with_capacity(rule.specs.len());
        for (spec, param) in rule.specs.iter().zip(&rule.params) {
            let argument = match spec {
                ParamSpec::Value { value, .. } => value.clone(),
                ParamSpec::Reference { ty, .. } => {
                    let instance = self.resolve(*ty)?;
                    capabilities.cast(&instance, param.ty())?
                },
                ParamSpec::Auto { .. } => self.resolve(param.ty())?,
            };
            arguments.push(argument);
        }

        let result = (rule.invoke)(&arguments);

        #[cfg(feature = "tracing")]
        if let Err(err) = &result {
            tracing::debug!("{err}");
        }

        result
    }
}
