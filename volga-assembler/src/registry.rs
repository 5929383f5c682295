//! Rule registry and constructor matching

use crate::{
    capability::{CastFn, Capabilities},
    constructor::{Constructor, InvokeFn, Param},
    error::Error,
    instruction::{Instruction, ParamSpec, Scope},
    types::{KeyMap, TypeKey}
};
use std::fmt::{Debug, Formatter};

pub(crate) mod cycles;

/// An immutable recipe for building one target type
pub(crate) struct Rule {
    pub(crate) target: TypeKey,
    pub(crate) scope: Scope,
    /// Formal parameters of the selected constructor
    pub(crate) params: Vec<Param>,
    /// Argument sources, index-aligned with `params`
    pub(crate) specs: Vec<ParamSpec>,
    pub(crate) invoke: InvokeFn,
}

impl Debug for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("target", &self.target)
            .field("scope", &self.scope)
            .field("params", &self.params)
            .field("specs", &self.specs)
            .finish()
    }
}

impl Rule {
    /// Types that have to be assembled to construct the target, in parameter order
    pub(crate) fn dependencies(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.specs
            .iter()
            .zip(&self.params)
            .filter_map(|(spec, param)| match spec {
                ParamSpec::Value { .. } => None,
                ParamSpec::Reference { ty, .. } => Some(*ty),
                ParamSpec::Auto { .. } => Some(param.ty()),
            })
    }
}

/// A rule found for a requested type
pub(crate) enum Lookup<'a> {
    /// The requested type has its own rule
    Exact(&'a Rule),
    /// The requested type is a capability of the rule's target
    Capability(&'a Rule, &'a CastFn),
}

/// Maps target types to their construction rules
#[derive(Default)]
pub(crate) struct Registry {
    rules: KeyMap<Rule>,
    capabilities: Capabilities,
}

impl Debug for Registry {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Registry {
    #[inline]
    pub(crate) fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[inline]
    pub(crate) fn capabilities_mut(&mut self) -> &mut Capabilities {
        &mut self.capabilities
    }

    #[inline]
    pub(crate) fn contains(&self, target: TypeKey) -> bool {
        self.rules.contains_key(&target)
    }

    #[inline]
    pub(crate) fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    /// Selects the single constructor of `T` that matches the instruction and stores the rule,
    /// replacing any previous rule for `T`
    ///
    /// On error the registry is left unchanged.
    pub(crate) fn register<T: 'static>(
        &mut self,
        constructors: Vec<Constructor<T>>,
        instruction: Instruction,
        default_scope: Scope
    ) -> Result<&Rule, Error> {
        let target = TypeKey::of::<T>();
        let (scope, specs) = instruction.into_parts();
        let constructor = self.select(target, constructors, &specs)?;
        let (params, invoke) = constructor.into_parts();

        let rule = Rule {
            target,
            scope: scope.unwrap_or(default_scope),
            params,
            specs,
            invoke,
        };
        self.rules.insert(target, rule);
        Ok(&self.rules[&target])
    }

    fn select<T>(
        &self,
        target: TypeKey,
        constructors: Vec<Constructor<T>>,
        specs: &[ParamSpec]
    ) -> Result<Constructor<T>, Error> {
        let mut matches = constructors
            .into_iter()
            .filter(|ctor| ctor.arity() == specs.len())
            .filter(|ctor| ctor.params()
                .iter()
                .zip(specs)
                .all(|(param, spec)| self.is_match(param, spec)));

        let Some(first) = matches.next() else {
            return Err(Error::NoMatchingConstructor(target.name()));
        };
        let rest = matches.count();
        if rest > 0 {
            return Err(Error::AmbiguousConstructorMatch {
                type_name: target.name(),
                candidates: rest + 1,
            });
        }
        Ok(first)
    }

    fn is_match(&self, param: &Param, spec: &ParamSpec) -> bool {
        if let Some(name) = spec.name() && param.name() != Some(name) {
            return false;
        }
        match spec {
            ParamSpec::Value { value, .. } => value.type_key() == param.ty(),
            ParamSpec::Reference { ty, .. } => self.capabilities.satisfies(*ty, param.ty()),
            ParamSpec::Auto { .. } => true,
        }
    }

    /// Finds the rule that assembles `requested`
    ///
    /// An exact rule wins. Otherwise the types declared to implement `requested`
    /// are considered, and exactly one of them must have a rule.
    pub(crate) fn lookup(&self, requested: TypeKey) -> Result<Lookup<'_>, Error> {
        if let Some(rule) = self.rules.get(&requested) {
            return Ok(Lookup::Exact(rule));
        }

        let mut candidates = self.capabilities
            .implementors(requested)
            .iter()
            .filter_map(|concrete| self.rules.get(concrete));

        let Some(rule) = candidates.next() else {
            return Err(Error::NoAssemblyInstruction(requested.name()));
        };
        if let Some(other) = candidates.next() {
            let candidates = [rule, other]
                .into_iter()
                .chain(candidates)
                .map(|rule| rule.target.name())
                .collect();
            return Err(Error::AmbiguousAssemblyInstruction {
                type_name: requested.name(),
                candidates,
            });
        }

        let cast = self.capabilities
            .cast_fn(rule.target, requested)
            .ok_or(Error::ResolveFailed(requested.name()))?;
        Ok(Lookup::Capability(rule, cast))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    trait Transport: Send + Sync {}

    struct Tcp;
    struct Udp;
    struct Client;

    impl Transport for Tcp {}
    impl Transport for Udp {}

    fn client_constructors() -> Vec<Constructor<Client>> {
        vec![
            Constructor::new(|| Ok(Client)),
            Constructor::new(|_: Arc<String>| Ok(Client)).with_names(["host"]),
            Constructor::new(|_: Arc<u16>| Ok(Client)).with_names(["port"]),
            Constructor::new(|_: Arc<String>, _: Arc<Tcp>| Ok(Client)).with_names(["host", "tcp"]),
            Constructor::new(|_: Arc<String>, _: Arc<dyn Transport>| Ok(Client)).with_names(["host", "transport"]),
        ]
    }

    fn transport_registry() -> Registry {
        let mut registry = Registry::default();
        registry.capabilities_mut().declare::<Tcp, dyn Transport, _>(|tcp| tcp as Arc<dyn Transport>);
        registry.capabilities_mut().declare::<Udp, dyn Transport, _>(|udp| udp as Arc<dyn Transport>);
        registry
    }

    #[test]
    fn it_selects_constructor_by_value_type() {
        let mut registry = Registry::default();

        let rule = registry.register(
            client_constructors(),
            Instruction::new().value(None, 8080u16),
            Scope::Singleton
        ).unwrap();

        assert_eq!(rule.params[0].name(), Some("port"));
        assert_eq!(rule.scope, Scope::Singleton);
    }

    #[test]
    fn it_selects_zero_arity_constructor() {
        let mut registry = Registry::default();

        let rule = registry.register(client_constructors(), Instruction::new(), Scope::Prototype).unwrap();

        assert!(rule.params.is_empty());
        assert_eq!(rule.scope, Scope::Prototype);
    }

    #[test]
    fn it_prefers_requested_scope_over_default() {
        let mut registry = Registry::default();

        let rule = registry.register(
            client_constructors(),
            Instruction::new().scope(Scope::ThreadLocal),
            Scope::Prototype
        ).unwrap();

        assert_eq!(rule.scope, Scope::ThreadLocal);
    }

    #[test]
    fn it_rejects_wrong_param_name() {
        let mut registry = Registry::default();

        let result = registry.register(
            client_constructors(),
            Instruction::new().value("wrong", String::from("localhost")),
            Scope::Singleton
        );

        assert!(matches!(result, Err(Error::NoMatchingConstructor(_))));
        assert!(!registry.contains(TypeKey::of::<Client>()));
    }

    #[test]
    fn it_rejects_value_of_different_type() {
        let mut registry = Registry::default();

        let result = registry.register(
            client_constructors(),
            Instruction::new().value("host", 42i32),
            Scope::Singleton
        );

        assert!(matches!(result, Err(Error::NoMatchingConstructor(_))));
    }

    #[test]
    fn it_rejects_named_spec_for_unnamed_param() {
        let mut registry = Registry::default();
        let constructors = vec![Constructor::new(|_: Arc<String>| Ok(Client))];

        let result = registry.register(
            constructors,
            Instruction::new().value("host", String::from("localhost")),
            Scope::Singleton
        );

        assert!(matches!(result, Err(Error::NoMatchingConstructor(_))));
    }

    #[test]
    fn it_rejects_ambiguous_match() {
        let mut registry = transport_registry();

        let result = registry.register(
            client_constructors(),
            Instruction::new()
                .value(None, String::from("localhost"))
                .auto(None),
            Scope::Singleton
        );

        assert!(matches!(
            result,
            Err(Error::AmbiguousConstructorMatch { candidates: 2, .. })
        ));
    }

    #[test]
    fn it_keeps_previous_rule_when_registration_fails() {
        let mut registry = Registry::default();
        registry.register(client_constructors(), Instruction::new(), Scope::Prototype).unwrap();

        let result = registry.register(
            client_constructors(),
            Instruction::new().value("unknown", 1u8),
            Scope::Singleton
        );

        assert!(result.is_err());
        let Lookup::Exact(rule) = registry.lookup(TypeKey::of::<Client>()).unwrap() else {
            panic!("Expected exact rule");
        };
        assert_eq!(rule.scope, Scope::Prototype);
    }

    #[test]
    fn it_overwrites_previous_rule() {
        let mut registry = Registry::default();
        registry.register(client_constructors(), Instruction::new(), Scope::Prototype).unwrap();
        registry.register(client_constructors(), Instruction::new().value("port", 1u16), Scope::Singleton).unwrap();

        let Lookup::Exact(rule) = registry.lookup(TypeKey::of::<Client>()).unwrap() else {
            panic!("Expected exact rule");
        };
        assert_eq!(rule.params.len(), 1);
        assert_eq!(rule.scope, Scope::Singleton);
    }

    #[test]
    fn it_matches_reference_by_capability() {
        let mut registry = transport_registry();

        let rule = registry.register(
            client_constructors(),
            Instruction::new()
                .value("host", String::from("localhost"))
                .reference::<Udp>(None),
            Scope::Singleton
        ).unwrap();

        assert_eq!(rule.params[1].name(), Some("transport"));
        assert_eq!(rule.dependencies().collect::<Vec<_>>(), vec![TypeKey::of::<Udp>()]);
    }

    #[test]
    fn it_rejects_reference_without_capability() {
        let mut registry = Registry::default();

        let result = registry.register(
            client_constructors(),
            Instruction::new()
                .value("host", String::from("localhost"))
                .reference::<Udp>("transport"),
            Scope::Singleton
        );

        assert!(matches!(result, Err(Error::NoMatchingConstructor(_))));
    }

    #[test]
    fn it_reports_auto_dependency_as_formal_type() {
        let mut registry = transport_registry();

        let rule = registry.register(
            client_constructors(),
            Instruction::new()
                .value("host", String::from("localhost"))
                .auto("transport"),
            Scope::Singleton
        ).unwrap();

        assert_eq!(rule.dependencies().collect::<Vec<_>>(), vec![TypeKey::of::<dyn Transport>()]);
    }

    #[test]
    fn it_looks_up_single_implementation() {
        let mut registry = transport_registry();
        registry.register(vec![Constructor::new(|| Ok(Tcp))], Instruction::new(), Scope::Singleton).unwrap();

        let lookup = registry.lookup(TypeKey::of::<dyn Transport>()).unwrap();

        assert!(matches!(lookup, Lookup::Capability(rule, _) if rule.target == TypeKey::of::<Tcp>()));
    }

    #[test]
    fn it_rejects_ambiguous_implementation() {
        let mut registry = transport_registry();
        registry.register(vec![Constructor::new(|| Ok(Tcp))], Instruction::new(), Scope::Singleton).unwrap();
        registry.register(vec![Constructor::new(|| Ok(Udp))], Instruction::new(), Scope::Singleton).unwrap();

        let err = registry.lookup(TypeKey::of::<dyn Transport>()).err().unwrap();

        match err {
            Error::AmbiguousAssemblyInstruction { candidates, .. } => assert_eq!(candidates.len(), 2),
            _ => panic!("Expected AmbiguousAssemblyInstruction error"),
        }
    }

    #[test]
    fn it_fails_lookup_without_rule() {
        let registry = transport_registry();

        let err = registry.lookup(TypeKey::of::<dyn Transport>()).err().unwrap();

        assert!(matches!(err, Error::NoAssemblyInstruction(_)));
    }
}
