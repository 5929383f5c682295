//! Assembler builder and the frozen assembler that builds object graphs

use crate::{
    Constructible,
    constructor::Constructor,
    error::Error,
    instruction::{Instruction, Scope},
    registry::{Registry, cycles},
    resolver::Resolver,
    scope::{LocalStore, SingletonStore},
    types::TypeKey
};
use std::sync::Arc;

/// Collects construction rules and capability declarations.
///
/// Registration only happens here. [`AssemblerBuilder::build`] freezes the rules
/// into an [`Assembler`], so nothing can be registered once assembling has started.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use volga_assembler::{AssemblerBuilder, Constructor, Instruction, Scope};
///
/// struct Widget {
///     name: Arc<String>,
/// }
///
/// struct Gadget {
///     name: Arc<String>,
///     widget: Arc<Widget>,
/// }
///
/// let mut builder = AssemblerBuilder::new();
/// builder
///     .register_with(
///         vec![Constructor::new(|name: Arc<String>| Ok(Widget { name })).with_names(["name"])],
///         Instruction::new().value("name", String::from("widget"))
///     )?
///     .register_with(
///         vec![Constructor::new(|name: Arc<String>, widget: Arc<Widget>| Ok(Gadget { name, widget }))
///             .with_names(["name", "widget"])],
///         Instruction::new()
///             .scope(Scope::Prototype)
///             .value("name", String::from("gadget"))
///             .auto("widget")
///     )?;
///
/// let assembler = builder.build();
/// let gadget = assembler.assemble_shared::<Gadget>()?;
/// let widget = assembler.assemble_shared::<Widget>()?;
///
/// assert_eq!(*gadget.name, "gadget");
/// assert!(Arc::ptr_eq(&gadget.widget, &widget));
/// # Ok::<(), volga_assembler::error::Error>(())
/// ```
#[derive(Debug)]
pub struct AssemblerBuilder {
    registry: Registry,
    default_scope: Scope,
}

impl Default for AssemblerBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl AssemblerBuilder {
    /// Creates a new builder whose default scope is [`Scope::Singleton`]
    #[inline]
    pub fn new() -> Self {
        Self {
            registry: Registry::default(),
            default_scope: Scope::default(),
        }
    }

    /// Sets the scope of rules whose instruction does not request one
    ///
    /// Default: [`Scope::Singleton`]
    ///
    /// Affects rules registered after this call only.
    #[inline]
    pub fn with_default_scope(mut self, scope: Scope) -> Self {
        self.default_scope = scope;
        self
    }

    /// Returns the scope of rules whose instruction does not request one
    #[inline]
    pub fn default_scope(&self) -> Scope {
        self.default_scope
    }

    /// Registers a rule for `T`, selecting one of [`Constructible::constructors`]
    ///
    /// See [`AssemblerBuilder::register_with`] for the matching rules.
    #[inline]
    pub fn register<T: Constructible>(&mut self, instruction: Instruction) -> Result<&mut Self, Error> {
        self.register_with(T::constructors(), instruction)
    }

    /// Registers a rule for `T`, selecting one of `constructors`
    ///
    /// A constructor matches when it has as many parameters as the instruction and
    /// every position matches:
    /// - a named spec requires a parameter of the same name;
    /// - a value requires the parameter type to be exactly the value type;
    /// - a reference requires its type to be the parameter type or to implement it;
    /// - an auto reference matches any parameter.
    ///
    /// Exactly one constructor has to match, otherwise [`Error::NoMatchingConstructor`]
    /// or [`Error::AmbiguousConstructorMatch`] is returned and the builder is left unchanged.
    /// A successful registration replaces a previous rule for `T`.
    pub fn register_with<T>(
        &mut self,
        constructors: Vec<Constructor<T>>,
        instruction: Instruction
    ) -> Result<&mut Self, Error>
    where
        T: Send + Sync + 'static
    {
        match self.registry.register(constructors, instruction, self.default_scope) {
            Ok(_rule) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    type_name = _rule.target.name(),
                    scope = %_rule.scope,
                    arity = _rule.params.len(),
                    "assembly instruction registered"
                );
                Ok(self)
            },
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("{err}");
                Err(err)
            }
        }
    }

    /// Declares that `C` implements the capability `I`, usually a trait object,
    /// so `C` can be assembled wherever `I` is requested
    ///
    /// References to `C` match constructor parameters of type `I` only if
    /// the declaration is made before the rule that relies on it is registered.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use volga_assembler::{AssemblerBuilder, Constructor, Instruction};
    ///
    /// trait Greeter: Send + Sync {
    ///     fn greet(&self) -> &'static str;
    /// }
    ///
    /// struct English;
    ///
    /// impl Greeter for English {
    ///     fn greet(&self) -> &'static str { "hello" }
    /// }
    ///
    /// let mut builder = AssemblerBuilder::new();
    /// builder.implements::<English, dyn Greeter>(|english| english as Arc<dyn Greeter>);
    /// builder.register_with(vec![Constructor::new(|| Ok(English))], Instruction::new())?;
    ///
    /// let greeter = builder.build().assemble_shared::<dyn Greeter>()?;
    /// assert_eq!(greeter.greet(), "hello");
    /// # Ok::<(), volga_assembler::error::Error>(())
    /// ```
    pub fn implements<C, I>(&mut self, cast: impl Fn(Arc<C>) -> Arc<I> + Send + Sync + 'static) -> &mut Self
    where
        C: Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static
    {
        self.registry
            .capabilities_mut()
            .declare::<C, I, _>(cast);
        self
    }

    /// Checks whether a rule for `T` has been registered
    #[inline]
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.registry.contains(TypeKey::of::<T>())
    }

    /// Freezes the registered rules into an [`Assembler`]
    pub fn build(self) -> Assembler {
        let cyclic = cycles::cyclic_types(&self.registry);

        #[cfg(feature = "tracing")]
        if !cyclic.is_empty() {
            tracing::warn!(
                types = ?cyclic,
                "assembly instructions contain dependency cycles"
            );
        }

        let singletons = SingletonStore::new(
            self.registry
                .rules()
                .filter(|rule| rule.scope == Scope::Singleton)
                .map(|rule| rule.target),
            |ty| cyclic.contains(ty)
        );
        Assembler {
            locals: LocalStore::thread(),
            shared: Arc::new(Shared {
                registry: self.registry,
                singletons,
            }),
        }
    }
}

/// State shared by an assembler, its clones and scopes
#[derive(Debug)]
struct Shared {
    registry: Registry,
    singletons: SingletonStore,
}

/// Assembles instances according to frozen construction rules
///
/// Cheap to clone, clones share rules, singletons and thread-local instances.
/// Instances of [`Scope::ThreadLocal`] rules are kept per OS thread by the root
/// assembler, and per scope by assemblers created with [`Assembler::create_scope`].
/// Either way they are released with the last clone that holds them,
/// whichever thread drops it.
#[derive(Debug, Clone)]
pub struct Assembler {
    shared: Arc<Shared>,
    locals: LocalStore,
}

impl Assembler {
    /// Creates an execution context that shares rules and singletons with this
    /// assembler but keeps its own [`Scope::ThreadLocal`] instances.
    ///
    /// Use it where work moves between threads, e.g. one scope per task or request.
    #[inline]
    pub fn create_scope(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            locals: LocalStore::context(),
        }
    }

    /// Assembles `T` and returns a clone of the instance.
    /// `T` must implement [`Clone`] otherwise use [`Assembler::assemble_shared`]
    /// that returns a shared pointer.
    #[inline]
    pub fn assemble<T: Send + Sync + Clone + 'static>(&self) -> Result<T, Error> {
        self.assemble_shared::<T>()
            .map(|instance| instance.as_ref().clone())
    }

    /// Assembles `T` and returns a shared pointer, `T` may be a capability such as `dyn Trait`
    ///
    /// Every call starts a fresh cycle detection. Failures are returned as is:
    /// [`Error::NoAssemblyInstruction`], [`Error::AmbiguousAssemblyInstruction`],
    /// [`Error::CyclicDependency`] or [`Error::ConstructionFailed`].
    ///
    /// Singletons assembled as dependencies before a failure stay cached.
    pub fn assemble_shared<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, Error> {
        let shared = self.shared.as_ref();
        Resolver::new(&shared.registry, &shared.singletons, &self.locals)
            .resolve(TypeKey::of::<T>())?
            .try_downcast::<T>()
    }

    /// Checks whether a rule for `T` exists
    #[inline]
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.shared.registry.contains(TypeKey::of::<T>())
    }
}
