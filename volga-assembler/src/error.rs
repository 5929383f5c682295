//! Describes assembly errors

use std::{
    error::Error as StdError,
    fmt::{Display, Formatter},
    sync::Arc
};

/// A boxed error returned by a failing constructor
pub type BoxError = Box<
    dyn StdError
    + Send
    + Sync
>;

/// Errors raised while registering rules or assembling instances
#[derive(Debug, Clone)]
pub enum Error {
    /// No constructor of the type matches the declared parameters
    NoMatchingConstructor(&'static str),

    /// More than one constructor of the type matches the declared parameters
    AmbiguousConstructorMatch {
        /// The type being registered
        type_name: &'static str,
        /// Number of constructors that matched
        candidates: usize,
    },

    /// Neither the requested type nor any of its implementations has a rule
    NoAssemblyInstruction(&'static str),

    /// The requested capability is implemented by several registered types
    AmbiguousAssemblyInstruction {
        /// The requested type
        type_name: &'static str,
        /// Registered types that implement it, in declaration order
        candidates: Vec<&'static str>,
    },

    /// A type was requested again while it was still being assembled
    CyclicDependency {
        /// The type that was revisited
        type_name: &'static str,
        /// The resolution path that led back to it, outermost first
        path: Vec<&'static str>,
    },

    /// The constructor of the type returned an error
    ConstructionFailed {
        /// The type being constructed
        type_name: &'static str,
        /// The error returned by the constructor
        cause: Arc<dyn StdError + Send + Sync>,
    },

    /// An instance could not be converted to the requested type
    ResolveFailed(&'static str),
}

impl Error {
    #[inline]
    pub(crate) fn construction_failed(type_name: &'static str, cause: BoxError) -> Self {
        Self::ConstructionFailed { type_name, cause: Arc::from(cause) }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NoMatchingConstructor(type_name) =>
                write!(f, "Assembly Error: no matching constructor found for {type_name}"),
            Error::AmbiguousConstructorMatch { type_name, candidates } =>
                write!(f, "Assembly Error: {candidates} constructors of {type_name} match the assembly instruction"),
            Error::NoAssemblyInstruction(type_name) =>
                write!(f, "Assembly Error: no assembly instruction has been supplied for {type_name}"),
            Error::AmbiguousAssemblyInstruction { type_name, candidates } =>
                write!(f, "Assembly Error: {type_name} is implemented by several registered types: {}", candidates.join(", ")),
            Error::CyclicDependency { type_name, path } =>
                write!(f, "Assembly Error: cyclic dependency on {type_name}: {} -> {type_name}", path.join(" -> ")),
            Error::ConstructionFailed { type_name, cause } =>
                write!(f, "Assembly Error: failed to construct {type_name}: {cause}"),
            Error::ResolveFailed(type_name) =>
                write!(f, "Assembly Error: unable to resolve the instance as {type_name}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::ConstructionFailed { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn it_formats_cyclic_dependency_with_path() {
        let err = Error::CyclicDependency {
            type_name: "A",
            path: vec!["A", "B"],
        };

        assert_eq!(err.to_string(), "Assembly Error: cyclic dependency on A: A -> B -> A");
    }

    #[test]
    fn it_exposes_construction_cause_as_source() {
        let cause: BoxError = Box::new(io::Error::other("disk is gone"));
        let err = Error::construction_failed("Storage", cause);

        let source = err.source().unwrap();

        assert_eq!(source.to_string(), "disk is gone");
        assert_eq!(err.to_string(), "Assembly Error: failed to construct Storage: disk is gone");
    }

    #[test]
    fn it_has_no_source_for_registration_errors() {
        let err = Error::NoMatchingConstructor("Widget");

        assert!(err.source().is_none());
    }
}
