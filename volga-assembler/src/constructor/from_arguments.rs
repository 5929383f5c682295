//! Extractors for converting assembled arguments into constructor parameters

use crate::{
    error::Error,
    types::{Instance, TypeKey}
};
use std::sync::Arc;

/// A trait that defines how a constructor parameter is extracted
/// from an assembled argument
pub trait FromArgument: Sized + Send + Sync + 'static {
    /// The formal type of the parameter, which is what gets assembled for it
    fn param_type() -> TypeKey;

    /// Extracts `Self` from an assembled argument
    fn from_argument(argument: &Instance) -> Result<Self, Error>;
}

impl<T: ?Sized + Send + Sync + 'static> FromArgument for Arc<T> {
    #[inline]
    fn param_type() -> TypeKey {
        TypeKey::of::<T>()
    }

    #[inline]
    fn from_argument(argument: &Instance) -> Result<Self, Error> {
        argument.try_downcast::<T>()
    }
}

/// A trait that defines how the whole parameter list of a constructor
/// is extracted from assembled arguments
pub trait FromArguments: Sized + Send + Sync {
    /// Formal types of the parameters, in order
    fn param_types() -> Vec<TypeKey>;

    /// Extracts `Self` from assembled arguments, index-aligned with [`FromArguments::param_types`]
    fn from_arguments(arguments: &[Instance]) -> Result<Self, Error>;
}

impl FromArguments for () {
    #[inline]
    fn param_types() -> Vec<TypeKey> {
        Vec::new()
    }

    #[inline]
    fn from_arguments(_: &[Instance]) -> Result<Self, Error> {
        Ok(())
    }
}

macro_rules! define_generic_from_arguments {
    ($($T: ident),*) => {
        impl<$($T: FromArgument),+> FromArguments for ($($T,)+) {
            #[inline]
            fn param_types() -> Vec<TypeKey> {
                vec![$($T::param_type(),)*]
            }

            #[inline]
            #[allow(non_snake_case)]
            fn from_arguments(arguments: &[Instance]) -> Result<Self, Error> {
                let mut arguments = arguments.iter();
                let tuple = (
                    $(
                    $T::from_argument(arguments
                        .next()
                        .ok_or(Error::ResolveFailed(std::any::type_name::<$T>()))?)?,
                    )*
                );
                Ok(tuple)
            }
        }
    }
}

define_generic_from_arguments! { T1 }
define_generic_from_arguments! { T1, T2 }
define_generic_from_arguments! { T1, T2, T3 }
define_generic_from_arguments! { T1, T2, T3, T4 }
define_generic_from_arguments! { T1, T2, T3, T4, T5 }
define_generic_from_arguments! { T1, T2, T3, T4, T5, T6 }
define_generic_from_arguments! { T1, T2, T3, T4, T5, T6, T7 }
define_generic_from_arguments! { T1, T2, T3, T4, T5, T6, T7, T8 }
