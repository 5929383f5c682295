//! Generic factory for constructing types

use crate::error::BoxError;

/// A trait that describes a generic factory function
/// that constructs an object from already assembled arguments
pub trait GenericFactory<Args>: Send + Sync + 'static {
    /// A type of object that will be constructed
    type Output;

    /// Calls a generic function and returns either constructed object or error
    fn call(&self, args: Args) -> Result<Self::Output, BoxError>;
}

impl<F, R> GenericFactory<()> for F
where
    F: Fn() -> Result<R, BoxError> + Send + Sync + 'static
{
    type Output = R;

    #[inline]
    fn call(&self, _: ()) -> Result<Self::Output, BoxError> {
        self()
    }
}

macro_rules! define_generic_factory ({ $($param:ident)* } => {
    impl<F, R, $($param,)*> GenericFactory<($($param,)*)> for F
    where
        F: Fn($($param),*) -> Result<R, BoxError> + Send + Sync + 'static,
    {
        type Output = R;

        #[inline]
        #[allow(non_snake_case)]
        fn call(&self, ($($param,)*): ($($param,)*)) -> Result<Self::Output, BoxError> {
            (self)($($param,)*)
        }
    }
});

define_generic_factory! { T1 }
define_generic_factory! { T1 T2 }
define_generic_factory! { T1 T2 T3 }
define_generic_factory! { T1 T2 T3 T4 }
define_generic_factory! { T1 T2 T3 T4 T5 }
define_generic_factory! { T1 T2 T3 T4 T5 T6 }
define_generic_factory! { T1 T2 T3 T4 T5 T6 T7 }
define_generic_factory! { T1 T2 T3 T4 T5 T6 T7 T8 }

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Point(i32, i32);

    fn call_factory<F, Args>(factory: F, args: Args) -> Result<F::Output, BoxError>
    where
        F: GenericFactory<Args>
    {
        factory.call(args)
    }

    #[test]
    fn it_calls_factory_without_arguments() {
        let point = call_factory(|| Ok(Point(1, 2)), ()).unwrap();

        assert_eq!(point.0, 1);
        assert_eq!(point.1, 2);
    }

    #[test]
    fn it_calls_factory_with_arguments() {
        let point = call_factory(
            |x: Arc<i32>, y: Arc<i32>| Ok(Point(*x, *y)),
            (Arc::new(3), Arc::new(4))
        ).unwrap();

        assert_eq!(point.0, 3);
        assert_eq!(point.1, 4);
    }

    #[test]
    fn it_returns_factory_error() {
        let result = call_factory(
            |x: Arc<i32>| -> Result<Point, BoxError> {
                if *x < 0 {
                    return Err("negative coordinate".into());
                }
                Ok(Point(*x, 0))
            },
            (Arc::new(-1),)
        );

        assert_eq!(result.unwrap_err().to_string(), "negative coordinate");
    }
}
