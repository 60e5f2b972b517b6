//! Serializer resolution.
//!
//! [`Resolver::resolve_with`] picks the serializer of a type in strict
//! priority order:
//!
//! 1. the explicit override of the use site, if any;
//! 2. the default declared by the type through [`SerialType`];
//! 3. the registry chain;
//! 4. otherwise [`ResolveError::NotFound`].
//!
//! Generic types declare a default built from the serializers of their
//! type arguments, each resolved by the same algorithm. A failure anywhere
//! fails the whole resolution.
//!
//! An explicit override always wins and is not checked against the
//! default of the type.

use core::any::type_name;

use crate::ResolveError;
use crate::registry::SerialRegistry;
use crate::serializer::SerializerRef;

// -----------------------------------------------------------------------------
// Modules

mod cache;
mod impls;

// -----------------------------------------------------------------------------
// Exports

pub use cache::ResolverCache;

// -----------------------------------------------------------------------------
// SerialType

/// A type that may declare a default serializer.
///
/// Types without a default implement the trait with an empty body and are
/// resolved through the registry.
///
/// # Examples
///
/// ```
/// use vc_serialize::{Resolver, SerialType};
/// use vc_serialize::registry::SerialRegistry;
///
/// struct Point { x: i32, y: i32 }
///
/// impl SerialType for Point {}
///
/// let registry = SerialRegistry::empty();
/// let err = Resolver::new(&registry).resolve::<Point>().err().unwrap();
/// assert!(err.type_name().ends_with("Point"));
///
/// // Generic arguments fail the whole resolution.
/// assert!(Resolver::new(&registry).resolve::<Vec<Point>>().is_err());
/// assert!(Resolver::new(&registry).resolve::<Vec<i32>>().is_ok());
/// ```
pub trait SerialType: Sized + 'static {
    /// Returns the declared default serializer, `None` if there is none.
    ///
    /// Generic types resolve their type arguments through `resolver`.
    #[inline]
    fn default_serializer(
        resolver: &Resolver<'_>,
    ) -> Result<Option<SerializerRef<Self>>, ResolveError> {
        let _ = resolver;
        Ok(None)
    }
}

// -----------------------------------------------------------------------------
// Resolver

/// Resolves serializers against one registry.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a SerialRegistry,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over `registry` and its ancestors.
    #[inline]
    pub const fn new(registry: &'a SerialRegistry) -> Self {
        Self { registry }
    }

    /// The registry consulted in the last resolution step.
    #[inline]
    pub const fn registry(&self) -> &'a SerialRegistry {
        self.registry
    }

    /// Resolves the serializer of `T` without override.
    #[inline]
    pub fn resolve<T: SerialType>(&self) -> Result<SerializerRef<T>, ResolveError> {
        self.resolve_with(None)
    }

    /// Resolves the serializer of `T`, preferring `explicit`.
    pub fn resolve_with<T: SerialType>(
        &self,
        explicit: Option<SerializerRef<T>>,
    ) -> Result<SerializerRef<T>, ResolveError> {
        if let Some(serializer) = explicit {
            return Ok(serializer);
        }
        if let Some(serializer) = T::default_serializer(self)? {
            return Ok(serializer);
        }
        self.resolve_contextual::<T>()
    }

    /// Resolves the serializer of `T` from the registry chain only.
    ///
    /// Usable for foreign types that cannot implement [`SerialType`].
    pub fn resolve_contextual<T: 'static>(&self) -> Result<SerializerRef<T>, ResolveError> {
        match self.registry.get::<T>() {
            Some(serializer) => {
                log::trace!(
                    "resolved `{}` from registry {}",
                    type_name::<T>(),
                    self.registry.id()
                );
                Ok(serializer)
            }
            None => {
                log::debug!(
                    "no serializer for `{}` in registry {} or its parents",
                    type_name::<T>(),
                    self.registry.id()
                );
                Err(ResolveError::NotFound {
                    type_name: type_name::<T>(),
                })
            }
        }
    }
}

/// Resolves the serializer of `T`, see [`Resolver::resolve_with`].
#[inline]
pub fn resolve<T: SerialType>(
    explicit: Option<SerializerRef<T>>,
    registry: &SerialRegistry,
) -> Result<SerializerRef<T>, ResolveError> {
    Resolver::new(registry).resolve_with(explicit)
}

// -----------------------------------------------------------------------------
// Tests
