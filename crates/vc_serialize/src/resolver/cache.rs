use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;
use std::sync::{PoisonError, RwLock};

use vc_utils::TypeIdMap;

use crate::ResolveError;
use crate::registry::SerialRegistry;
use crate::resolver::{Resolver, SerialType};
use crate::serializer::SerializerRef;

/// Memoized resolution against one registry.
///
/// Composite serializers are rebuilt on every [`Resolver::resolve`] call.
/// Format adapters that resolve the same types repeatedly keep a cache
/// instead, which hands out the same [`SerializerRef`] each time.
/// Failures are not cached.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_serialize::registry::SerialRegistry;
/// use vc_serialize::resolver::ResolverCache;
///
/// let cache = ResolverCache::new(Arc::new(SerialRegistry::empty()));
/// let a = cache.resolve::<Vec<String>>().unwrap();
/// let b = cache.resolve::<Vec<String>>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub struct ResolverCache {
    registry: Arc<SerialRegistry>,
    cache: RwLock<TypeIdMap<Box<dyn Any + Send + Sync>>>,
}

impl ResolverCache {
    /// Creates an empty cache over `registry`.
    pub fn new(registry: Arc<SerialRegistry>) -> Self {
        Self {
            registry,
            cache: RwLock::new(TypeIdMap::new()),
        }
    }

    /// The registry resolutions fall back to.
    #[inline]
    pub fn registry(&self) -> &Arc<SerialRegistry> {
        &self.registry
    }

    /// Resolves the serializer of `T`, reusing an earlier result.
    pub fn resolve<T: SerialType>(&self) -> Result<SerializerRef<T>, ResolveError> {
        let type_id = TypeId::of::<T>();
        if let Some(serializer) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .and_then(|entry| entry.downcast_ref::<SerializerRef<T>>())
        {
            return Ok(serializer.clone());
        }

        let serializer = Resolver::new(&self.registry).resolve::<T>()?;
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have won the race, keep its entry.
        cache.try_insert(type_id, || Box::new(serializer.clone()));
        Ok(cache
            .get(&type_id)
            .and_then(|entry| entry.downcast_ref::<SerializerRef<T>>())
            .cloned()
            .unwrap_or(serializer))
    }

    /// Drops all cached serializers.
    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns the number of cached types.
    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ResolverCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverCache")
            .field("registry", &self.registry.id())
            .field("cached", &self.len())
            .finish()
    }
}
