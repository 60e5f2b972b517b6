use alloc::sync::Arc;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::registry::SerialRegistry;

/// A [`SerialRegistry`] shared behind a read-write lock.
///
/// Plain registries are mutated through `&mut` during setup and shared
/// through `Arc` afterwards. This wrapper is for callers that must keep
/// registering after the registry was shared. Lock poisoning is ignored.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_serialize::registry::SerialRegistryArc;
/// use vc_serialize::serializer::PrimitiveSerializer;
///
/// let shared = SerialRegistryArc::default();
/// shared.write().register::<u32>(Arc::new(PrimitiveSerializer::<u32>::new())).unwrap();
///
/// assert!(shared.read().contains::<u32>());
/// ```
#[derive(Clone, Default)]
pub struct SerialRegistryArc {
    /// The wrapped [`SerialRegistry`].
    pub internal: Arc<RwLock<SerialRegistry>>,
}

impl SerialRegistryArc {
    /// Wraps an existing registry.
    #[inline]
    pub fn new(registry: SerialRegistry) -> Self {
        Self {
            internal: Arc::new(RwLock::new(registry)),
        }
    }

    /// Takes a read lock on the underlying [`SerialRegistry`].
    pub fn read(&self) -> RwLockReadGuard<'_, SerialRegistry> {
        self.internal.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a write lock on the underlying [`SerialRegistry`].
    pub fn write(&self) -> RwLockWriteGuard<'_, SerialRegistry> {
        self.internal
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Clones the current state into an immutable registry for a format adapter.
    ///
    /// The snapshot is a new registry with the same bindings and parent.
    pub fn snapshot(&self) -> Arc<SerialRegistry> {
        Arc::new(self.read().clone())
    }
}

impl core::fmt::Debug for SerialRegistryArc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&*self.read(), f)
    }
}
