use alloc::sync::Arc;
use std::sync::OnceLock;

use crate::SerialError;
use crate::descriptor::TypeDescriptor;
use crate::protocol::{Decoder, Encoder};
use crate::serializer::{Serializer, SerializerRef};

/// A serializer built on first use.
///
/// A self-referential type needs a serializer for the container holding
/// itself. Building that child eagerly would recurse forever, so the
/// child is wrapped in a `LazySerializer` whose `init` runs once, the
/// first time the serializer is actually used.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_serialize::{Serializer, SerializerRef};
/// use vc_serialize::serializer::{LazySerializer, ListSerializer, PrimitiveSerializer};
///
/// fn numbers() -> SerializerRef<Vec<u8>> {
///     Arc::new(ListSerializer::new(Arc::new(PrimitiveSerializer::<u8>::new())))
/// }
///
/// let lazy = LazySerializer::new(numbers);
/// assert!(!lazy.is_initialized());
/// assert_eq!(lazy.descriptor().name(), "alloc::vec::Vec<u8>");
/// assert!(lazy.is_initialized());
/// ```
pub struct LazySerializer<T> {
    init: fn() -> SerializerRef<T>,
    cell: OnceLock<SerializerRef<T>>,
}

impl<T> LazySerializer<T> {
    /// Creates a serializer that calls `init` on first use.
    #[inline]
    pub const fn new(init: fn() -> SerializerRef<T>) -> Self {
        Self {
            init,
            cell: OnceLock::new(),
        }
    }

    /// Returns the underlying serializer, building it if needed.
    #[inline]
    pub fn get(&self) -> &SerializerRef<T> {
        self.cell.get_or_init(self.init)
    }

    /// Returns `true` once the underlying serializer was built.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Serializer<T> for LazySerializer<T> {
    #[inline]
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        self.get().descriptor()
    }

    #[inline]
    fn save(&self, encoder: &mut dyn Encoder, value: &T) -> Result<(), SerialError> {
        self.get().save(encoder, value)
    }

    #[inline]
    fn load(&self, decoder: &mut dyn Decoder) -> Result<T, SerialError> {
        self.get().load(decoder)
    }

    #[inline]
    fn update(&self, decoder: &mut dyn Decoder, old: T) -> Result<T, SerialError> {
        self.get().update(decoder, old)
    }
}
