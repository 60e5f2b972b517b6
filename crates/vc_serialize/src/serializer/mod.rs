//! Serializers and the built-in serializer algebra.
//!
//! A [`Serializer<T>`] binds a descriptor to the save/load logic of `T`.
//! Serializers are stateless with respect to values and shared through
//! [`SerializerRef<T>`].
//!
//! ## Composition
//!
//! Generic containers are serialized by composites built from one child
//! serializer per type parameter:
//!
//! | Type | Serializer | Merge-decoding |
//! |------|------------|----------------|
//! | primitives | [`PrimitiveSerializer`], [`BytesSerializer`] | replaces |
//! | `Vec<E>` | [`ListSerializer`] | appends |
//! | `BTreeMap<K, V>`, `HashMap<K, V>` | [`MapSerializer`] | inserts or overwrites |
//! | `Option<E>` | [`NullableSerializer`] | merges into `Some` |
//! | `Box<E>` | [`BoxSerializer`] | delegates |
//! | unit enums | [`UnitEnumSerializer`] | replaces |
//! | [`DynValue`] | [`PolymorphicSerializer`] | unsupported |
//!
//! [`LazySerializer`] defers building a serializer until first use, which
//! is how self-referential types avoid recursing at construction.

use alloc::sync::Arc;
use std::sync::OnceLock;

use crate::SerialError;
use crate::descriptor::TypeDescriptor;
use crate::protocol::{Decoder, Encoder};

// -----------------------------------------------------------------------------
// Modules

mod boxed;
mod enums;
mod lazy;
mod list;
mod map;
mod nullable;
mod polymorphic;
mod primitive;

// -----------------------------------------------------------------------------
// Exports

pub use boxed::BoxSerializer;
pub use enums::UnitEnumSerializer;
pub use lazy::LazySerializer;
pub use list::ListSerializer;
pub use map::{MapCollection, MapSerializer};
pub use nullable::NullableSerializer;
pub use polymorphic::{DynValue, PolymorphicSerializer};
pub use primitive::{BytesSerializer, PrimitiveSerializer};

// -----------------------------------------------------------------------------
// Serializer

/// Encode and decode logic for values of type `T`.
///
/// `save` followed by `load` must reconstruct an equal value for
/// lossless types.
pub trait Serializer<T>: Send + Sync {
    /// The descriptor of the serialized shape.
    fn descriptor(&self) -> &Arc<TypeDescriptor>;

    /// Writes `value` to the encoder.
    fn save(&self, encoder: &mut dyn Encoder, value: &T) -> Result<(), SerialError>;

    /// Reads a new value from the decoder.
    fn load(&self, decoder: &mut dyn Decoder) -> Result<T, SerialError>;

    /// Reads from the decoder into an existing value.
    ///
    /// The default refuses with [`SerialError::UnsupportedMerge`]. It never
    /// silently falls back to [`load`](Self::load).
    fn update(&self, decoder: &mut dyn Decoder, old: T) -> Result<T, SerialError> {
        let _ = (decoder, old);
        Err(SerialError::unsupported_merge(self.descriptor()))
    }
}

/// A shared, type-erased serializer.
pub type SerializerRef<T> = Arc<dyn Serializer<T>>;

// -----------------------------------------------------------------------------
// SerializerCell

/// Container for static storage of a shared serializer.
///
/// Used by [`SerialType`](crate::SerialType) implementations whose default
/// serializer does not depend on any other serializer.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_serialize::SerializerRef;
/// use vc_serialize::serializer::{PrimitiveSerializer, SerializerCell};
///
/// fn shared() -> SerializerRef<u32> {
///     static CELL: SerializerCell<u32> = SerializerCell::new();
///     CELL.get_or_init(|| Arc::new(PrimitiveSerializer::<u32>::new()))
/// }
///
/// assert!(Arc::ptr_eq(&shared(), &shared()));
/// ```
pub struct SerializerCell<T>(OnceLock<SerializerRef<T>>);

impl<T> SerializerCell<T> {
    /// Creates an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns a handle to the stored serializer, creating it on first access.
    #[inline]
    pub fn get_or_init(&self, f: impl FnOnce() -> SerializerRef<T>) -> SerializerRef<T> {
        self.0.get_or_init(f).clone()
    }
}

impl<T> Default for SerializerCell<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
