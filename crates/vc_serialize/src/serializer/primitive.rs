use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use crate::SerialError;
use crate::descriptor::TypeDescriptor;
use crate::protocol::{Decoder, Encoder, PrimitiveType, decode_primitive_as};
use crate::serializer::Serializer;

/// Leaf serializer of a [`PrimitiveType`].
///
/// Merge-decoding a primitive replaces it.
pub struct PrimitiveSerializer<P>(PhantomData<fn() -> P>);

/// Serializer writing `Vec<u8>` as a single bytes primitive instead of a
/// list of `u8` items.
pub type BytesSerializer = PrimitiveSerializer<Vec<u8>>;

impl<P> PrimitiveSerializer<P> {
    /// Creates the serializer.
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<P> Default for PrimitiveSerializer<P> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for PrimitiveSerializer<P> {
    #[inline]
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<P> Copy for PrimitiveSerializer<P> {}

impl<P: PrimitiveType> fmt::Debug for PrimitiveSerializer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrimitiveSerializer")
            .field(&P::descriptor().name())
            .finish()
    }
}

impl<P: PrimitiveType> Serializer<P> for PrimitiveSerializer<P> {
    #[inline]
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        P::descriptor()
    }

    #[inline]
    fn save(&self, encoder: &mut dyn Encoder, value: &P) -> Result<(), SerialError> {
        encoder.encode_primitive(value.as_primitive())
    }

    #[inline]
    fn load(&self, decoder: &mut dyn Decoder) -> Result<P, SerialError> {
        decode_primitive_as(decoder)
    }

    #[inline]
    fn update(&self, decoder: &mut dyn Decoder, _old: P) -> Result<P, SerialError> {
        decode_primitive_as(decoder)
    }
}
