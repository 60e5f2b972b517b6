use alloc::boxed::Box;
use alloc::sync::Arc;

use crate::SerialError;
use crate::descriptor::TypeDescriptor;
use crate::protocol::{Decoder, Encoder};
use crate::serializer::{Serializer, SerializerRef};

/// Transparent serializer of `Box<E>`, sharing the inner descriptor.
pub struct BoxSerializer<E> {
    inner: SerializerRef<E>,
}

impl<E> BoxSerializer<E> {
    /// Creates a box serializer around the inner serializer.
    #[inline]
    pub const fn new(inner: SerializerRef<E>) -> Self {
        Self { inner }
    }
}

impl<E> Serializer<Box<E>> for BoxSerializer<E> {
    #[inline]
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        self.inner.descriptor()
    }

    #[inline]
    fn save(&self, encoder: &mut dyn Encoder, value: &Box<E>) -> Result<(), SerialError> {
        self.inner.save(encoder, value)
    }

    #[inline]
    fn load(&self, decoder: &mut dyn Decoder) -> Result<Box<E>, SerialError> {
        self.inner.load(decoder).map(Box::new)
    }

    #[inline]
    fn update(&self, decoder: &mut dyn Decoder, old: Box<E>) -> Result<Box<E>, SerialError> {
        self.inner.update(decoder, *old).map(Box::new)
    }
}
