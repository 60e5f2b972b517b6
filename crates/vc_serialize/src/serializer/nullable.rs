use alloc::format;
use alloc::sync::Arc;
use std::sync::OnceLock;

use crate::SerialError;
use crate::descriptor::TypeDescriptor;
use crate::protocol::{Decoder, Encoder};
use crate::serializer::{Serializer, SerializerRef};

/// Serializer of `Option<E>`.
///
/// Writes a presence marker, followed by the inner value when present.
///
/// Merge-decoding an explicit absent value yields `None`. A present value
/// is merged into an existing `Some` through the inner serializer and
/// loaded otherwise.
pub struct NullableSerializer<E> {
    inner: SerializerRef<E>,
    descriptor: OnceLock<Arc<TypeDescriptor>>,
}

impl<E> NullableSerializer<E> {
    /// Creates a nullable serializer around the inner serializer.
    #[inline]
    pub const fn new(inner: SerializerRef<E>) -> Self {
        Self {
            inner,
            descriptor: OnceLock::new(),
        }
    }
}

impl<E> Serializer<Option<E>> for NullableSerializer<E> {
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        self.descriptor.get_or_init(|| {
            let inner = self.inner.descriptor();
            Arc::new(TypeDescriptor::nullable(
                format!("core::option::Option<{}>", inner.name()),
                inner.clone(),
            ))
        })
    }

    fn save(&self, encoder: &mut dyn Encoder, value: &Option<E>) -> Result<(), SerialError> {
        encoder.encode_presence(value.is_some())?;
        match value {
            Some(inner) => self.inner.save(encoder, inner),
            None => Ok(()),
        }
    }

    fn load(&self, decoder: &mut dyn Decoder) -> Result<Option<E>, SerialError> {
        if decoder.decode_presence()? {
            self.inner.load(decoder).map(Some)
        } else {
            Ok(None)
        }
    }

    fn update(&self, decoder: &mut dyn Decoder, old: Option<E>) -> Result<Option<E>, SerialError> {
        if !decoder.decode_presence()? {
            return Ok(None);
        }
        match old {
            Some(old) => self.inner.update(decoder, old).map(Some),
            None => self.inner.load(decoder).map(Some),
        }
    }
}
