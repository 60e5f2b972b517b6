use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use core::any::{Any, TypeId, type_name};

use crate::SerialError;
use crate::descriptor::TypeDescriptor;
use crate::protocol::{Decoder, Encoder};
use crate::serializer::SerializerRef;

// -----------------------------------------------------------------------------
// ErasedSerializer

/// A [`SerializerRef<T>`] with `T` erased, so bindings of different types
/// share one table.
pub(crate) trait ErasedSerializer: Send + Sync {
    fn type_name(&self) -> &'static str;

    /// The `TypeId` of the bound type, not of the serializer.
    fn value_type_id(&self) -> TypeId;

    fn descriptor(&self) -> &Arc<TypeDescriptor>;

    fn save_any(&self, encoder: &mut dyn Encoder, value: &dyn Any) -> Result<(), SerialError>;

    fn load_any(
        &self,
        decoder: &mut dyn Decoder,
    ) -> Result<Box<dyn Any + Send + Sync>, SerialError>;

    /// Returns the wrapped `SerializerRef<T>`.
    fn as_any(&self) -> &dyn Any;

    fn clone_box(&self) -> Box<dyn ErasedSerializer>;
}

struct TypedBinding<T: 'static> {
    serializer: SerializerRef<T>,
}

impl<T: Send + Sync + 'static> ErasedSerializer for TypedBinding<T> {
    #[inline]
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    #[inline]
    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    #[inline]
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        self.serializer.descriptor()
    }

    fn save_any(&self, encoder: &mut dyn Encoder, value: &dyn Any) -> Result<(), SerialError> {
        match value.downcast_ref::<T>() {
            Some(value) => self.serializer.save(encoder, value),
            None => Err(SerialError::custom(format!(
                "value passed to the binding of `{}` has a different type",
                type_name::<T>()
            ))),
        }
    }

    fn load_any(
        &self,
        decoder: &mut dyn Decoder,
    ) -> Result<Box<dyn Any + Send + Sync>, SerialError> {
        let value = self.serializer.load(decoder)?;
        Ok(Box::new(value))
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        &self.serializer
    }

    fn clone_box(&self) -> Box<dyn ErasedSerializer> {
        Box::new(TypedBinding {
            serializer: self.serializer.clone(),
        })
    }
}

// -----------------------------------------------------------------------------
// Binding

/// One registry entry: a serializer and the serial name it is known by.
pub(crate) struct Binding {
    name: Cow<'static, str>,
    serializer: Box<dyn ErasedSerializer>,
}

impl Binding {
    pub(crate) fn new<T: Send + Sync + 'static>(
        name: Cow<'static, str>,
        serializer: SerializerRef<T>,
    ) -> Self {
        Self {
            name,
            serializer: Box::new(TypedBinding { serializer }),
        }
    }

    #[inline]
    pub(crate) fn name(&self) -> &Cow<'static, str> {
        &self.name
    }

    #[inline]
    pub(crate) fn value_type_id(&self) -> TypeId {
        self.serializer.value_type_id()
    }

    #[inline]
    pub(crate) fn erased(&self) -> &dyn ErasedSerializer {
        &*self.serializer
    }

    #[inline]
    pub(crate) fn typed<T: 'static>(&self) -> Option<SerializerRef<T>> {
        self.serializer
            .as_any()
            .downcast_ref::<SerializerRef<T>>()
            .cloned()
    }
}

impl Clone for Binding {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            serializer: self.serializer.clone_box(),
        }
    }
}
