use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::{Any, TypeId, type_name};
use core::fmt;

use crate::descriptor::{DescriptorCell, TypeDescriptor, TypeKind};
use crate::protocol::{Decoder, Encoder, PrimitiveRef, PrimitiveType};
use crate::protocol::{decode_primitive_as, decode_structure, encode_structure};
use crate::serializer::Serializer;
use crate::{ResolveError, SerialError};

// -----------------------------------------------------------------------------
// DynValue

/// A value whose concrete type is only known at runtime.
///
/// Serialized by [`PolymorphicSerializer`], which identifies the concrete
/// type through the serial names of the registry.
pub struct DynValue {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl DynValue {
    /// Wraps a concrete value.
    #[inline]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_box(Box::new(value))
    }

    /// Wraps an already boxed value.
    #[inline]
    pub fn from_box<T: Any + Send + Sync>(value: Box<T>) -> Self {
        Self {
            value,
            type_name: type_name::<T>(),
        }
    }

    /// Returns the type name of the concrete value.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the [`TypeId`] of the concrete value.
    #[inline]
    pub fn value_type_id(&self) -> TypeId {
        (*self.value).type_id()
    }

    /// Returns `true` if the concrete value is a `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrows the concrete value as `T`.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Unwraps the concrete value, returning `self` on a type mismatch.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self {
                value,
                type_name: self.type_name,
            }),
        }
    }

    /// Borrows the boxed value.
    #[inline]
    pub fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.value
    }
}

impl fmt::Debug for DynValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DynValue").field(&self.type_name).finish()
    }
}

// -----------------------------------------------------------------------------
// PolymorphicSerializer

/// Serializer of [`DynValue`], selecting the concrete serializer at runtime.
///
/// Saving looks up the binding of the concrete type in the encoder's
/// registry and writes a two-element structure: the serial name (`type`)
/// followed by the concrete value (`value`). Loading reads the name first,
/// finds the binding by name and loads the value with it.
///
/// # Errors
///
/// - An unbound concrete type fails with [`ResolveError::NotFound`].
/// - A serial name that would load as another type, for example because a
///   parent attached later binds it differently, fails with
///   [`SerialError::AmbiguousSerialName`] before anything is written.
/// - An unknown serial name fails with [`SerialError::UnknownSerialName`].
/// - A `value` element before the `type` element is rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct PolymorphicSerializer;

impl PolymorphicSerializer {
    /// Element index of the serial name.
    pub const TYPE_INDEX: usize = 0;
    /// Element index of the concrete value.
    pub const VALUE_INDEX: usize = 1;

    /// Returns `true` if `descriptor` is the descriptor of this serializer.
    ///
    /// Formats use it to give the serial name element a custom key.
    pub fn is_polymorphic(descriptor: &TypeDescriptor) -> bool {
        core::ptr::eq(descriptor, &**Self.descriptor())
    }
}

impl Serializer<DynValue> for PolymorphicSerializer {
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        static CELL: DescriptorCell = DescriptorCell::new();
        CELL.get_or_init(|| {
            let any = TypeDescriptor::builder("dyn core::any::Any", TypeKind::Class).build_arc();
            TypeDescriptor::builder("vc_serialize::serializer::DynValue", TypeKind::Class)
                .element("type", String::descriptor().clone())
                .element("value", any)
                .build_arc()
        })
    }

    fn save(&self, encoder: &mut dyn Encoder, value: &DynValue) -> Result<(), SerialError> {
        let registry = encoder.registry().clone();
        let type_id = value.value_type_id();
        let binding = registry.binding(type_id).ok_or(ResolveError::NotFound {
            type_name: value.type_name(),
        })?;
        if registry
            .binding_by_name(binding.name())
            .is_none_or(|owner| owner.value_type_id() != type_id)
        {
            return Err(SerialError::AmbiguousSerialName {
                name: String::from(&**binding.name()),
                type_name: value.type_name(),
            });
        }

        encode_structure(encoder, self.descriptor(), |s| {
            s.write_with(Self::TYPE_INDEX, |e| {
                e.encode_primitive(PrimitiveRef::Str(binding.name()))
            })?;
            s.write_with(Self::VALUE_INDEX, |e| {
                binding.erased().save_any(e, value.as_any())
            })
        })
    }

    fn load(&self, decoder: &mut dyn Decoder) -> Result<DynValue, SerialError> {
        let registry = decoder.registry().clone();

        decode_structure(decoder, self.descriptor(), |s| {
            let mut name: Option<String> = None;
            let mut value: Option<DynValue> = None;

            s.for_each_index(|s, index| {
                match index {
                    Self::TYPE_INDEX => {
                        name = Some(s.read_with(index, decode_primitive_as::<String>)?);
                    }
                    Self::VALUE_INDEX => {
                        let Some(name) = &name else {
                            return Err(SerialError::custom(format!(
                                "`type` must precede `value` in `{}`",
                                s.descriptor().name()
                            )));
                        };
                        let binding = registry
                            .binding_by_name(name)
                            .ok_or_else(|| SerialError::UnknownSerialName(name.clone()))?;
                        let loaded = s.read_with(index, |d| binding.erased().load_any(d))?;
                        value = Some(DynValue {
                            value: loaded,
                            type_name: binding.erased().type_name(),
                        });
                    }
                    _ => return Err(s.unknown_element(index)),
                }
                Ok(())
            })?;

            value.ok_or_else(|| s.missing_element(Self::VALUE_INDEX))
        })
    }
}
