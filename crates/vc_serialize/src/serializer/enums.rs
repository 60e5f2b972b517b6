use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;

use crate::SerialError;
use crate::descriptor::{TypeDescriptor, TypeKind};
use crate::protocol::{Decoder, Encoder};
use crate::serializer::Serializer;

/// Serializer of a C-like enum, mapping each variant to its element index.
///
/// # Panics
///
/// [`new`](Self::new) panics if the descriptor is not an enum descriptor
/// or lists a different number of variants.
///
/// # Examples
///
/// ```
/// use vc_serialize::descriptor::{TypeDescriptor, TypeKind};
/// use vc_serialize::serializer::UnitEnumSerializer;
///
/// #[derive(Clone, Copy, PartialEq, Debug)]
/// enum Color { Red, Green }
///
/// let serializer = UnitEnumSerializer::new(
///     TypeDescriptor::builder("demo::Color", TypeKind::Enum)
///         .variant("Red")
///         .variant("Green")
///         .build_arc(),
///     [Color::Red, Color::Green],
/// );
/// assert_eq!(serializer.variant_index(&Color::Green), Some(1));
/// ```
pub struct UnitEnumSerializer<T> {
    descriptor: Arc<TypeDescriptor>,
    variants: Box<[T]>,
}

impl<T: Copy + PartialEq> UnitEnumSerializer<T> {
    /// Creates the serializer, `variants[i]` being the value of element `i`.
    pub fn new(descriptor: Arc<TypeDescriptor>, variants: impl Into<Box<[T]>>) -> Self {
        let variants = variants.into();
        assert_eq!(
            descriptor.kind(),
            TypeKind::Enum,
            "`{}` is not an enum descriptor",
            descriptor.name()
        );
        assert_eq!(
            descriptor.element_len(),
            variants.len(),
            "`{}` lists a different number of variants",
            descriptor.name()
        );
        Self {
            descriptor,
            variants,
        }
    }

    /// Returns the element index of a variant.
    pub fn variant_index(&self, value: &T) -> Option<usize> {
        self.variants.iter().position(|v| v == value)
    }
}

impl<T: Copy + PartialEq + Send + Sync> Serializer<T> for UnitEnumSerializer<T> {
    #[inline]
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    fn save(&self, encoder: &mut dyn Encoder, value: &T) -> Result<(), SerialError> {
        let index = self.variant_index(value).ok_or_else(|| {
            SerialError::custom(format!("value is not a variant of `{}`", self.descriptor.name()))
        })?;
        encoder.encode_enum(&self.descriptor, index)
    }

    fn load(&self, decoder: &mut dyn Decoder) -> Result<T, SerialError> {
        let index = decoder.decode_enum(&self.descriptor)?;
        self.variants
            .get(index)
            .copied()
            .ok_or_else(|| SerialError::unknown_element(&self.descriptor, index))
    }

    #[inline]
    fn update(&self, decoder: &mut dyn Decoder, _old: T) -> Result<T, SerialError> {
        self.load(decoder)
    }
}
