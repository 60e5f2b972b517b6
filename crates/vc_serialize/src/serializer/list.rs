use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::OnceLock;

use crate::SerialError;
use crate::descriptor::TypeDescriptor;
use crate::protocol::{Decoder, Encoder, StructureDecoder, decode_structure, encode_collection};
use crate::serializer::{Serializer, SerializerRef};

/// Serializer of `Vec<E>`, built from the item serializer.
///
/// The descriptor is named `alloc::vec::Vec<{item}>` and created on first
/// use, so the item serializer may be a [`LazySerializer`] of a type that
/// contains this list.
///
/// Merge-decoding appends the decoded items to the existing list.
///
/// [`LazySerializer`]: crate::serializer::LazySerializer
pub struct ListSerializer<E> {
    item: SerializerRef<E>,
    descriptor: OnceLock<Arc<TypeDescriptor>>,
}

impl<E> ListSerializer<E> {
    /// Creates a list serializer from the item serializer.
    #[inline]
    pub const fn new(item: SerializerRef<E>) -> Self {
        Self {
            item,
            descriptor: OnceLock::new(),
        }
    }

    /// The item serializer.
    #[inline]
    pub fn item(&self) -> &SerializerRef<E> {
        &self.item
    }

    fn read_items(&self, s: &mut StructureDecoder<'_>, out: &mut Vec<E>) -> Result<(), SerialError> {
        if s.sequential()
            && let Some(len) = s.collection_size()?
        {
            out.reserve(len);
            for index in 0..len {
                out.push(s.read_element(index, &*self.item)?);
            }
        } else {
            while let Some(index) = s.next_index()? {
                out.push(s.read_element(index, &*self.item)?);
            }
        }
        Ok(())
    }
}

impl<E> Serializer<Vec<E>> for ListSerializer<E> {
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        self.descriptor.get_or_init(|| {
            let item = self.item.descriptor();
            Arc::new(TypeDescriptor::list(
                format!("alloc::vec::Vec<{}>", item.name()),
                item.clone(),
            ))
        })
    }

    fn save(&self, encoder: &mut dyn Encoder, value: &Vec<E>) -> Result<(), SerialError> {
        encode_collection(encoder, self.descriptor(), value.len(), |s| {
            for (index, item) in value.iter().enumerate() {
                s.write_element(index, &*self.item, item)?;
            }
            Ok(())
        })
    }

    fn load(&self, decoder: &mut dyn Decoder) -> Result<Vec<E>, SerialError> {
        decode_structure(decoder, self.descriptor(), |s| {
            let mut out = Vec::new();
            self.read_items(s, &mut out)?;
            Ok(out)
        })
    }

    fn update(&self, decoder: &mut dyn Decoder, mut old: Vec<E>) -> Result<Vec<E>, SerialError> {
        decode_structure(decoder, self.descriptor(), |s| {
            self.read_items(s, &mut old)?;
            Ok(old)
        })
    }
}
