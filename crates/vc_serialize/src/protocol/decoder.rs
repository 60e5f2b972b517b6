use alloc::sync::Arc;

use crate::SerialError;
use crate::descriptor::{PrimitiveKind, TypeDescriptor};
use crate::protocol::{PrimitiveType, PrimitiveValue, trace};
use crate::registry::SerialRegistry;
use crate::serializer::{PrimitiveSerializer, Serializer};

// -----------------------------------------------------------------------------
// Decoder

/// The reading half of the protocol, implemented by format adapters.
///
/// Inside a structure scope a decoder either yields element indices in wire
/// order through [`decode_element_index`](Decoder::decode_element_index), or
/// reports [`decode_sequentially`](Decoder::decode_sequentially) and expects
/// the elements to be read in index order without asking.
/// Before an element value is read, [`decode_element`](Decoder::decode_element)
/// positions the decoder on it.
pub trait Decoder {
    /// The registry serializers may consult at runtime.
    fn registry(&self) -> &Arc<SerialRegistry>;

    /// Reads a primitive of the requested kind.
    fn decode_primitive(&mut self, kind: PrimitiveKind) -> Result<PrimitiveValue, SerialError>;

    /// Reads the nullable marker, `false` means the value is absent.
    fn decode_presence(&mut self) -> Result<bool, SerialError>;

    /// Reads the variant index of a unit enum.
    fn decode_enum(&mut self, descriptor: &TypeDescriptor) -> Result<usize, SerialError>;

    /// Opens the scope of a structure, list or map.
    fn begin_structure(&mut self, descriptor: &TypeDescriptor) -> Result<(), SerialError>;

    /// Returns the index of the next element on the wire, `None` once the
    /// scope is exhausted.
    fn decode_element_index(
        &mut self,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<usize>, SerialError>;

    /// Positions the decoder on the element at `index`.
    fn decode_element(&mut self, descriptor: &TypeDescriptor, index: usize)
    -> Result<(), SerialError>;

    /// Returns the number of items or entries of the open collection, if
    /// the format knows it up front.
    #[inline]
    fn decode_collection_size(
        &mut self,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<usize>, SerialError> {
        let _ = descriptor;
        Ok(None)
    }

    /// Returns `true` if elements are stored in index order and may be
    /// read without [`decode_element_index`](Decoder::decode_element_index).
    #[inline]
    fn decode_sequentially(&self) -> bool {
        false
    }

    /// Closes the innermost scope.
    fn end_structure(&mut self, descriptor: &TypeDescriptor) -> Result<(), SerialError>;
}

/// Reads a primitive of type `P`.
pub(crate) fn decode_primitive_as<P: PrimitiveType>(
    decoder: &mut dyn Decoder,
) -> Result<P, SerialError> {
    let value = decoder.decode_primitive(P::KIND)?;
    P::from_primitive(value).map_err(|found| SerialError::PrimitiveMismatch {
        expected: P::KIND,
        found: found.kind(),
    })
}

// -----------------------------------------------------------------------------
// StructureDecoder

/// Handle over an open structure scope, see [`decode_structure`].
pub struct StructureDecoder<'a> {
    decoder: &'a mut dyn Decoder,
    descriptor: &'a TypeDescriptor,
}

impl StructureDecoder<'_> {
    /// The descriptor of the structure being read.
    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        self.descriptor
    }

    /// The registry of the underlying decoder.
    #[inline]
    pub fn registry(&self) -> &Arc<SerialRegistry> {
        self.decoder.registry()
    }

    /// See [`Decoder::decode_sequentially`].
    #[inline]
    pub fn sequential(&self) -> bool {
        self.decoder.decode_sequentially()
    }

    /// See [`Decoder::decode_collection_size`].
    #[inline]
    pub fn collection_size(&mut self) -> Result<Option<usize>, SerialError> {
        self.decoder.decode_collection_size(self.descriptor)
    }

    /// Returns the index of the next element on the wire.
    ///
    /// For classes and enums the index is checked against the descriptor.
    pub fn next_index(&mut self) -> Result<Option<usize>, SerialError> {
        let index = self.decoder.decode_element_index(self.descriptor)?;
        if let Some(index) = index
            && !self.descriptor.kind().is_collection()
            && index >= self.descriptor.element_len()
        {
            return Err(self.unknown_element(index));
        }
        Ok(index)
    }

    /// Visits every element of a class in the order the decoder provides.
    ///
    /// Sequential decoders visit `0..element_len()`, the others visit the
    /// indices yielded by [`next_index`](Self::next_index).
    pub fn for_each_index(
        &mut self,
        mut f: impl FnMut(&mut Self, usize) -> Result<(), SerialError>,
    ) -> Result<(), SerialError> {
        if self.sequential() {
            for index in 0..self.descriptor.element_len() {
                f(self, index)?;
            }
        } else {
            while let Some(index) = self.next_index()? {
                f(self, index)?;
            }
        }
        Ok(())
    }

    /// Reads the element at `index` with the given serializer.
    pub fn read_element<E>(
        &mut self,
        index: usize,
        serializer: &dyn Serializer<E>,
    ) -> Result<E, SerialError> {
        self.decoder.decode_element(self.descriptor, index)?;
        serializer.load(self.decoder)
    }

    /// Reads the element at `index` into an existing value.
    pub fn update_element<E>(
        &mut self,
        index: usize,
        serializer: &dyn Serializer<E>,
        old: E,
    ) -> Result<E, SerialError> {
        self.decoder.decode_element(self.descriptor, index)?;
        serializer.update(self.decoder, old)
    }

    /// Reads a primitive element.
    #[inline]
    pub fn read_primitive<P: PrimitiveType>(&mut self, index: usize) -> Result<P, SerialError> {
        self.read_element(index, &PrimitiveSerializer::<P>::new())
    }

    /// Reads the element at `index` by handing the raw decoder to `f`.
    pub fn read_with<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut dyn Decoder) -> Result<R, SerialError>,
    ) -> Result<R, SerialError> {
        self.decoder.decode_element(self.descriptor, index)?;
        f(&mut *self.decoder)
    }

    /// Creates the error for a required element that never appeared.
    #[inline]
    pub fn missing_element(&self, index: usize) -> SerialError {
        SerialError::missing_element(self.descriptor, index)
    }

    /// Creates the error for an index the structure does not know.
    #[inline]
    pub fn unknown_element(&self, index: usize) -> SerialError {
        SerialError::unknown_element(self.descriptor, index)
    }
}

// -----------------------------------------------------------------------------
// Scoped helpers

/// Reads a structure: opens the scope, runs `f`, then always closes it.
///
/// If both `f` and `end_structure` fail, the error of `f` is returned.
/// See [`encode_structure`](crate::protocol::encode_structure) for an example.
pub fn decode_structure<R>(
    decoder: &mut dyn Decoder,
    descriptor: &TypeDescriptor,
    f: impl FnOnce(&mut StructureDecoder<'_>) -> Result<R, SerialError>,
) -> Result<R, SerialError> {
    trace::push(descriptor.name());
    let result = match decoder.begin_structure(descriptor) {
        Ok(()) => {
            let body = f(&mut StructureDecoder {
                decoder: &mut *decoder,
                descriptor,
            });
            let end = decoder.end_structure(descriptor);
            match (body, end) {
                (Ok(value), Ok(())) => Ok(value),
                (Err(e), _) | (Ok(_), Err(e)) => Err(e),
            }
        }
        Err(e) => Err(e),
    };
    trace::pop();
    result
}

// -----------------------------------------------------------------------------
// Tests
