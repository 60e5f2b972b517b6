use alloc::sync::Arc;

use crate::SerialError;
use crate::descriptor::TypeDescriptor;
use crate::protocol::{PrimitiveRef, PrimitiveType, trace};
use crate::registry::SerialRegistry;
use crate::serializer::{PrimitiveSerializer, Serializer};

// -----------------------------------------------------------------------------
// Encoder

/// The writing half of the protocol, implemented by format adapters.
///
/// The trait is object safe, serializers receive `&mut dyn Encoder`.
/// Structure scopes must not be opened by hand: use [`encode_structure`]
/// or [`encode_collection`], which guarantee the matching `end_structure`.
pub trait Encoder {
    /// The registry serializers may consult at runtime, for example to
    /// find the binding of a polymorphic value.
    fn registry(&self) -> &Arc<SerialRegistry>;

    /// Writes a primitive value.
    fn encode_primitive(&mut self, value: PrimitiveRef<'_>) -> Result<(), SerialError>;

    /// Writes the marker preceding a nullable value.
    ///
    /// `false` stands for the absent value and nothing follows it.
    /// `true` is followed by the wrapped value.
    fn encode_presence(&mut self, present: bool) -> Result<(), SerialError>;

    /// Writes the variant with the given index of a unit enum.
    fn encode_enum(&mut self, descriptor: &TypeDescriptor, variant: usize)
    -> Result<(), SerialError>;

    /// Opens the scope of a class or other fixed-shape structure.
    fn begin_structure(&mut self, descriptor: &TypeDescriptor) -> Result<(), SerialError>;

    /// Opens the scope of a list or map holding `len` items or entries.
    #[inline]
    fn begin_collection(
        &mut self,
        descriptor: &TypeDescriptor,
        len: usize,
    ) -> Result<(), SerialError> {
        let _ = len;
        self.begin_structure(descriptor)
    }

    /// Writes the header of the element at `index`.
    ///
    /// The element value follows immediately.
    fn encode_element(&mut self, descriptor: &TypeDescriptor, index: usize)
    -> Result<(), SerialError>;

    /// Closes the innermost scope.
    fn end_structure(&mut self, descriptor: &TypeDescriptor) -> Result<(), SerialError>;
}

// -----------------------------------------------------------------------------
// StructureEncoder

/// Handle over an open structure scope, see [`encode_structure`].
pub struct StructureEncoder<'a> {
    encoder: &'a mut dyn Encoder,
    descriptor: &'a TypeDescriptor,
}

impl StructureEncoder<'_> {
    /// The descriptor of the structure being written.
    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        self.descriptor
    }

    /// The registry of the underlying encoder.
    #[inline]
    pub fn registry(&self) -> &Arc<SerialRegistry> {
        self.encoder.registry()
    }

    /// Writes the element at `index` with the given serializer.
    pub fn write_element<E>(
        &mut self,
        index: usize,
        serializer: &dyn Serializer<E>,
        value: &E,
    ) -> Result<(), SerialError> {
        self.encoder.encode_element(self.descriptor, index)?;
        serializer.save(self.encoder, value)
    }

    /// Writes a primitive element.
    #[inline]
    pub fn write_primitive<P: PrimitiveType>(
        &mut self,
        index: usize,
        value: &P,
    ) -> Result<(), SerialError> {
        self.write_element(index, &PrimitiveSerializer::<P>::new(), value)
    }

    /// Writes the element at `index` by handing the raw encoder to `f`.
    pub fn write_with(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut dyn Encoder) -> Result<(), SerialError>,
    ) -> Result<(), SerialError> {
        self.encoder.encode_element(self.descriptor, index)?;
        f(&mut *self.encoder)
    }
}

// -----------------------------------------------------------------------------
// Scoped helpers

/// Writes a structure: opens the scope, runs `f`, then always closes it.
///
/// If both `f` and `end_structure` fail, the error of `f` is returned.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_serialize::SerialError;
/// use vc_serialize::descriptor::{DescriptorCell, TypeDescriptor, TypeKind};
/// use vc_serialize::protocol::{Decoder, Encoder, PrimitiveType, decode_structure, encode_structure};
/// use vc_serialize::Serializer;
///
/// struct Point { x: i32, y: i32 }
///
/// struct PointSerializer;
///
/// impl Serializer<Point> for PointSerializer {
///     fn descriptor(&self) -> &Arc<TypeDescriptor> {
///         static CELL: DescriptorCell = DescriptorCell::new();
///         CELL.get_or_init(|| {
///             TypeDescriptor::builder("demo::Point", TypeKind::Class)
///                 .element("x", i32::descriptor().clone())
///                 .element("y", i32::descriptor().clone())
///                 .build_arc()
///         })
///     }
///
///     fn save(&self, encoder: &mut dyn Encoder, value: &Point) -> Result<(), SerialError> {
///         encode_structure(encoder, self.descriptor(), |s| {
///             s.write_primitive(0, &value.x)?;
///             s.write_primitive(1, &value.y)
///         })
///     }
///
///     fn load(&self, decoder: &mut dyn Decoder) -> Result<Point, SerialError> {
///         decode_structure(decoder, self.descriptor(), |s| {
///             let (mut x, mut y) = (None, None);
///             s.for_each_index(|s, index| {
///                 match index {
///                     0 => x = Some(s.read_primitive(0)?),
///                     1 => y = Some(s.read_primitive(1)?),
///                     _ => return Err(s.unknown_element(index)),
///                 }
///                 Ok(())
///             })?;
///             Ok(Point {
///                 x: x.ok_or_else(|| s.missing_element(0))?,
///                 y: y.ok_or_else(|| s.missing_element(1))?,
///             })
///         })
///     }
/// }
/// ```
pub fn encode_structure(
    encoder: &mut dyn Encoder,
    descriptor: &TypeDescriptor,
    f: impl FnOnce(&mut StructureEncoder<'_>) -> Result<(), SerialError>,
) -> Result<(), SerialError> {
    trace::push(descriptor.name());
    let result = match encoder.begin_structure(descriptor) {
        Ok(()) => run_scope(encoder, descriptor, f),
        Err(e) => Err(e),
    };
    trace::pop();
    result
}

/// Writes a list or map of `len` items or entries, see [`encode_structure`].
pub fn encode_collection(
    encoder: &mut dyn Encoder,
    descriptor: &TypeDescriptor,
    len: usize,
    f: impl FnOnce(&mut StructureEncoder<'_>) -> Result<(), SerialError>,
) -> Result<(), SerialError> {
    trace::push(descriptor.name());
    let result = match encoder.begin_collection(descriptor, len) {
        Ok(()) => run_scope(encoder, descriptor, f),
        Err(e) => Err(e),
    };
    trace::pop();
    result
}

fn run_scope(
    encoder: &mut dyn Encoder,
    descriptor: &TypeDescriptor,
    f: impl FnOnce(&mut StructureEncoder<'_>) -> Result<(), SerialError>,
) -> Result<(), SerialError> {
    let body = f(&mut StructureEncoder {
        encoder: &mut *encoder,
        descriptor,
    });
    let end = encoder.end_structure(descriptor);
    body.and(end)
}

// -----------------------------------------------------------------------------
// Tests
