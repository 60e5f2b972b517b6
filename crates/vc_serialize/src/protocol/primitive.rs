use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::descriptor::{DescriptorCell, PrimitiveKind, TypeDescriptor};

// -----------------------------------------------------------------------------
// PrimitiveRef

/// A borrowed primitive, handed to [`Encoder::encode_primitive`].
///
/// [`Encoder::encode_primitive`]: crate::protocol::Encoder::encode_primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimitiveRef<'a> {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    Str(&'a str),
    Bytes(&'a [u8]),
}

// -----------------------------------------------------------------------------
// PrimitiveValue

/// An owned primitive, returned by [`Decoder::decode_primitive`].
///
/// [`Decoder::decode_primitive`]: crate::protocol::Decoder::decode_primitive
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    Str(String),
    Bytes(Vec<u8>),
}

macro_rules! impl_primitive_conversions {
    ($($variant:ident),*) => {
        impl PrimitiveRef<'_> {
            /// Returns the kind of this primitive.
            pub const fn kind(&self) -> PrimitiveKind {
                match self {
                    $(Self::$variant(_) => PrimitiveKind::$variant,)*
                    Self::Str(_) => PrimitiveKind::Str,
                    Self::Bytes(_) => PrimitiveKind::Bytes,
                }
            }

            /// Copies the primitive into a [`PrimitiveValue`].
            pub fn to_value(&self) -> PrimitiveValue {
                match *self {
                    $(Self::$variant(v) => PrimitiveValue::$variant(v),)*
                    Self::Str(v) => PrimitiveValue::Str(String::from(v)),
                    Self::Bytes(v) => PrimitiveValue::Bytes(Vec::from(v)),
                }
            }
        }

        impl PrimitiveValue {
            /// Returns the kind of this primitive.
            pub const fn kind(&self) -> PrimitiveKind {
                match self {
                    $(Self::$variant(_) => PrimitiveKind::$variant,)*
                    Self::Str(_) => PrimitiveKind::Str,
                    Self::Bytes(_) => PrimitiveKind::Bytes,
                }
            }

            /// Borrows the primitive as a [`PrimitiveRef`].
            pub fn as_primitive(&self) -> PrimitiveRef<'_> {
                match self {
                    $(Self::$variant(v) => PrimitiveRef::$variant(*v),)*
                    Self::Str(v) => PrimitiveRef::Str(v),
                    Self::Bytes(v) => PrimitiveRef::Bytes(v),
                }
            }
        }
    };
}

impl_primitive_conversions!(Bool, I8, I16, I32, I64, U8, U16, U32, U64, F32, F64, Char);

impl<'a> From<PrimitiveRef<'a>> for PrimitiveValue {
    #[inline]
    fn from(value: PrimitiveRef<'a>) -> Self {
        value.to_value()
    }
}

// -----------------------------------------------------------------------------
// PrimitiveType

/// A Rust type that maps one-to-one onto a [`PrimitiveKind`].
///
/// Implemented for `bool`, the fixed-size integers, `f32`, `f64`, `char`,
/// [`String`] and `Vec<u8>` (as bytes).
pub trait PrimitiveType: Sized + Send + Sync + 'static {
    /// The kind written on the wire.
    const KIND: PrimitiveKind;

    /// The descriptor shared by every serializer of this type.
    fn descriptor() -> &'static Arc<TypeDescriptor>;

    /// Borrows the value as a primitive.
    fn as_primitive(&self) -> PrimitiveRef<'_>;

    /// Converts a decoded primitive back, returning it unchanged on a kind mismatch.
    fn from_primitive(value: PrimitiveValue) -> Result<Self, PrimitiveValue>;
}

macro_rules! impl_primitive_type {
    ($ty:ty, $variant:ident, $name:literal, |$v:ident| $as:expr) => {
        impl PrimitiveType for $ty {
            const KIND: PrimitiveKind = PrimitiveKind::$variant;

            fn descriptor() -> &'static Arc<TypeDescriptor> {
                static CELL: DescriptorCell = DescriptorCell::new();
                CELL.get_or_init(|| {
                    Arc::new(TypeDescriptor::primitive($name, PrimitiveKind::$variant))
                })
            }

            #[inline]
            fn as_primitive(&self) -> PrimitiveRef<'_> {
                let $v = self;
                $as
            }

            #[inline]
            fn from_primitive(value: PrimitiveValue) -> Result<Self, PrimitiveValue> {
                match value {
                    PrimitiveValue::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }
        }
    };
}

impl_primitive_type!(bool, Bool, "bool", |v| PrimitiveRef::Bool(*v));
impl_primitive_type!(i8, I8, "i8", |v| PrimitiveRef::I8(*v));
impl_primitive_type!(i16, I16, "i16", |v| PrimitiveRef::I16(*v));
impl_primitive_type!(i32, I32, "i32", |v| PrimitiveRef::I32(*v));
impl_primitive_type!(i64, I64, "i64", |v| PrimitiveRef::I64(*v));
impl_primitive_type!(u8, U8, "u8", |v| PrimitiveRef::U8(*v));
impl_primitive_type!(u16, U16, "u16", |v| PrimitiveRef::U16(*v));
impl_primitive_type!(u32, U32, "u32", |v| PrimitiveRef::U32(*v));
impl_primitive_type!(u64, U64, "u64", |v| PrimitiveRef::U64(*v));
impl_primitive_type!(f32, F32, "f32", |v| PrimitiveRef::F32(*v));
impl_primitive_type!(f64, F64, "f64", |v| PrimitiveRef::F64(*v));
impl_primitive_type!(char, Char, "char", |v| PrimitiveRef::Char(*v));
impl_primitive_type!(String, Str, "alloc::string::String", |v| PrimitiveRef::Str(v));
impl_primitive_type!(Vec<u8>, Bytes, "bytes", |v| PrimitiveRef::Bytes(v));

// -----------------------------------------------------------------------------
// Tests
