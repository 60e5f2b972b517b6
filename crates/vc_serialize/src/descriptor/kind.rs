use core::fmt;

// -----------------------------------------------------------------------------
// PrimitiveKind

/// The primitive values an encoder writes directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    Str,
    Bytes,
}

impl PrimitiveKind {
    /// Returns `true` for the signed and unsigned integer kinds.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::U8 | Self::U16 | Self::U32 | Self::U64
        )
    }

    /// The lowercase name of the kind, `str` and `bytes` for the unsized ones.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
            Self::Str => "str",
            Self::Bytes => "bytes",
        }
    }

    /// Returns `true` for `F32` and `F64`.
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

// -----------------------------------------------------------------------------
// TypeKind

/// The structural kind of a described type.
///
/// - `Primitive`: written with a single primitive operation, no elements.
/// - `Class`: a fixed list of named elements, decoded by index in any order.
/// - `List`: a sized sequence, one `item` element describes the item shape.
/// - `Map`: a sized sequence of entries, `key` and `value` elements describe the shape.
/// - `Enum`: one element per unit variant, written as a variant index.
/// - `Nullable`: exactly one element, preceded by a presence marker on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    Class,
    List,
    Map,
    Enum,
    Nullable,
}

impl TypeKind {
    /// Returns `true` for `List` and `Map`, whose element count is only
    /// known per value.
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::List | Self::Map)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "Primitive({kind})"),
            Self::Class => f.pad("Class"),
            Self::List => f.pad("List"),
            Self::Map => f.pad("Map"),
            Self::Enum => f.pad("Enum"),
            Self::Nullable => f.pad("Nullable"),
        }
    }
}
