//! The format-neutral encoding protocol.
//!
//! A serializer never sees the wire format. It talks to an [`Encoder`] or a
//! [`Decoder`], one call per concern:
//!
//! - primitives: [`Encoder::encode_primitive`] / [`Decoder::decode_primitive`]
//! - nullable markers: [`Encoder::encode_presence`] / [`Decoder::decode_presence`]
//! - unit enums: [`Encoder::encode_enum`] / [`Decoder::decode_enum`]
//! - structures: a begin/end scope around indexed elements
//!
//! Structure scopes are only opened through [`encode_structure`],
//! [`encode_collection`] and [`decode_structure`]. Those helpers close the
//! scope with `end_structure` on every exit path, also after an element
//! failed, and report the first error.
//!
//! ## Element indices
//!
//! - `Class`: the index of the element in the descriptor.
//! - `List`: the item position.
//! - `Map`: entry `i` is written as key `2 * i` followed by value `2 * i + 1`.
//!   The collection size counts entries.
//!
//! Writing or reading the same element twice in one scope is not supported.

// -----------------------------------------------------------------------------
// Modules

mod decoder;
mod encoder;
mod primitive;

pub(crate) mod trace;

// -----------------------------------------------------------------------------
// Exports

pub use decoder::{Decoder, StructureDecoder, decode_structure};
pub use encoder::{Encoder, StructureEncoder, encode_collection, encode_structure};
pub use primitive::{PrimitiveRef, PrimitiveType, PrimitiveValue};
pub use trace::descriptor_trace;

pub(crate) use decoder::decode_primitive_as;
