//! Immutable structural metadata for serializable types.
//!
//! ## Menu
//!
//! - [`TypeDescriptor`]: name, [`TypeKind`] and the ordered [`ElementInfo`] list of a type.
//!     - Element indices are dense `0..n` in declaration order. This ordering is the
//!       contract between encoding and decoding.
//!     - For generic types the elements describe the *shape*. The concrete element
//!       descriptors come from the child serializers the composite was built from.
//! - [`DescriptorBuilder`]: builds class and enum descriptors, assigning indices.
//! - [`ElementInfo`]: one element (field, variant, item slot) of a descriptor.
//! - [`TypeKind`] / [`PrimitiveKind`]: the structural kind of a type.
//! - [`DescriptorCell`]: a static cell creating a descriptor once per process.
//!
//! Descriptors are shared through [`Arc`](alloc::sync::Arc) and never mutated.

// -----------------------------------------------------------------------------
// Modules

mod cell;
mod element;
mod kind;
mod type_descriptor;

// -----------------------------------------------------------------------------
// Exports

pub use cell::DescriptorCell;
pub use element::ElementInfo;
pub use kind::{PrimitiveKind, TypeKind};
pub use type_descriptor::{DescriptorBuilder, TypeDescriptor};
