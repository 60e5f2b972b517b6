//! Hierarchical runtime mapping from types to serializers.
//!
//! ## Menu
//!
//! - [`SerialRegistry`]: the bindings of one context, plus an optional parent.
//!     - Lookup checks the own bindings first, then walks the parent chain.
//!       A child binding shadows the parent's binding of the same type.
//!     - Every binding also has a serial name, used by the polymorphic
//!       serializer to identify concrete types on the wire.
//! - [`RegistryId`]: creation order of registries. A parent must be older
//!   than its child, which keeps every chain acyclic.
//! - [`SerialRegistryArc`]: a shared registry behind a lock, for callers
//!   that register after the registry was handed out.
//!
//! ## auto_register
//!
//! See [`SerialRegistry::auto_register`] and the [`auto_register!`] macro.
//!
//! We use the [`inventory`] crate to implement static registration. Not all
//! platforms support it (although major platforms do). If it is not
//! supported, `auto_register` returns `false` without causing any errors.
//!
//! [`auto_register!`]: crate::auto_register
//! [`inventory`]: https://docs.rs/inventory

// -----------------------------------------------------------------------------
// Modules

mod binding;
mod registry_arc;
mod serial_registry;

// -----------------------------------------------------------------------------
// Exports

pub(crate) use binding::Binding;

pub use registry_arc::SerialRegistryArc;
pub use serial_registry::{RegistryId, SerialRegistry};
