use alloc::sync::Arc;
use std::sync::OnceLock;

use crate::descriptor::TypeDescriptor;

/// Container for static storage of a non-generic descriptor.
///
/// Internally an [`OnceLock`], the descriptor is built by the first
/// caller and shared by all later ones.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_serialize::descriptor::{DescriptorCell, PrimitiveKind, TypeDescriptor, TypeKind};
///
/// fn point_descriptor() -> &'static Arc<TypeDescriptor> {
///     static CELL: DescriptorCell = DescriptorCell::new();
///     CELL.get_or_init(|| {
///         let int = Arc::new(TypeDescriptor::primitive("i32", PrimitiveKind::I32));
///         TypeDescriptor::builder("demo::Point", TypeKind::Class)
///             .element("x", int.clone())
///             .element("y", int)
///             .build_arc()
///     })
/// }
///
/// assert!(Arc::ptr_eq(point_descriptor(), point_descriptor()));
/// ```
pub struct DescriptorCell(OnceLock<Arc<TypeDescriptor>>);

impl DescriptorCell {
    /// Creates an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored descriptor, building it with `f` on first access.
    #[inline]
    pub fn get_or_init(&self, f: impl FnOnce() -> Arc<TypeDescriptor>) -> &Arc<TypeDescriptor> {
        self.0.get_or_init(f)
    }

    /// Returns the stored descriptor if it was already built.
    #[inline]
    pub fn get(&self) -> Option<&Arc<TypeDescriptor>> {
        self.0.get()
    }
}

impl Default for DescriptorCell {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
