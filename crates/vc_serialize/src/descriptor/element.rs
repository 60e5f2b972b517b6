use alloc::borrow::Cow;
use alloc::sync::Arc;
use core::fmt;

use crate::descriptor::TypeDescriptor;

// -----------------------------------------------------------------------------
// ElementInfo

/// One element of a [`TypeDescriptor`]: a class field, an enum variant,
/// or the item slot of a collection.
///
/// The element descriptor may be deferred. Self-referential types
/// (a node holding a list of nodes) cannot build their descriptor
/// eagerly, so the descriptor is then created on first access.
///
/// # Examples
///
/// ```
/// use vc_serialize::descriptor::{PrimitiveKind, TypeDescriptor, TypeKind};
/// use std::sync::Arc;
///
/// let int = Arc::new(TypeDescriptor::primitive("i32", PrimitiveKind::I32));
/// let point = TypeDescriptor::builder("demo::Point", TypeKind::Class)
///     .element("x", int.clone())
///     .element("y", int)
///     .build();
///
/// let y = point.element(1).unwrap();
/// assert_eq!(y.name(), "y");
/// assert_eq!(y.index(), 1);
/// assert!(!y.is_optional());
/// ```
#[derive(Clone)]
pub struct ElementInfo {
    name: Cow<'static, str>,
    index: usize,
    descriptor: ElementDescriptor,
    optional: bool,
}

#[derive(Clone)]
pub(super) enum ElementDescriptor {
    Ready(Arc<TypeDescriptor>),
    Deferred(fn() -> Arc<TypeDescriptor>),
}

impl ElementInfo {
    #[inline]
    pub(super) const fn new(
        name: Cow<'static, str>,
        index: usize,
        descriptor: ElementDescriptor,
        optional: bool,
    ) -> Self {
        Self {
            name,
            index,
            descriptor,
            optional,
        }
    }

    /// Returns the element name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the position of the element in declaration order.
    #[inline]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns `true` if the element may be absent on the wire.
    #[inline]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Returns the element's descriptor, creating a deferred one on demand.
    pub fn descriptor(&self) -> Arc<TypeDescriptor> {
        match &self.descriptor {
            ElementDescriptor::Ready(descriptor) => descriptor.clone(),
            ElementDescriptor::Deferred(f) => f(),
        }
    }
}

impl fmt::Debug for ElementInfo {
    // Only the element's own data: deferred descriptors may be recursive.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ElementInfo");
        s.field("name", &self.name)
            .field("index", &self.index)
            .field("optional", &self.optional);
        match &self.descriptor {
            ElementDescriptor::Ready(descriptor) => s.field("descriptor", &descriptor.name()),
            ElementDescriptor::Deferred(_) => s.field("descriptor", &"<deferred>"),
        };
        s.finish()
    }
}
