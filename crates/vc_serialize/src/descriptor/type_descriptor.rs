use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::descriptor::element::ElementDescriptor;
use crate::descriptor::{ElementInfo, PrimitiveKind, TypeKind};

// -----------------------------------------------------------------------------
// TypeDescriptor

/// Structural metadata of one serializable type.
///
/// A descriptor is immutable once built and shared via [`Arc`].
/// Its element list is indexed densely from zero in declaration order,
/// every index `0..element_len()` maps to exactly one element and element
/// names are unique within the descriptor.
///
/// Leaf and collection descriptors have dedicated constructors.
/// Class and enum descriptors go through [`TypeDescriptor::builder`].
///
/// # Examples
///
/// ```
/// use vc_serialize::descriptor::{PrimitiveKind, TypeDescriptor, TypeKind};
/// use std::sync::Arc;
///
/// let string = Arc::new(TypeDescriptor::primitive("alloc::string::String", PrimitiveKind::Str));
/// let list = TypeDescriptor::list("alloc::vec::Vec<alloc::string::String>", string);
///
/// assert_eq!(list.kind(), TypeKind::List);
/// assert_eq!(list.element_index("item"), Some(0));
/// assert_eq!(list.element(0).unwrap().descriptor().name(), "alloc::string::String");
/// ```
#[derive(Clone)]
pub struct TypeDescriptor {
    name: Cow<'static, str>,
    kind: TypeKind,
    elements: Box<[ElementInfo]>,
}

impl TypeDescriptor {
    /// Creates the descriptor of a primitive type.
    pub fn primitive(name: impl Into<Cow<'static, str>>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Primitive(kind),
            elements: Box::new([]),
        }
    }

    /// Creates a list descriptor whose single `item` element describes the items.
    pub fn list(name: impl Into<Cow<'static, str>>, item: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::List,
            elements: Box::new([ElementInfo::new(
                Cow::Borrowed("item"),
                0,
                ElementDescriptor::Ready(item),
                false,
            )]),
        }
    }

    /// Creates a map descriptor with a `key` element and a `value` element.
    pub fn map(
        name: impl Into<Cow<'static, str>>,
        key: Arc<TypeDescriptor>,
        value: Arc<TypeDescriptor>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Map,
            elements: Box::new([
                ElementInfo::new(Cow::Borrowed("key"), 0, ElementDescriptor::Ready(key), false),
                ElementInfo::new(
                    Cow::Borrowed("value"),
                    1,
                    ElementDescriptor::Ready(value),
                    false,
                ),
            ]),
        }
    }

    /// Creates a nullable descriptor wrapping exactly one inner descriptor.
    ///
    /// The element is named after the inner type and marked optional.
    pub fn nullable(name: impl Into<Cow<'static, str>>, inner: Arc<TypeDescriptor>) -> Self {
        let element_name = Cow::Owned(String::from(inner.name()));
        Self {
            name: name.into(),
            kind: TypeKind::Nullable,
            elements: Box::new([ElementInfo::new(
                element_name,
                0,
                ElementDescriptor::Ready(inner),
                true,
            )]),
        }
    }

    /// Starts a [`DescriptorBuilder`] for a class or enum descriptor.
    #[inline]
    pub fn builder(name: impl Into<Cow<'static, str>>, kind: TypeKind) -> DescriptorBuilder {
        DescriptorBuilder {
            name: name.into(),
            kind,
            elements: Vec::new(),
        }
    }

    /// Returns the type name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the structural kind.
    #[inline]
    pub const fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Returns `true` if the kind is [`TypeKind::Nullable`].
    #[inline]
    pub const fn is_nullable(&self) -> bool {
        matches!(self.kind, TypeKind::Nullable)
    }

    /// Returns all elements in index order.
    #[inline]
    pub fn elements(&self) -> &[ElementInfo] {
        &self.elements
    }

    /// Returns the element at `index`, if any.
    #[inline]
    pub fn element(&self, index: usize) -> Option<&ElementInfo> {
        self.elements.get(index)
    }

    /// Returns the index of the element with the given name.
    pub fn element_index(&self, name: &str) -> Option<usize> {
        self.elements.iter().position(|info| info.name() == name)
    }

    /// Returns the number of elements.
    #[inline]
    pub fn element_len(&self) -> usize {
        self.elements.len()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.name)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("elements", &self.elements)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// DescriptorBuilder

/// Builder for class and enum descriptors.
///
/// Indices are assigned in call order.
///
/// # Panics
///
/// [`build`](Self::build) panics on a structurally invalid descriptor:
/// duplicate element names, elements on a primitive kind, or a
/// `Nullable` kind (use [`TypeDescriptor::nullable`]).
///
/// # Examples
///
/// ```
/// use vc_serialize::descriptor::{TypeDescriptor, TypeKind};
///
/// let color = TypeDescriptor::builder("demo::Color", TypeKind::Enum)
///     .variant("Red")
///     .variant("Green")
///     .build();
///
/// assert_eq!(color.element_len(), 2);
/// assert_eq!(color.element(1).unwrap().descriptor().name(), "demo::Color::Green");
/// ```
#[must_use]
pub struct DescriptorBuilder {
    name: Cow<'static, str>,
    kind: TypeKind,
    elements: Vec<ElementInfo>,
}

impl DescriptorBuilder {
    fn push(mut self, name: Cow<'static, str>, descriptor: ElementDescriptor, optional: bool) -> Self {
        let index = self.elements.len();
        self.elements
            .push(ElementInfo::new(name, index, descriptor, optional));
        self
    }

    /// Appends a required element.
    pub fn element(
        self,
        name: impl Into<Cow<'static, str>>,
        descriptor: Arc<TypeDescriptor>,
    ) -> Self {
        self.push(name.into(), ElementDescriptor::Ready(descriptor), false)
    }

    /// Appends an element that may be absent when decoding.
    pub fn optional_element(
        self,
        name: impl Into<Cow<'static, str>>,
        descriptor: Arc<TypeDescriptor>,
    ) -> Self {
        self.push(name.into(), ElementDescriptor::Ready(descriptor), true)
    }

    /// Appends an element whose descriptor is created on first access.
    ///
    /// Needed for self-referential types, whose descriptor cannot
    /// exist before their own elements are listed.
    pub fn deferred_element(
        self,
        name: impl Into<Cow<'static, str>>,
        descriptor: fn() -> Arc<TypeDescriptor>,
        optional: bool,
    ) -> Self {
        self.push(name.into(), ElementDescriptor::Deferred(descriptor), optional)
    }

    /// Appends a unit variant for an enum descriptor.
    ///
    /// The variant descriptor is an empty class named `Enum::Variant`.
    pub fn variant(self, name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        let variant = TypeDescriptor {
            name: Cow::Owned(format!("{}::{}", self.name, name)),
            kind: TypeKind::Class,
            elements: Box::new([]),
        };
        self.push(name, ElementDescriptor::Ready(Arc::new(variant)), false)
    }

    /// Finishes the descriptor.
    pub fn build(self) -> TypeDescriptor {
        assert!(
            !matches!(self.kind, TypeKind::Nullable),
            "nullable descriptor `{}` must be created with `TypeDescriptor::nullable`",
            self.name,
        );
        assert!(
            !matches!(self.kind, TypeKind::Primitive(_)) || self.elements.is_empty(),
            "primitive descriptor `{}` cannot have elements",
            self.name,
        );
        for (index, info) in self.elements.iter().enumerate() {
            if self.elements[..index].iter().any(|prev| prev.name() == info.name()) {
                panic!(
                    "duplicate element name `{}` in descriptor `{}`",
                    info.name(),
                    self.name
                );
            }
        }

        TypeDescriptor {
            name: self.name,
            kind: self.kind,
            elements: self.elements.into_boxed_slice(),
        }
    }

    /// Finishes the descriptor and wraps it in an [`Arc`].
    #[inline]
    pub fn build_arc(self) -> Arc<TypeDescriptor> {
        Arc::new(self.build())
    }
}

// -----------------------------------------------------------------------------
// Tests
