use alloc::borrow::Cow;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{TypeId, type_name};
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use vc_utils::TypeIdMap;
use vc_utils::hash::{FixedHashState, HashMap};

use crate::RegistryError;
use crate::protocol::PrimitiveType;
use crate::registry::Binding;
use crate::serializer::{PrimitiveSerializer, SerializerRef};

// -----------------------------------------------------------------------------
// RegistryId

/// Identifies a registry and orders registries by creation time.
///
/// Ids are unique within the process and strictly increase with each
/// created registry (clones included).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegistryId(u64);

impl RegistryId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// -----------------------------------------------------------------------------
// SerialRegistry

/// A context mapping types to serializers, with an optional parent.
///
/// - [`get`](Self::get) checks this registry first, then the parent chain.
/// - Registration needs `&mut self`, so a registry is set up first and then
///   shared read-only through [`Arc`], usually by a format adapter.
/// - The parent chain is acyclic: a parent must be older than its child,
///   see [`set_parent`](Self::set_parent).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_serialize::registry::SerialRegistry;
/// use vc_serialize::serializer::{BytesSerializer, ListSerializer, PrimitiveSerializer};
///
/// let mut base = SerialRegistry::empty();
/// base.register::<Vec<u8>>(Arc::new(ListSerializer::<u8>::new(Arc::new(PrimitiveSerializer::<u8>::new()))))
///     .unwrap();
/// let base = Arc::new(base);
///
/// let mut child = SerialRegistry::with_parent(base.clone());
/// assert!(child.contains::<Vec<u8>>());
///
/// // The child shadows the parent's binding.
/// child.register::<Vec<u8>>(Arc::new(BytesSerializer::new())).unwrap();
/// assert_eq!(child.get::<Vec<u8>>().unwrap().descriptor().name(), "bytes");
/// assert_eq!(base.get::<Vec<u8>>().unwrap().descriptor().name(), "alloc::vec::Vec<u8>");
/// ```
pub struct SerialRegistry {
    id: RegistryId,
    parent: Option<Arc<SerialRegistry>>,
    bindings: TypeIdMap<Binding>,
    names: HashMap<Cow<'static, str>, TypeId>,
    auto_registered: bool,
}

impl Default for SerialRegistry {
    /// See [`SerialRegistry::new`] .
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl SerialRegistry {
    /// Creates an empty registry without parent.
    pub fn empty() -> Self {
        Self {
            id: RegistryId::next(),
            parent: None,
            bindings: TypeIdMap::new(),
            names: HashMap::with_hasher(FixedHashState::default()),
            auto_registered: false,
        }
    }

    /// Creates a registry with bindings for the primitive types.
    ///
    /// - `bool` `char`
    /// - `i8` `i16` `i32` `i64`
    /// - `u8` `u16` `u32` `u64`
    /// - `f32` `f64`
    /// - `String`
    ///
    /// Resolution never needs these, primitives declare their default
    /// serializer. They let polymorphic values hold primitives.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_primitive::<bool>();
        registry.register_primitive::<char>();
        registry.register_primitive::<i8>();
        registry.register_primitive::<i16>();
        registry.register_primitive::<i32>();
        registry.register_primitive::<i64>();
        registry.register_primitive::<u8>();
        registry.register_primitive::<u16>();
        registry.register_primitive::<u32>();
        registry.register_primitive::<u64>();
        registry.register_primitive::<f32>();
        registry.register_primitive::<f64>();
        registry.register_primitive::<String>();
        registry
    }

    /// Creates an empty registry whose lookups fall back to `parent`.
    pub fn with_parent(parent: Arc<SerialRegistry>) -> Self {
        let mut registry = Self::empty();
        log::debug!("registry {} created with parent {}", registry.id, parent.id);
        registry.parent = Some(parent);
        registry
    }

    fn register_primitive<P: PrimitiveType>(&mut self) {
        let serializer: SerializerRef<P> = Arc::new(PrimitiveSerializer::<P>::new());
        let name = Cow::Borrowed(P::descriptor().name());
        self.bind(TypeId::of::<P>(), Binding::new(name, serializer));
    }

    /// Returns the id of this registry.
    #[inline]
    pub const fn id(&self) -> RegistryId {
        self.id
    }

    /// Returns the parent registry.
    #[inline]
    pub fn parent(&self) -> Option<&Arc<SerialRegistry>> {
        self.parent.as_ref()
    }

    /// Replaces the parent registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ParentNotOlder`] unless `parent` was created
    /// before `self`. The parent is left unchanged in that case.
    pub fn set_parent(&mut self, parent: Option<Arc<SerialRegistry>>) -> Result<(), RegistryError> {
        if let Some(parent) = &parent
            && parent.id >= self.id
        {
            return Err(RegistryError::ParentNotOlder {
                child: self.id,
                parent: parent.id,
            });
        }
        match &parent {
            Some(parent) => log::debug!("registry {} now has parent {}", self.id, parent.id),
            None => log::debug!("registry {} detached from its parent", self.id),
        }
        self.parent = parent;
        Ok(())
    }

    /// Iterates this registry followed by its ancestors, nearest first.
    pub fn chain(&self) -> impl Iterator<Item = &SerialRegistry> {
        core::iter::successors(Some(self), |registry| registry.parent.as_deref())
    }

    /// Binds `serializer` to `T`, using the descriptor name as serial name.
    ///
    /// Replaces an existing binding of `T` in this registry, bindings of
    /// the parents are only shadowed.
    ///
    /// # Errors
    ///
    /// See [`register_named`](Self::register_named). Types sharing a
    /// descriptor, such as `T` and `Box<T>`, need distinct explicit names.
    pub fn register<T: Send + Sync + 'static>(
        &mut self,
        serializer: SerializerRef<T>,
    ) -> Result<&mut Self, RegistryError> {
        let name = String::from(serializer.descriptor().name());
        self.register_named(name, serializer)
    }

    /// Binds `serializer` to `T` under an explicit serial name.
    ///
    /// Polymorphic values of type `T` are written with this name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NameTaken`] if `name` already identifies
    /// another type in this registry or one of its parents. Nothing is
    /// bound in that case.
    pub fn register_named<T: Send + Sync + 'static>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        serializer: SerializerRef<T>,
    ) -> Result<&mut Self, RegistryError> {
        let binding = Binding::new(name.into(), serializer);
        self.check_name(&binding)?;
        self.bind(TypeId::of::<T>(), binding);
        Ok(self)
    }

    fn check_name(&self, binding: &Binding) -> Result<(), RegistryError> {
        match self.binding_by_name(binding.name()) {
            Some(owner) if owner.value_type_id() != binding.value_type_id() => {
                Err(RegistryError::NameTaken {
                    name: String::from(&**binding.name()),
                    owner: owner.erased().type_name(),
                    requested: binding.erased().type_name(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Inserts a binding whose name was checked.
    fn bind(&mut self, type_id: TypeId, binding: Binding) {
        let name = binding.name().clone();
        let type_name = binding.erased().type_name();
        if let Some(old) = self.bindings.insert(type_id, binding) {
            log::warn!("serializer of `{type_name}` replaced in registry {}", self.id);
            if self.names.get(old.name()) == Some(&type_id) {
                self.names.remove(old.name());
            }
        }
        log::debug!("registered `{type_name}` as `{name}` in registry {}", self.id);
        self.names.insert(name, type_id);
    }

    /// Removes the binding of `T` from this registry and returns it.
    ///
    /// Bindings of the parents are not touched.
    pub fn unregister<T: 'static>(&mut self) -> Option<SerializerRef<T>> {
        let type_id = TypeId::of::<T>();
        let binding = self.bindings.remove(&type_id)?;
        if self.names.get(binding.name()) == Some(&type_id) {
            self.names.remove(binding.name());
        }
        log::debug!("unregistered `{}` from registry {}", type_name::<T>(), self.id);
        binding.typed::<T>()
    }

    /// Returns the serializer bound to `T` here or in the nearest ancestor.
    pub fn get<T: 'static>(&self) -> Option<SerializerRef<T>> {
        self.binding(TypeId::of::<T>())?.typed::<T>()
    }

    /// Returns the serializer bound to `T` in this registry only.
    pub fn get_local<T: 'static>(&self) -> Option<SerializerRef<T>> {
        self.bindings.get_type::<T>()?.typed::<T>()
    }

    /// Returns `true` if `T` is bound here or in an ancestor.
    pub fn contains<T: 'static>(&self) -> bool {
        self.binding(TypeId::of::<T>()).is_some()
    }

    /// Returns `true` if `T` is bound in this registry.
    #[inline]
    pub fn contains_local<T: 'static>(&self) -> bool {
        self.bindings.contains_type::<T>()
    }

    /// Returns the serial name `T` is known by, searching the chain.
    pub fn serial_name<T: 'static>(&self) -> Option<&str> {
        self.binding(TypeId::of::<T>()).map(|binding| &**binding.name())
    }

    /// Returns the number of bindings in this registry, parents excluded.
    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if this registry holds no bindings of its own.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Copies all bindings of `other` into this registry.
    ///
    /// Bindings of `other` replace bindings of the same type.
    /// The parents of `other` are not copied.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NameTaken`] if a serial name of `other`
    /// already identifies another type here. Nothing is copied in that case.
    pub fn include(&mut self, other: &SerialRegistry) -> Result<&mut Self, RegistryError> {
        for (_, binding) in other.bindings.iter() {
            self.check_name(binding)?;
        }
        for (type_id, binding) in other.bindings.iter() {
            self.bind(*type_id, binding.clone());
        }
        log::debug!(
            "registry {} included {} bindings of registry {}",
            self.id,
            other.len(),
            other.id
        );
        Ok(self)
    }

    pub(crate) fn binding(&self, type_id: TypeId) -> Option<&Binding> {
        self.chain()
            .find_map(|registry| registry.bindings.get(&type_id))
    }

    pub(crate) fn binding_by_name(&self, name: &str) -> Option<&Binding> {
        self.chain().find_map(|registry| {
            let type_id = registry.names.get(name)?;
            registry.bindings.get(type_id)
        })
    }

    /// Registers all types submitted through [`auto_register!`].
    ///
    /// Repeated calls are cheap and will not replace bindings twice.
    ///
    /// ## Return Value
    ///
    /// Returns `true` if automatic registration succeeded on the current
    /// platform, otherwise `false`.
    ///
    /// ## Feature Dependency
    ///
    /// This method requires the `auto_register` feature. When disabled, it
    /// does nothing and returns `false`.
    ///
    /// [`auto_register!`]: crate::auto_register
    #[cfg(feature = "auto_register")]
    pub fn auto_register(&mut self) -> bool {
        // Reduce the cost of duplicate registrations.
        if self.auto_registered {
            return true;
        }
        crate::__macro_exports::auto_register::__register_types(self);
        self.auto_registered
    }

    /// Registers all types submitted through [`auto_register!`].
    ///
    /// The `auto_register` feature is disabled, so this always returns `false`.
    ///
    /// [`auto_register!`]: crate::auto_register
    #[cfg(not(feature = "auto_register"))]
    #[inline(always)]
    pub fn auto_register(&mut self) -> bool {
        false
    }

    #[cfg(feature = "auto_register")]
    pub(crate) fn mark_auto_registered(&mut self) {
        self.auto_registered = true;
    }
}

impl Clone for SerialRegistry {
    /// Copies bindings and parent into a registry with a new id.
    fn clone(&self) -> Self {
        Self {
            id: RegistryId::next(),
            parent: self.parent.clone(),
            bindings: self.bindings.clone(),
            names: self.names.clone(),
            auto_registered: self.auto_registered,
        }
    }
}

impl fmt::Debug for SerialRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names.keys().map(|name| &**name).collect();
        names.sort_unstable();
        f.debug_struct("SerialRegistry")
            .field("id", &self.id)
            .field("parent", &self.parent.as_ref().map(|parent| parent.id))
            .field("names", &names)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use core::any::TypeId;

    use super::SerialRegistry;
    use crate::RegistryError;
    use crate::serializer::{BoxSerializer, BytesSerializer, ListSerializer, PrimitiveSerializer};

    #[test]
    fn ids_increase() {
        let a = SerialRegistry::empty();
        let b = SerialRegistry::empty();
        assert!(a.id() < b.id());
        assert!(b.id() < b.clone().id());
    }

    #[test]
    fn parent_must_be_older() {
        let older = Arc::new(SerialRegistry::empty());
        let mut child = SerialRegistry::empty();
        let younger = Arc::new(SerialRegistry::empty());

        assert_eq!(
            child.set_parent(Some(younger.clone())),
            Err(RegistryError::ParentNotOlder {
                child: child.id(),
                parent: younger.id(),
            })
        );
        assert!(child.parent().is_none());

        child.set_parent(Some(older.clone())).unwrap();
        assert_eq!(child.parent().map(|p| p.id()), Some(older.id()));
        assert_eq!(child.chain().count(), 2);

        child.set_parent(None).unwrap();
        assert!(child.parent().is_none());
    }

    #[test]
    fn chain_lookup_and_shadowing() {
        let mut base = SerialRegistry::empty();
        base.register::<u32>(Arc::new(PrimitiveSerializer::<u32>::new())).unwrap();
        base.register::<Vec<u8>>(Arc::new(BytesSerializer::new())).unwrap();
        let base = Arc::new(base);

        let mut child = SerialRegistry::with_parent(base.clone());
        assert!(child.is_empty());
        assert!(child.contains::<u32>());
        assert!(!child.contains_local::<u32>());
        assert!(child.get_local::<u32>().is_none());

        child
            .register::<Vec<u8>>(Arc::new(ListSerializer::new(Arc::new(
                PrimitiveSerializer::<u8>::new(),
            ))))
            .unwrap();
        assert_eq!(
            child.get::<Vec<u8>>().unwrap().descriptor().name(),
            "alloc::vec::Vec<u8>"
        );
        assert_eq!(base.get::<Vec<u8>>().unwrap().descriptor().name(), "bytes");

        assert!(child.unregister::<Vec<u8>>().is_some());
        assert_eq!(child.get::<Vec<u8>>().unwrap().descriptor().name(), "bytes");
        assert!(child.unregister::<u32>().is_none());
        assert!(child.get::<i64>().is_none());
    }

    #[test]
    fn names_follow_bindings() {
        let mut registry = SerialRegistry::empty();
        registry
            .register_named::<u32>("demo.Id", Arc::new(PrimitiveSerializer::<u32>::new()))
            .unwrap();
        assert_eq!(registry.serial_name::<u32>(), Some("demo.Id"));
        assert!(registry.binding_by_name("demo.Id").is_some());

        registry.register::<u32>(Arc::new(PrimitiveSerializer::<u32>::new())).unwrap();
        assert_eq!(registry.serial_name::<u32>(), Some("u32"));
        assert!(registry.binding_by_name("demo.Id").is_none());

        let child = SerialRegistry::with_parent(Arc::new(registry));
        assert!(child.binding_by_name("u32").is_some());
    }

    #[test]
    fn new_binds_primitives_and_include_copies() {
        let primitives = SerialRegistry::new();
        assert!(primitives.contains::<String>());
        assert!(primitives.contains::<f64>());
        assert!(!primitives.contains::<Vec<u8>>());

        let mut target = SerialRegistry::empty();
        target.include(&primitives).unwrap();
        assert_eq!(target.len(), primitives.len());
        assert_eq!(target.serial_name::<String>(), Some("alloc::string::String"));
    }

    #[test]
    fn names_are_unique_per_type() {
        let mut registry = SerialRegistry::empty();
        registry.register::<u32>(Arc::new(PrimitiveSerializer::<u32>::new())).unwrap();

        // `Box<u32>` shares the descriptor, and so the default name, of `u32`.
        let boxed = Arc::new(BoxSerializer::new(Arc::new(PrimitiveSerializer::<u32>::new())));
        let err = registry.register::<Box<u32>>(boxed.clone()).unwrap_err();
        assert_eq!(
            err,
            RegistryError::NameTaken {
                name: String::from("u32"),
                owner: core::any::type_name::<u32>(),
                requested: core::any::type_name::<Box<u32>>(),
            }
        );
        assert!(!registry.contains::<Box<u32>>());
        assert_eq!(
            registry.binding_by_name("u32").map(|b| b.value_type_id()),
            Some(TypeId::of::<u32>())
        );

        registry.register_named::<Box<u32>>("boxed u32", boxed).unwrap();
        assert_eq!(registry.serial_name::<Box<u32>>(), Some("boxed u32"));

        // Re-binding a type under its own name is a replacement.
        registry.register::<u32>(Arc::new(PrimitiveSerializer::<u32>::new())).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn names_are_unique_along_the_chain() {
        let mut base = SerialRegistry::empty();
        base.register_named::<i64>("shape", Arc::new(PrimitiveSerializer::<i64>::new()))
            .unwrap();
        let base = Arc::new(base);

        let mut child = SerialRegistry::with_parent(base.clone());
        assert!(matches!(
            child.register_named::<u32>("shape", Arc::new(PrimitiveSerializer::<u32>::new())),
            Err(RegistryError::NameTaken { .. })
        ));
        // The parent's type may be shadowed under the same name.
        child.register_named::<i64>("shape", Arc::new(PrimitiveSerializer::<i64>::new()))
            .unwrap();

        let mut other = SerialRegistry::empty();
        other.register_named::<u32>("shape", Arc::new(PrimitiveSerializer::<u32>::new()))
            .unwrap();
        assert!(child.include(&other).is_err());
        assert!(!child.contains::<u32>());
    }
}
