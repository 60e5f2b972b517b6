//! Items used by the exported macros. Not public API.

// -----------------------------------------------------------------------------
// auto_register

#[cfg(feature = "auto_register")]
pub mod auto_register {
    pub use inventory;

    use crate::RegistryError;
    use crate::registry::SerialRegistry;

    /// A registration function submitted by [`auto_register!`](crate::auto_register).
    pub struct __AutoRegisterFunc(pub fn(&mut SerialRegistry) -> Result<(), RegistryError>);

    inventory::collect!(__AutoRegisterFunc);

    // Runs on every platform where `inventory` works, so the registry can
    // tell whether the other submissions were collected.
    fn __mark_available(registry: &mut SerialRegistry) -> Result<(), RegistryError> {
        registry.mark_auto_registered();
        Ok(())
    }

    inventory::submit! {
        __AutoRegisterFunc(__mark_available)
    }

    pub(crate) fn __register_types(registry: &mut SerialRegistry) {
        for func in inventory::iter::<__AutoRegisterFunc> {
            if let Err(e) = (func.0)(registry) {
                log::warn!("auto registration skipped: {e}");
            }
        }
    }
}

/// Submits a serializer binding applied by [`SerialRegistry::auto_register`].
///
/// The expression must evaluate to a [`SerializerRef`] of the type and is
/// evaluated on every call of `auto_register`. Only non-generic types can
/// be submitted. A submission whose serial name is taken by another type
/// is skipped with a warning. Without the `auto_register` feature the macro expands to
/// nothing.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_serialize::auto_register;
/// use vc_serialize::registry::SerialRegistry;
/// use vc_serialize::serializer::BytesSerializer;
///
/// auto_register!(Vec<u8> => Arc::new(BytesSerializer::new()));
///
/// let mut registry = SerialRegistry::empty();
/// if registry.auto_register() {
///     assert!(registry.contains::<Vec<u8>>());
/// }
/// ```
///
/// [`SerialRegistry::auto_register`]: crate::registry::SerialRegistry::auto_register
/// [`SerializerRef`]: crate::SerializerRef
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! auto_register {
    ($ty:ty => $serializer:expr) => {
        const _: () = {
            fn __register(
                registry: &mut $crate::registry::SerialRegistry,
            ) -> ::core::result::Result<(), $crate::RegistryError> {
                registry.register::<$ty>($serializer).map(|_| ())
            }

            $crate::__macro_exports::auto_register::inventory::submit! {
                $crate::__macro_exports::auto_register::__AutoRegisterFunc(__register)
            }
        };
    };
}

/// Submits a serializer binding applied by `SerialRegistry::auto_register`.
///
/// The `auto_register` feature is disabled, the macro expands to nothing.
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! auto_register {
    ($ty:ty => $serializer:expr) => {};
}
