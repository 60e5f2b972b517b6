#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Compilation config

/// Some macros used for compilation control.
pub mod cfg {
    /// Expands the tokens when descriptor tracing is active
    /// (`debug` feature in a debug build).
    macro_rules! debug {
        ($($tt:tt)*) => {
            #[cfg(all(debug_assertions, feature = "debug"))]
            { $($tt)* }
        };
    }

    pub(crate) use debug;
}

// -----------------------------------------------------------------------------
// Alloc paths

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;

pub mod descriptor;
pub mod protocol;
pub mod registry;
pub mod resolver;
pub mod serializer;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use error::{RegistryError, ResolveError, SerialError};
pub use resolver::{Resolver, SerialType, resolve};
pub use serializer::{Serializer, SerializerRef};
