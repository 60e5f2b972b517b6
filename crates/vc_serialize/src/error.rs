use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::fmt::Display;

use thiserror::Error;

use crate::descriptor::{PrimitiveKind, TypeDescriptor};
use crate::registry::RegistryId;

// -----------------------------------------------------------------------------
// ResolveError

/// Failure of the resolver to find a serializer.
///
/// Never retried: the caller must register a serializer or supply an
/// explicit one at the use site.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResolveError {
    #[error("no serializer found for type `{type_name}`, register one or supply it explicitly")]
    NotFound { type_name: &'static str },
}

impl ResolveError {
    /// The name of the type that could not be resolved.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::NotFound { type_name } => type_name,
        }
    }
}

// -----------------------------------------------------------------------------
// RegistryError

/// Rejected registration or registry chain construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("registry {parent} cannot be the parent of registry {child}, a parent must be created before its children")]
    ParentNotOlder { child: RegistryId, parent: RegistryId },

    #[error("serial name `{name}` is bound to `{owner}` and cannot be bound to `{requested}`")]
    NameTaken {
        name: String,
        owner: &'static str,
        requested: &'static str,
    },
}

// -----------------------------------------------------------------------------
// SerialError

/// Errors raised while driving a serializer against an encoder or decoder.
///
/// Format adapters report their own malformed-input errors through
/// [`SerialError::format`] and can get them back with a downcast.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerialError {
    #[error("type `{type_name}` does not support merge-decoding")]
    UnsupportedMerge { type_name: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("element `{element}` of `{type_name}` is missing")]
    MissingElement { type_name: String, element: String },

    #[error("unknown element index {index} for `{type_name}`")]
    UnknownElement { type_name: String, index: usize },

    #[error("no serializer registered under serial name `{0}`")]
    UnknownSerialName(String),

    #[error("serial name `{name}` of `{type_name}` leads to another type in the registry chain")]
    AmbiguousSerialName {
        name: String,
        type_name: &'static str,
    },

    #[error("expected a `{expected}` primitive, found `{found}`")]
    PrimitiveMismatch {
        expected: PrimitiveKind,
        found: PrimitiveKind,
    },

    #[error("{0}")]
    Custom(String),

    #[error("{0}")]
    Format(Box<dyn core::error::Error + Send + Sync>),
}

impl SerialError {
    /// Creates a [`SerialError::Custom`].
    ///
    /// Prefer this over building the variant by hand: with the `debug`
    /// feature in a debug build, the message carries the stack of
    /// descriptors being processed.
    pub fn custom(msg: impl Display) -> Self {
        Self::Custom(crate::protocol::trace::message(msg))
    }

    /// Wraps an error defined by a format adapter.
    pub fn format<E: core::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Self::Format(Box::new(error))
    }

    /// The error returned by serializers that do not override `update`.
    pub fn unsupported_merge(descriptor: &TypeDescriptor) -> Self {
        Self::UnsupportedMerge {
            type_name: descriptor.name().to_string(),
        }
    }

    /// A required element was never decoded.
    pub fn missing_element(descriptor: &TypeDescriptor, index: usize) -> Self {
        let element = match descriptor.element(index) {
            Some(info) => info.name().to_string(),
            None => index.to_string(),
        };
        Self::MissingElement {
            type_name: descriptor.name().to_string(),
            element,
        }
    }

    /// The decoder produced an index the serializer does not know.
    pub fn unknown_element(descriptor: &TypeDescriptor, index: usize) -> Self {
        Self::UnknownElement {
            type_name: descriptor.name().to_string(),
            index,
        }
    }
}
