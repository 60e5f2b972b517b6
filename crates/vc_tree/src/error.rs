use alloc::string::String;

use thiserror::Error;
use vc_serialize::descriptor::PrimitiveKind;
use vc_serialize::{ResolveError, SerialError};

/// Errors of [`TreeFormat`](crate::TreeFormat).
///
/// Malformed trees are reported with the dedicated variants, failures of
/// the serializers themselves are wrapped in [`TreeError::Serial`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TreeError {
    #[error("expected {expected} for `{type_name}`, found {found}")]
    KindMismatch {
        type_name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown key `{key}` in `{type_name}`")]
    UnknownKey { type_name: String, key: String },

    #[error("duplicate key `{key}` in `{type_name}`")]
    DuplicateKey { type_name: String, key: String },

    #[error("unknown variant `{variant}` of `{type_name}`")]
    UnknownVariant { type_name: String, variant: String },

    #[error("integer {value} is out of range for `{kind}`")]
    OutOfRange { value: String, kind: PrimitiveKind },

    #[error("unexpected end of input while reading `{type_name}`")]
    UnexpectedEnd { type_name: String },

    #[error("{count} trailing element(s) after `{type_name}`")]
    TrailingElements { type_name: String, count: usize },

    #[error("element {index} of `{type_name}` is read out of order")]
    OutOfOrder { type_name: String, index: usize },

    #[error(transparent)]
    Serial(#[from] SerialError),
}

impl TreeError {
    /// Recovers a tree error that travelled through the serializers.
    ///
    /// The encoder and decoder report malformed input as
    /// [`SerialError::Format`], anything else stays wrapped.
    pub fn from_serial(error: SerialError) -> Self {
        match error {
            SerialError::Format(inner) => match inner.downcast::<TreeError>() {
                Ok(tree) => *tree,
                Err(other) => Self::Serial(SerialError::Format(other)),
            },
            other => Self::Serial(other),
        }
    }

    /// Returns `true` if the error is a missing element of a structure.
    pub fn is_missing_element(&self) -> bool {
        matches!(self, Self::Serial(SerialError::MissingElement { .. }))
    }
}

impl From<ResolveError> for TreeError {
    #[inline]
    fn from(error: ResolveError) -> Self {
        Self::Serial(SerialError::Resolve(error))
    }
}

impl From<TreeError> for SerialError {
    #[inline]
    fn from(error: TreeError) -> Self {
        match error {
            TreeError::Serial(inner) => inner,
            other => SerialError::format(other),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::TreeError;
    use vc_serialize::SerialError;

    #[test]
    fn survives_the_serial_layer() {
        let error = TreeError::UnknownKey {
            type_name: "Point".to_string(),
            key: "z".to_string(),
        };
        let serial = SerialError::from(error);
        assert!(matches!(serial, SerialError::Format(_)));

        let back = TreeError::from_serial(serial);
        assert!(matches!(back, TreeError::UnknownKey { ref key, .. } if key == "z"));
        assert_eq!(back.to_string(), "unknown key `z` in `Point`");
    }

    #[test]
    fn serial_errors_stay_wrapped() {
        let back = TreeError::from_serial(SerialError::UnknownSerialName("Gone".to_string()));
        assert!(matches!(back, TreeError::Serial(SerialError::UnknownSerialName(_))));
    }
}
