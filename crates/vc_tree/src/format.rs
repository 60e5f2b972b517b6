use alloc::sync::Arc;

use vc_serialize::registry::SerialRegistry;
use vc_serialize::resolver::ResolverCache;
use vc_serialize::{SerialType, Serializer, SerializerRef};

use crate::decoder::TreeDecoder;
use crate::encoder::TreeEncoder;
use crate::{TreeConfig, TreeError, Value};

/// Format adapter between serializers and [`Value`] trees.
///
/// A format owns a shared registry and resolves serializers through it,
/// caching the results. Distinct formats may hold distinct registries, so
/// the same type can be written differently by each of them.
///
/// Encoding and decoding only need `&self`, a format can be shared across
/// threads.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use std::sync::Arc;
/// use vc_serialize::registry::SerialRegistry;
/// use vc_tree::{TreeConfig, TreeFormat, Value};
///
/// let format = TreeFormat::new(Arc::new(SerialRegistry::new()));
///
/// let mut scores = BTreeMap::new();
/// scores.insert(String::from("ada"), vec![3_u32, 5]);
///
/// let tree = format.encode(&scores).unwrap();
/// assert_eq!(serde_json::to_string(&tree).unwrap(), r#"[["ada",[3,5]]]"#);
/// assert_eq!(format.decode::<BTreeMap<String, Vec<u32>>>(tree).unwrap(), scores);
///
/// let positional = TreeFormat::new(Arc::new(SerialRegistry::new()))
///     .with_config(TreeConfig::positional());
/// assert_eq!(positional.encode(&Some(7_i8)).unwrap(), Value::Int(7));
/// ```
#[derive(Debug)]
pub struct TreeFormat {
    cache: ResolverCache,
    config: TreeConfig,
}

impl TreeFormat {
    /// Creates a keyed format over `registry`.
    pub fn new(registry: Arc<SerialRegistry>) -> Self {
        Self {
            cache: ResolverCache::new(registry),
            config: TreeConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[inline]
    pub fn with_config(mut self, config: TreeConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &Arc<SerialRegistry> {
        self.cache.registry()
    }

    /// Resolves the serializer this format uses for `T`.
    #[inline]
    pub fn serializer<T: SerialType>(&self) -> Result<SerializerRef<T>, TreeError> {
        Ok(self.cache.resolve::<T>()?)
    }

    /// Encodes `value` with the resolved serializer of `T`.
    pub fn encode<T: SerialType>(&self, value: &T) -> Result<Value, TreeError> {
        let serializer = self.serializer::<T>()?;
        self.encode_with(&*serializer, value)
    }

    /// Encodes `value` with an explicit serializer.
    pub fn encode_with<T>(
        &self,
        serializer: &dyn Serializer<T>,
        value: &T,
    ) -> Result<Value, TreeError> {
        log::trace!("encoding `{}`", serializer.descriptor().name());
        let mut encoder = TreeEncoder::new(self.registry(), &self.config);
        serializer
            .save(&mut encoder, value)
            .and_then(|()| encoder.finish())
            .map_err(TreeError::from_serial)
    }

    /// Decodes a `T` with its resolved serializer.
    pub fn decode<T: SerialType>(&self, tree: Value) -> Result<T, TreeError> {
        let serializer = self.serializer::<T>()?;
        self.decode_with(&*serializer, tree)
    }

    /// Decodes with an explicit serializer.
    pub fn decode_with<T>(&self, serializer: &dyn Serializer<T>, tree: Value) -> Result<T, TreeError> {
        log::trace!("decoding `{}`", serializer.descriptor().name());
        let mut decoder = TreeDecoder::new(self.registry(), &self.config, tree);
        let value = serializer.load(&mut decoder).map_err(TreeError::from_serial)?;
        decoder
            .finish(serializer.descriptor())
            .map_err(TreeError::from_serial)?;
        Ok(value)
    }

    /// Decodes `tree` into the existing value `old`.
    ///
    /// Fails with [`SerialError::UnsupportedMerge`] for types whose
    /// serializer does not support merge-decoding.
    ///
    /// [`SerialError::UnsupportedMerge`]: vc_serialize::SerialError::UnsupportedMerge
    pub fn merge<T: SerialType>(&self, tree: Value, old: T) -> Result<T, TreeError> {
        let serializer = self.serializer::<T>()?;
        self.merge_with(&*serializer, tree, old)
    }

    /// Merge-decodes with an explicit serializer.
    pub fn merge_with<T>(
        &self,
        serializer: &dyn Serializer<T>,
        tree: Value,
        old: T,
    ) -> Result<T, TreeError> {
        log::trace!("merging into `{}`", serializer.descriptor().name());
        let mut decoder = TreeDecoder::new(self.registry(), &self.config, tree);
        let value = serializer
            .update(&mut decoder, old)
            .map_err(TreeError::from_serial)?;
        decoder
            .finish(serializer.descriptor())
            .map_err(TreeError::from_serial)?;
        Ok(value)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests;
