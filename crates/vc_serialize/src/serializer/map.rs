use alloc::collections::BTreeMap;
use alloc::format;
use alloc::sync::Arc;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::SerialError;
use crate::descriptor::TypeDescriptor;
use crate::protocol::{Decoder, Encoder, StructureDecoder, decode_structure, encode_collection};
use crate::serializer::{Serializer, SerializerRef};

// -----------------------------------------------------------------------------
// MapCollection

/// Map types supported by [`MapSerializer`].
pub trait MapCollection<K, V>: Sized {
    /// The type path used in the generated descriptor name.
    const TYPE_PATH: &'static str;

    /// Creates an empty map with room for `capacity` entries.
    fn with_capacity(capacity: usize) -> Self;

    /// Returns the number of entries.
    fn map_len(&self) -> usize;

    /// Iterates the entries in the map's own order.
    fn entries<'a>(&'a self) -> impl Iterator<Item = (&'a K, &'a V)>
    where
        K: 'a,
        V: 'a;

    /// Inserts an entry, overwriting an existing value for the key.
    fn insert_entry(&mut self, key: K, value: V);
}

impl<K: Ord, V> MapCollection<K, V> for BTreeMap<K, V> {
    const TYPE_PATH: &'static str = "alloc::collections::BTreeMap";

    #[inline]
    fn with_capacity(_: usize) -> Self {
        BTreeMap::new()
    }

    #[inline]
    fn map_len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn entries<'a>(&'a self) -> impl Iterator<Item = (&'a K, &'a V)>
    where
        K: 'a,
        V: 'a,
    {
        self.iter()
    }

    #[inline]
    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K: Eq + Hash, V, S: BuildHasher + Default> MapCollection<K, V> for HashMap<K, V, S> {
    const TYPE_PATH: &'static str = "std::collections::HashMap";

    #[inline]
    fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity_and_hasher(capacity, S::default())
    }

    #[inline]
    fn map_len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn entries<'a>(&'a self) -> impl Iterator<Item = (&'a K, &'a V)>
    where
        K: 'a,
        V: 'a,
    {
        self.iter()
    }

    #[inline]
    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

// -----------------------------------------------------------------------------
// MapSerializer

/// Serializer of a [`MapCollection`], built from a key and a value serializer.
///
/// Entry `i` is written as element `2 * i` (key) followed by element
/// `2 * i + 1` (value). The collection size counts entries.
///
/// Merge-decoding inserts the decoded entries, overwriting values of
/// existing keys and keeping the other entries.
pub struct MapSerializer<K, V, M> {
    key: SerializerRef<K>,
    value: SerializerRef<V>,
    descriptor: OnceLock<Arc<TypeDescriptor>>,
    _marker: PhantomData<fn() -> M>,
}

impl<K, V, M> MapSerializer<K, V, M> {
    /// Creates a map serializer from the key and value serializers.
    #[inline]
    pub const fn new(key: SerializerRef<K>, value: SerializerRef<V>) -> Self {
        Self {
            key,
            value,
            descriptor: OnceLock::new(),
            _marker: PhantomData,
        }
    }
}

impl<K, V, M: MapCollection<K, V>> MapSerializer<K, V, M> {
    fn read_entries(&self, s: &mut StructureDecoder<'_>, map: &mut M) -> Result<(), SerialError> {
        if s.sequential()
            && let Some(len) = s.collection_size()?
        {
            for entry in 0..len {
                let key = s.read_element(2 * entry, &*self.key)?;
                let value = s.read_element(2 * entry + 1, &*self.value)?;
                map.insert_entry(key, value);
            }
            return Ok(());
        }

        while let Some(index) = s.next_index()? {
            let key = s.read_element(index, &*self.key)?;
            let Some(value_index) = s.next_index()? else {
                return Err(SerialError::custom(format!(
                    "map entry at element {index} has a key but no value"
                )));
            };
            let value = s.read_element(value_index, &*self.value)?;
            map.insert_entry(key, value);
        }
        Ok(())
    }
}

impl<K: 'static, V: 'static, M: MapCollection<K, V>> Serializer<M> for MapSerializer<K, V, M> {
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        self.descriptor.get_or_init(|| {
            let key = self.key.descriptor();
            let value = self.value.descriptor();
            Arc::new(TypeDescriptor::map(
                format!("{}<{}, {}>", M::TYPE_PATH, key.name(), value.name()),
                key.clone(),
                value.clone(),
            ))
        })
    }

    fn save(&self, encoder: &mut dyn Encoder, value: &M) -> Result<(), SerialError> {
        encode_collection(encoder, self.descriptor(), value.map_len(), |s| {
            for (entry, (k, v)) in value.entries().enumerate() {
                s.write_element(2 * entry, &*self.key, k)?;
                s.write_element(2 * entry + 1, &*self.value, v)?;
            }
            Ok(())
        })
    }

    fn load(&self, decoder: &mut dyn Decoder) -> Result<M, SerialError> {
        decode_structure(decoder, self.descriptor(), |s| {
            let mut map = M::with_capacity(s.collection_size()?.unwrap_or(0));
            self.read_entries(s, &mut map)?;
            Ok(map)
        })
    }

    fn update(&self, decoder: &mut dyn Decoder, mut old: M) -> Result<M, SerialError> {
        decode_structure(decoder, self.descriptor(), |s| {
            self.read_entries(s, &mut old)?;
            Ok(old)
        })
    }
}
