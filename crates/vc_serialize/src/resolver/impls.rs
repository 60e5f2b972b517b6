use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::hash::{BuildHasher, Hash};
use std::collections::HashMap;

use crate::ResolveError;
use crate::resolver::{Resolver, SerialType};
use crate::serializer::{
    BoxSerializer, DynValue, ListSerializer, MapSerializer, NullableSerializer,
    PolymorphicSerializer, PrimitiveSerializer, SerializerCell, SerializerRef,
};

// -----------------------------------------------------------------------------
// Primitives

macro_rules! impl_primitive_serial_type {
    ($($ty:ty),* $(,)?) => {$(
        impl SerialType for $ty {
            #[inline]
            fn default_serializer(
                _: &Resolver<'_>,
            ) -> Result<Option<SerializerRef<Self>>, ResolveError> {
                static CELL: SerializerCell<$ty> = SerializerCell::new();
                Ok(Some(CELL.get_or_init(|| Arc::new(PrimitiveSerializer::<$ty>::new()))))
            }
        }
    )*};
}

impl_primitive_serial_type!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, char, String);

// -----------------------------------------------------------------------------
// Containers

impl<E: SerialType> SerialType for Vec<E> {
    fn default_serializer(
        resolver: &Resolver<'_>,
    ) -> Result<Option<SerializerRef<Self>>, ResolveError> {
        let item = resolver.resolve::<E>()?;
        Ok(Some(Arc::new(ListSerializer::new(item))))
    }
}

impl<E: SerialType> SerialType for Option<E> {
    fn default_serializer(
        resolver: &Resolver<'_>,
    ) -> Result<Option<SerializerRef<Self>>, ResolveError> {
        let inner = resolver.resolve::<E>()?;
        Ok(Some(Arc::new(NullableSerializer::new(inner))))
    }
}

impl<E: SerialType> SerialType for Box<E> {
    fn default_serializer(
        resolver: &Resolver<'_>,
    ) -> Result<Option<SerializerRef<Self>>, ResolveError> {
        let inner = resolver.resolve::<E>()?;
        Ok(Some(Arc::new(BoxSerializer::new(inner))))
    }
}

impl<K: SerialType + Ord, V: SerialType> SerialType for BTreeMap<K, V> {
    fn default_serializer(
        resolver: &Resolver<'_>,
    ) -> Result<Option<SerializerRef<Self>>, ResolveError> {
        let key = resolver.resolve::<K>()?;
        let value = resolver.resolve::<V>()?;
        Ok(Some(Arc::new(MapSerializer::<K, V, Self>::new(key, value))))
    }
}

impl<K, V, S> SerialType for HashMap<K, V, S>
where
    K: SerialType + Eq + Hash,
    V: SerialType,
    S: BuildHasher + Default + 'static,
{
    fn default_serializer(
        resolver: &Resolver<'_>,
    ) -> Result<Option<SerializerRef<Self>>, ResolveError> {
        let key = resolver.resolve::<K>()?;
        let value = resolver.resolve::<V>()?;
        Ok(Some(Arc::new(MapSerializer::<K, V, Self>::new(key, value))))
    }
}

impl SerialType for DynValue {
    fn default_serializer(_: &Resolver<'_>) -> Result<Option<SerializerRef<Self>>, ResolveError> {
        Ok(Some(Arc::new(PolymorphicSerializer)))
    }
}
